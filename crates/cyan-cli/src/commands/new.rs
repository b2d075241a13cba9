//! Blank project command.

use crate::NewArgs;
use anyhow::{Context, Result};
use cyan_canvas::{Canvas, Settings, project};
use cyan_icc::ColorProfile;

/// Creates a project holding one transparent background layer.
pub fn run(args: NewArgs, settings: Settings) -> Result<()> {
    let mut session = cyan_canvas::Session::new(settings);
    let mut canvas = match &args.profile {
        Some(path) => {
            let profile = session
                .cache()
                .load(path)
                .with_context(|| format!("Failed to load profile: {}", path.display()))?;
            Canvas::new(args.width, args.height, args.colorspace, Some(profile))?
        }
        None => {
            let outcome = session.new_canvas(args.width, args.height, args.colorspace)?;
            super::print_messages(&outcome.messages);
            session
                .close(outcome.value)
                .context("new canvas vanished from the session")?
        }
    };
    if let Some(label) = args.label {
        canvas.set_label(label);
    }
    project::write(&canvas, &args.output)
        .with_context(|| format!("Failed to save: {}", args.output.display()))?;
    println!(
        "created {} ({}x{} {}, profile: {})",
        args.output.display(),
        canvas.width(),
        canvas.height(),
        canvas.colorspace(),
        canvas.profile().map(ColorProfile::description).unwrap_or("none")
    );
    Ok(())
}
