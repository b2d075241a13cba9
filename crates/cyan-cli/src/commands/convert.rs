//! Colorspace conversion command.

use crate::ConvertArgs;
use anyhow::{Context, Result};
use cyan_canvas::{Session, Settings, project};

/// Converts an image or project and saves the result as a project.
pub fn run(args: ConvertArgs, settings: Settings) -> Result<()> {
    let mut session = Session::new(settings);
    let view = super::open(&mut session, &args.input)?;

    let profile = match &args.profile {
        Some(path) => Some(
            session
                .cache()
                .load(path)
                .with_context(|| format!("Failed to load profile: {}", path.display()))?,
        ),
        None => None,
    };
    let outcome = session
        .convert(view, args.colorspace, profile.as_ref(), args.intent, args.black_point)
        .with_context(|| format!("Failed to convert to {}", args.colorspace))?;
    super::print_messages(&outcome.messages);

    let output = match args.output {
        Some(path) => path,
        None if project::is_project_file(&args.input) => args.input.clone(),
        None => args.input.with_extension(project::EXTENSION),
    };
    let saved = session
        .save_project(view, Some(&output))
        .with_context(|| format!("Failed to save: {}", output.display()))?;
    super::print_messages(&saved.messages);
    Ok(())
}
