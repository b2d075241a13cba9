//! Canvas info command.
//!
//! Prints the canvas geometry, profile and layer stack of images and projects.

use crate::InfoArgs;
use anyhow::Result;
use cyan_canvas::Session;
use cyan_canvas::Settings;
use std::fs;

/// Runs the info command.
pub fn run(args: InfoArgs, settings: Settings) -> Result<()> {
    let mut session = Session::new(settings);
    for (i, path) in args.input.iter().enumerate() {
        if i > 0 {
            println!();
        }
        let view = super::open(&mut session, path)?;
        let canvas = super::canvas(&session, view)?;
        let size = fs::metadata(path).map(|m| m.len()).unwrap_or(0);

        println!("{}", path.display());
        println!("  Label:      {}", canvas.label());
        println!("  Resolution: {}x{}", canvas.width(), canvas.height());
        println!("  Colorspace: {}", canvas.colorspace());
        match canvas.profile() {
            Some(p) => println!("  Profile:    {}", p.description()),
            None => println!("  Profile:    (none)"),
        }
        println!("  File size:  {}", super::format_size(size));
        println!("  Layers:     {}", canvas.layer_count());
        for layer in canvas.snapshot().iter().rev() {
            println!(
                "    [{}] {:<20} {:<18} {:>5.1}%  {}x{} @ {},{}{}",
                layer.position,
                layer.label,
                layer.composite.label(),
                layer.opacity * 100.0,
                layer.width,
                layer.height,
                layer.offset.0,
                layer.offset.1,
                if layer.visible { "" } else { "  (hidden)" }
            );
        }
        session.close(view);
    }
    Ok(())
}
