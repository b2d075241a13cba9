//! Flatten command.

use crate::FlattenArgs;
use anyhow::{Context, Result};
use cyan_canvas::{Session, Settings};

/// Composites every visible layer and writes the result.
pub fn run(args: FlattenArgs, settings: Settings) -> Result<()> {
    let mut session = Session::new(settings);
    let view = super::open(&mut session, &args.input)?;
    let outcome = session
        .export_flattened(view, &args.output)
        .with_context(|| format!("Failed to save: {}", args.output.display()))?;
    super::print_messages(&outcome.messages);
    Ok(())
}
