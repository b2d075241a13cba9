//! Layer editing commands.
//!
//! Layers are addressed by stacking position, 0 being the bottom.

use crate::{LayerAddArgs, LayerCommand, LayerExportArgs, LayerMoveArgs, LayerRemoveArgs, LayerSetArgs};
use anyhow::{Context, Result, bail};
use cyan_canvas::{LayerHandle, Session, Settings, ViewId, project};
use std::path::Path;
use tracing::debug;

/// Runs a `layer` subcommand.
pub fn run(cmd: LayerCommand, settings: Settings) -> Result<()> {
    let mut session = Session::new(settings);
    match cmd {
        LayerCommand::Add(args) => add(&mut session, args),
        LayerCommand::Remove(args) => remove(&mut session, args),
        LayerCommand::Set(args) => set(&mut session, args),
        LayerCommand::Move(args) => move_layer(&mut session, args),
        LayerCommand::Export(args) => export(&mut session, args),
    }
}

fn open_project(session: &mut Session, path: &Path) -> Result<ViewId> {
    if !project::is_project_file(path) {
        bail!("{} is not a project file", path.display());
    }
    super::open(session, path)
}

fn save(session: &mut Session, view: ViewId) -> Result<()> {
    let outcome = session.save_project(view, None).context("Failed to save project")?;
    super::print_messages(&outcome.messages);
    Ok(())
}

fn add(session: &mut Session, args: LayerAddArgs) -> Result<()> {
    let view = open_project(session, &args.project)?;
    let outcome = session
        .add_layer_from_file(view, &args.image, args.at)
        .with_context(|| format!("Failed to add layer: {}", args.image.display()))?;
    super::print_messages(&outcome.messages);
    save(session, view)
}

fn remove(session: &mut Session, args: LayerRemoveArgs) -> Result<()> {
    let view = open_project(session, &args.project)?;
    let id = super::layer_at(super::canvas(session, view)?, args.position)?;
    let removed = session.edit(view, |c| c.remove_layer(id))?;
    println!("removed layer '{}'", removed.label());
    save(session, view)
}

fn set(session: &mut Session, args: LayerSetArgs) -> Result<()> {
    let view = open_project(session, &args.project)?;
    let id = super::layer_at(super::canvas(session, view)?, args.position)?;
    session.edit(view, |c| {
        if let Some(op) = args.composite {
            c.set_composite(id, op)?;
        }
        if let Some(opacity) = args.opacity {
            let stored = c.set_opacity(id, opacity)?;
            if stored != opacity {
                debug!(requested = opacity, stored, "opacity clamped");
            }
        }
        if let Some(visible) = args.visible {
            c.set_visible(id, visible)?;
        }
        if let Some(label) = args.label {
            c.set_layer_label(id, label)?;
        }
        if let Some((x, y)) = args.offset {
            c.set_offset(id, x, y)?;
        }
        Ok(())
    })?;
    save(session, view)
}

fn move_layer(session: &mut Session, args: LayerMoveArgs) -> Result<()> {
    let view = open_project(session, &args.project)?;
    let id = super::layer_at(super::canvas(session, view)?, args.from)?;
    session.edit(view, |c| c.reorder(id, args.to))?;
    save(session, view)
}

fn export(session: &mut Session, args: LayerExportArgs) -> Result<()> {
    let view = super::open(session, &args.project)?;
    let layer = super::layer_at(super::canvas(session, view)?, args.position)?;
    let outcome = session
        .export_layer(LayerHandle { view, layer }, &args.output)
        .with_context(|| format!("Failed to export: {}", args.output.display()))?;
    super::print_messages(&outcome.messages);
    Ok(())
}
