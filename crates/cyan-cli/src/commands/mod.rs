//! CLI command implementations

pub mod convert;
pub mod flatten;
pub mod info;
pub mod layer;
pub mod new;
pub mod profiles;
pub mod settings;

use anyhow::{Context, Result, anyhow};
use cyan_canvas::{Canvas, LayerId, Message, Session, ViewId};
use std::path::Path;

/// Opens an image or project in `session`.
pub fn open(session: &mut Session, path: &Path) -> Result<ViewId> {
    let outcome = session
        .open(path)
        .with_context(|| format!("Failed to open: {}", path.display()))?;
    print_messages(&outcome.messages);
    Ok(outcome.value)
}

/// Canvas of an open view.
pub fn canvas(session: &Session, view: ViewId) -> Result<&Canvas> {
    session.canvas(view).ok_or_else(|| anyhow!("{view} is not open"))
}

/// Id of the layer at `position`.
pub fn layer_at(canvas: &Canvas, position: usize) -> Result<LayerId> {
    canvas
        .layer_at(position)
        .map(|l| l.id())
        .ok_or_else(|| anyhow!("no layer at position {} ({} layers)", position, canvas.layer_count()))
}

/// Prints session messages, warnings and errors to stderr.
pub fn print_messages(messages: &[Message]) {
    for m in messages {
        match m.severity {
            cyan_canvas::Severity::Status => println!("{m}"),
            _ => eprintln!("{m}"),
        }
    }
}

/// Parses `X,Y` into an offset.
pub fn parse_offset(s: &str) -> std::result::Result<(i32, i32), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got '{s}'"))?;
    let x = x.trim().parse().map_err(|e| format!("bad X '{x}': {e}"))?;
    let y = y.trim().parse().map_err(|e| format!("bad Y '{y}': {e}"))?;
    Ok((x, y))
}

/// Human-readable byte count.
pub fn format_size(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = "B";
    for next in ["KB", "MB", "GB"] {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = next;
    }
    if unit == "B" { format!("{bytes} B") } else { format!("{value:.2} {unit}") }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_offset() {
        assert_eq!(parse_offset("10,-4").unwrap(), (10, -4));
        assert_eq!(parse_offset(" 3 , 7").unwrap(), (3, 7));
        assert!(parse_offset("10").is_err());
        assert!(parse_offset("a,1").is_err());
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.00 KB");
    }
}
