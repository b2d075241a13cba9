//! # cyan-canvas
//!
//! Layered, color-managed canvas model for Cyan.
//!
//! - [`Canvas`] - ordered layers sharing one colorspace and ICC profile
//! - [`Layer`], [`LayerId`], [`LayerSnapshot`] - one image in the stack
//! - [`project`] - single-file project format
//! - [`Settings`] - persisted color and engine settings
//! - [`Session`] - registry of open canvases with user-facing messages
//!
//! # Example
//!
//! ```rust
//! use cyan_canvas::Canvas;
//! use cyan_core::{Colorspace, ImageData, SampleFormat};
//! use cyan_ops::CompositeOp;
//!
//! let base = ImageData::filled(8, 8, Colorspace::Rgb, false, SampleFormat::U8, &[0.2, 0.4, 0.6]).unwrap();
//! let mut canvas = Canvas::from_image(base, None).unwrap();
//!
//! let glow = ImageData::filled(4, 4, Colorspace::Rgb, false, SampleFormat::U8, &[0.9, 0.8, 0.1]).unwrap();
//! let id = canvas.add_layer(glow, None).unwrap();
//! canvas.set_composite(id, CompositeOp::Screen).unwrap();
//! canvas.set_opacity(id, 0.5).unwrap();
//!
//! let flat = canvas.flatten().unwrap();
//! assert_eq!(flat.width, 8);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod canvas;
mod error;
mod layer;
pub mod project;
pub mod session;
mod settings;

pub use canvas::{BACKGROUND_LABEL, Canvas, UNTITLED_LABEL};
pub use error::{CanvasError, CanvasResult, ErrorKind};
pub use layer::{Layer, LayerId, LayerSnapshot};
pub use session::{LayerHandle, Message, Observer, Outcome, Session, Severity, ViewId};
pub use settings::{EngineSettings, Settings};
