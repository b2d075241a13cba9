//! # cyan-ops
//!
//! Composite operators for the Cyan layered canvas.
//!
//! # Modules
//!
//! - [`blend`] - per-pixel blend formulas
//! - [`composite`] - painting layers onto a float [`Surface`]
//!
//! # Example
//!
//! ```rust
//! use cyan_core::{Colorspace, ImageData, SampleFormat};
//! use cyan_ops::{CompositeOp, Surface};
//!
//! let base = ImageData::filled(2, 2, Colorspace::Gray, false, SampleFormat::U8, &[0.5]).unwrap();
//! let top = ImageData::filled(2, 2, Colorspace::Gray, false, SampleFormat::U8, &[0.8]).unwrap();
//!
//! let mut surface = Surface::transparent(2, 2, Colorspace::Gray).unwrap();
//! surface.composite(&base, (0, 0), CompositeOp::Over, 1.0).unwrap();
//! surface.composite(&top, (0, 0), CompositeOp::Screen, 1.0).unwrap();
//! let flat = surface.into_image();
//! assert!(flat.pixel(0, 0).unwrap()[0] > 0.89);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
mod op;
pub mod blend;
pub mod composite;

pub use composite::Surface;
pub use error::{OpsError, OpsResult};
pub use op::CompositeOp;
