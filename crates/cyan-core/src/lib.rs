//! # cyan-core
//!
//! Core types shared by every Cyan crate.
//!
//! - [`Colorspace`] - The three working spaces a canvas can be in (RGB, CMYK, GRAY)
//! - [`ImageData`] - A decoded raster with its colorspace, alpha flag and embedded ICC data
//! - [`PixelData`], [`SampleFormat`] - Typed sample storage
//! - [`CoreError`] - Buffer and dimension errors
//!
//! ## Crate Structure
//!
//! ```text
//! cyan-core (this crate)
//!    ^
//!    +-- cyan-icc (profiles, color transforms)
//!    +-- cyan-io (decode/encode)
//!    +-- cyan-ops (compositing)
//!    +-- cyan-canvas (layers, canvas, projects)
//! ```
//!
//! ## Sample Conventions
//!
//! Samples are interleaved, color channels first, alpha last. Normalized
//! values are in `[0, 1]`; for CMYK a value of `1.0` is full ink.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod colorspace;
pub mod error;
pub mod image;

pub use colorspace::Colorspace;
pub use error::{CoreError, CoreResult};
pub use image::{ImageData, PixelData, SampleFormat};
