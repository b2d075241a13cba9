//! Layers and their identities.

use cyan_core::ImageData;
use cyan_ops::CompositeOp;
use std::fmt;

/// Stable identity of a layer within one canvas.
///
/// Ids are handed out in increasing order and never reused, even after the
/// layer they named has been removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub(crate) u64);

impl LayerId {
    /// Raw numeric value, as stored in project files.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One image in the canvas stack.
///
/// Layers are only mutated through [`crate::Canvas`], which keeps positions
/// contiguous and colorspaces consistent.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub(crate) id: LayerId,
    pub(crate) image: ImageData,
    pub(crate) composite: CompositeOp,
    pub(crate) opacity: f64,
    pub(crate) visible: bool,
    pub(crate) label: String,
    pub(crate) position: usize,
    pub(crate) offset: (i32, i32),
}

impl Layer {
    pub(crate) fn new(id: LayerId, mut image: ImageData, label: String) -> Self {
        // the layer label is the only name a layer has
        image.label = None;
        Self {
            id,
            image,
            composite: CompositeOp::Over,
            opacity: 1.0,
            visible: true,
            label,
            position: 0,
            offset: (0, 0),
        }
    }

    /// Stable id.
    pub fn id(&self) -> LayerId {
        self.id
    }

    /// Pixel buffer, in the canvas colorspace and profile.
    pub fn image(&self) -> &ImageData {
        &self.image
    }

    /// Composite operator.
    pub fn composite(&self) -> CompositeOp {
        self.composite
    }

    /// Opacity in `[0, 1]`.
    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    /// Whether the layer takes part in flattening.
    pub fn visible(&self) -> bool {
        self.visible
    }

    /// Display label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Paint order, 0 at the bottom.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Top-left corner relative to the canvas origin.
    pub fn offset(&self) -> (i32, i32) {
        self.offset
    }

    /// Read-only view of the layer metadata.
    pub fn snapshot(&self) -> LayerSnapshot {
        LayerSnapshot {
            id: self.id,
            label: self.label.clone(),
            composite: self.composite,
            opacity: self.opacity,
            visible: self.visible,
            position: self.position,
            offset: self.offset,
            width: self.image.width,
            height: self.image.height,
            alpha: self.image.alpha,
        }
    }
}

/// Layer metadata without pixels.
///
/// A list of snapshots in position order is all a layer panel needs to
/// rebuild itself after a canvas operation.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSnapshot {
    /// Layer id.
    pub id: LayerId,
    /// Display label.
    pub label: String,
    /// Composite operator.
    pub composite: CompositeOp,
    /// Opacity in `[0, 1]`.
    pub opacity: f64,
    /// Visibility flag.
    pub visible: bool,
    /// Paint order.
    pub position: usize,
    /// Offset from the canvas origin.
    pub offset: (i32, i32),
    /// Image width.
    pub width: u32,
    /// Image height.
    pub height: u32,
    /// Whether the image has an alpha channel.
    pub alpha: bool,
}

/// Clamps an opacity into `[0, 1]`; NaN becomes fully transparent.
pub(crate) fn clamp_opacity(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}
