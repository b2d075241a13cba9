//! The layered canvas.
//!
//! A [`Canvas`] owns an ordered, never-empty stack of [`Layer`]s that share
//! one colorspace and one ICC profile. Every mutation goes through a canvas
//! method so that:
//!
//! - layer positions stay contiguous `0..N` with `layers[i].position == i`
//! - layer ids are never reused
//! - a failed operation leaves the canvas exactly as it was
//!
//! Colorspace conversion builds a new canvas instead of mutating, so a
//! failure on any layer cannot leave a half-converted stack behind.

use crate::layer::clamp_opacity;
use crate::{CanvasError, CanvasResult, Layer, LayerId, LayerSnapshot};
use cyan_core::{Colorspace, ImageData, SampleFormat};
use cyan_icc::{ColorProfile, IccError, Intent, convert_image};
use cyan_ops::{CompositeOp, Surface};
use tracing::{debug, trace};

/// Label of the layer a fresh canvas starts with.
pub const BACKGROUND_LABEL: &str = "Background";

/// Canvas label used when the source image has none.
pub const UNTITLED_LABEL: &str = "Untitled";

/// Ordered layers sharing a colorspace and profile.
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    width: u32,
    height: u32,
    colorspace: Colorspace,
    profile: Option<ColorProfile>,
    layers: Vec<Layer>,
    label: String,
    next_id: u64,
}

impl Canvas {
    /// Creates a canvas with one fully transparent background layer.
    ///
    /// Without `profile` the built-in profile for `colorspace` is used; CMYK
    /// has none and starts unprofiled.
    ///
    /// # Errors
    ///
    /// - [`CanvasError::Structure`] for zero dimensions
    /// - [`CanvasError::Profile`] when `profile` describes another colorspace
    pub fn new(
        width: u32,
        height: u32,
        colorspace: Colorspace,
        profile: Option<ColorProfile>,
    ) -> CanvasResult<Self> {
        let profile = resolve_profile(colorspace, profile)?;
        let background = ImageData::new(width, height, colorspace, true, SampleFormat::U8)?;
        let mut canvas = Self::empty(width, height, colorspace, profile, UNTITLED_LABEL.into());
        canvas.push(background, Some(BACKGROUND_LABEL.into()));
        debug!(width, height, %colorspace, "canvas created");
        Ok(canvas)
    }

    /// Creates a single-layer canvas from a decoded image.
    ///
    /// The profile is `profile` when given, else the one embedded in the
    /// image, else the built-in one for its colorspace. The canvas label is
    /// the image label, or [`UNTITLED_LABEL`].
    pub fn from_image(image: ImageData, profile: Option<ColorProfile>) -> CanvasResult<Self> {
        let profile = match profile {
            Some(p) => Some(p),
            None => match &image.icc_profile {
                Some(bytes) => Some(ColorProfile::from_icc(bytes.clone())?),
                None => None,
            },
        };
        let profile = resolve_profile(image.colorspace, profile)?;
        let label = image.label.clone().unwrap_or_else(|| UNTITLED_LABEL.into());
        let mut canvas = Self::empty(image.width, image.height, image.colorspace, profile, label);
        let layer_label = image.label.clone().or_else(|| Some(BACKGROUND_LABEL.into()));
        canvas.push(image, layer_label);
        Ok(canvas)
    }

    fn empty(
        width: u32,
        height: u32,
        colorspace: Colorspace,
        profile: Option<ColorProfile>,
        label: String,
    ) -> Self {
        Self {
            width,
            height,
            colorspace,
            profile,
            layers: Vec::new(),
            label,
            next_id: 1,
        }
    }

    /// Reassembles a canvas from validated parts.
    ///
    /// `layers` must already be in position order. New ids start at
    /// `next_id`, or after the largest id present when that is unknown or
    /// would reuse one.
    pub(crate) fn from_parts(
        width: u32,
        height: u32,
        colorspace: Colorspace,
        profile: Option<ColorProfile>,
        label: String,
        layers: Vec<Layer>,
        next_id: Option<u64>,
    ) -> CanvasResult<Self> {
        if layers.is_empty() {
            return Err(CanvasError::structure("canvas has no layers"));
        }
        let after_max = layers.iter().map(|l| l.id.0).max().unwrap_or(0) + 1;
        let next_id = next_id.map_or(after_max, |n| n.max(after_max));
        let mut canvas = Self {
            width,
            height,
            colorspace,
            profile,
            layers,
            label,
            next_id,
        };
        canvas.renumber();
        Ok(canvas)
    }

    /// Id the next added layer will get.
    pub(crate) fn next_layer_id(&self) -> u64 {
        self.next_id
    }

    /// Canvas width.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Canvas height.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Shared colorspace of all layers.
    pub fn colorspace(&self) -> Colorspace {
        self.colorspace
    }

    /// Shared profile of all layers; `None` only for an unprofiled CMYK canvas.
    pub fn profile(&self) -> Option<&ColorProfile> {
        self.profile.as_ref()
    }

    /// Canvas label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Renames the canvas.
    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    /// Layers bottom to top.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Number of layers; never zero.
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Layer by id.
    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    /// Layer at a stacking position.
    pub fn layer_at(&self, position: usize) -> Option<&Layer> {
        self.layers.get(position)
    }

    /// Metadata of every layer, bottom to top.
    pub fn snapshot(&self) -> Vec<LayerSnapshot> {
        self.layers.iter().map(Layer::snapshot).collect()
    }

    /// True when the canvas is already in `colorspace` with `profile`.
    pub fn is_in(&self, colorspace: Colorspace, profile: &ColorProfile) -> bool {
        self.colorspace == colorspace && self.profile.as_ref() == Some(profile)
    }

    /// Adds a layer at `at`, or on top when `None`.
    ///
    /// The image must be in the canvas colorspace; its pixels are taken as
    /// already being in the canvas profile, which it is tagged with. Layers
    /// above `at` move up by one.
    pub fn add_layer(&mut self, image: ImageData, at: Option<usize>) -> CanvasResult<LayerId> {
        if image.colorspace != self.colorspace {
            return Err(CanvasError::Incompatible(format!(
                "{} layer on a {} canvas",
                image.colorspace, self.colorspace
            )));
        }
        let len = self.layers.len();
        let at = at.unwrap_or(len);
        if at > len {
            return Err(CanvasError::InvalidPosition { position: at, len });
        }
        let label = image.label.clone();
        let id = self.push(image, label);
        if at != len {
            let layer = self.layers.remove(len);
            self.layers.insert(at, layer);
            self.renumber();
        }
        debug!(%id, position = at, "layer added");
        Ok(id)
    }

    /// Removes a layer and returns it.
    ///
    /// # Errors
    ///
    /// [`CanvasError::LayerNotFound`] for an unknown id and
    /// [`CanvasError::LastLayer`] when it is the only layer left; the canvas
    /// is unchanged in both cases.
    pub fn remove_layer(&mut self, id: LayerId) -> CanvasResult<Layer> {
        let index = self.index_of(id)?;
        if self.layers.len() == 1 {
            return Err(CanvasError::LastLayer);
        }
        let layer = self.layers.remove(index);
        self.renumber();
        debug!(%id, "layer removed");
        Ok(layer)
    }

    /// Changes a layer's composite operator.
    pub fn set_composite(&mut self, id: LayerId, op: CompositeOp) -> CanvasResult<()> {
        self.layer_mut(id)?.composite = op;
        Ok(())
    }

    /// Sets a layer's opacity, clamped to `[0, 1]`, and returns the stored value.
    pub fn set_opacity(&mut self, id: LayerId, opacity: f64) -> CanvasResult<f64> {
        let layer = self.layer_mut(id)?;
        layer.opacity = clamp_opacity(opacity);
        Ok(layer.opacity)
    }

    /// Shows or hides a layer.
    pub fn set_visible(&mut self, id: LayerId, visible: bool) -> CanvasResult<()> {
        self.layer_mut(id)?.visible = visible;
        Ok(())
    }

    /// Renames a layer.
    pub fn set_layer_label(&mut self, id: LayerId, label: impl Into<String>) -> CanvasResult<()> {
        self.layer_mut(id)?.label = label.into();
        Ok(())
    }

    /// Moves a layer relative to the canvas origin.
    pub fn set_offset(&mut self, id: LayerId, x: i32, y: i32) -> CanvasResult<()> {
        self.layer_mut(id)?.offset = (x, y);
        Ok(())
    }

    /// Moves a layer to `position`, shifting the layers in between.
    pub fn reorder(&mut self, id: LayerId, position: usize) -> CanvasResult<()> {
        let index = self.index_of(id)?;
        let len = self.layers.len();
        if position >= len {
            return Err(CanvasError::InvalidPosition { position, len });
        }
        if index != position {
            let layer = self.layers.remove(index);
            self.layers.insert(position, layer);
            self.renumber();
            trace!(%id, from = index, to = position, "layer moved");
        }
        Ok(())
    }

    /// Composites the visible layers, bottom to top, over a transparent base.
    ///
    /// The result is an F32 image with alpha, tagged with the canvas profile
    /// and label.
    pub fn flatten(&self) -> CanvasResult<ImageData> {
        let mut surface = Surface::transparent(self.width, self.height, self.colorspace)?;
        for layer in self.layers.iter().filter(|l| l.visible) {
            surface.composite(&layer.image, layer.offset, layer.composite, layer.opacity as f32)?;
        }
        let mut flat = surface.into_image();
        flat.icc_profile = self.profile.as_ref().map(ColorProfile::shared_bytes);
        flat.label = Some(self.label.clone());
        Ok(flat)
    }

    /// Converts every layer to `colorspace` under `profile`.
    ///
    /// Returns a clone when the canvas is already there. The receiver is
    /// never modified: on any failure it is still the valid original.
    ///
    /// # Errors
    ///
    /// - [`CanvasError::Profile`] when `profile` does not describe `colorspace`
    /// - [`CanvasError::ColorTransform`] when any layer fails to convert
    pub fn convert_colorspace(
        &self,
        colorspace: Colorspace,
        profile: &ColorProfile,
        intent: Intent,
        black_point: bool,
    ) -> CanvasResult<Canvas> {
        if !profile.matches(colorspace) {
            return Err(CanvasError::Profile(IccError::ColorSpaceMismatch {
                expected: colorspace.to_string(),
                actual: profile.info().colorspace.to_string(),
            }));
        }
        if self.is_in(colorspace, profile) {
            return Ok(self.clone());
        }
        debug!(from = %self.colorspace, to = %colorspace, %intent, black_point, "converting canvas");

        let layers = self
            .layers
            .iter()
            .map(|layer| {
                let image = convert_image(&layer.image, self.profile.as_ref(), profile, intent, black_point)
                    .map_err(|e| CanvasError::ColorTransform(format!("layer {}: {}", layer.id, e)))?;
                Ok(Layer {
                    id: layer.id,
                    image,
                    composite: layer.composite,
                    opacity: layer.opacity,
                    visible: layer.visible,
                    label: layer.label.clone(),
                    position: layer.position,
                    offset: layer.offset,
                })
            })
            .collect::<CanvasResult<Vec<_>>>()?;

        Ok(Canvas {
            width: self.width,
            height: self.height,
            colorspace,
            profile: Some(profile.clone()),
            layers,
            label: self.label.clone(),
            next_id: self.next_id,
        })
    }

    fn push(&mut self, mut image: ImageData, label: Option<String>) -> LayerId {
        let id = LayerId(self.next_id);
        self.next_id += 1;
        image.icc_profile = self.profile.as_ref().map(ColorProfile::shared_bytes);
        let label = label.unwrap_or_else(|| format!("Layer {}", id.0));
        let mut layer = Layer::new(id, image, label);
        layer.position = self.layers.len();
        self.layers.push(layer);
        id
    }

    fn renumber(&mut self) {
        for (i, layer) in self.layers.iter_mut().enumerate() {
            layer.position = i;
        }
    }

    fn index_of(&self, id: LayerId) -> CanvasResult<usize> {
        self.layers
            .iter()
            .position(|l| l.id == id)
            .ok_or(CanvasError::LayerNotFound(id))
    }

    fn layer_mut(&mut self, id: LayerId) -> CanvasResult<&mut Layer> {
        self.layers
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or(CanvasError::LayerNotFound(id))
    }
}

fn resolve_profile(colorspace: Colorspace, profile: Option<ColorProfile>) -> CanvasResult<Option<ColorProfile>> {
    match profile {
        Some(p) if !p.matches(colorspace) => Err(CanvasError::Profile(IccError::ColorSpaceMismatch {
            expected: colorspace.to_string(),
            actual: p.info().colorspace.to_string(),
        })),
        Some(p) => Ok(Some(p)),
        None => Ok(ColorProfile::builtin(colorspace)?),
    }
}
