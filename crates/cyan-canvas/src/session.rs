//! Open canvases and user-facing reporting.
//!
//! A [`Session`] owns every open canvas, keyed by [`ViewId`]. Callers address
//! canvases and layers through these typed handles; there is no shared
//! mutable state between canvases and no global settings object.
//!
//! Operations return an [`Outcome`] carrying the [`Message`]s a user should
//! see. The same messages are delivered to every registered [`Observer`] and
//! mirrored to `tracing`.

use crate::{Canvas, CanvasError, CanvasResult, LayerId, LayerSnapshot, Settings, project};
use cyan_core::{Colorspace, ImageData};
use cyan_icc::{ColorProfile, IccError, Intent, ProfileCache, convert_image, default_profile};
use cyan_io::Format;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Handle of an open canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(u64);

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "view {}", self.0)
    }
}

/// Handle of one layer in one open canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerHandle {
    /// Owning canvas.
    pub view: ViewId,
    /// Layer within it.
    pub layer: LayerId,
}

/// How important a message is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Informational.
    Status,
    /// Something was worked around; the operation went ahead.
    Warning,
    /// The operation was aborted.
    Error,
}

/// A user-facing report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Importance.
    pub severity: Severity,
    /// Human readable text.
    pub text: String,
}

impl Message {
    /// Informational message.
    pub fn status(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Status,
            text: text.into(),
        }
    }

    /// Non-fatal message.
    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            text: text.into(),
        }
    }

    /// Aborted-operation message.
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            text: text.into(),
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.severity {
            Severity::Status => f.write_str(&self.text),
            Severity::Warning => write!(f, "warning: {}", self.text),
            Severity::Error => write!(f, "error: {}", self.text),
        }
    }
}

/// Result of a successful session operation plus what to tell the user.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<T> {
    /// Operation result.
    pub value: T,
    /// Messages, in the order they were raised.
    pub messages: Vec<Message>,
}

impl<T> Outcome<T> {
    fn new(value: T, messages: Vec<Message>) -> Self {
        Self { value, messages }
    }

    /// True when any warning was raised.
    pub fn has_warnings(&self) -> bool {
        self.messages.iter().any(|m| m.severity == Severity::Warning)
    }
}

/// Receives session events.
///
/// Both methods default to doing nothing.
pub trait Observer {
    /// A message was raised, for `view` when the operation had one.
    fn message(&self, view: Option<ViewId>, message: &Message) {
        let _ = (view, message);
    }

    /// The layers of `view` changed; `layers` is the new state, bottom to top.
    fn canvas_changed(&self, view: ViewId, layers: &[LayerSnapshot]) {
        let _ = (view, layers);
    }
}

struct View {
    canvas: Canvas,
    path: Option<PathBuf>,
}

/// Registry of open canvases.
pub struct Session {
    settings: Settings,
    cache: ProfileCache,
    views: BTreeMap<ViewId, View>,
    next_view: u64,
    observers: Vec<Box<dyn Observer>>,
}

impl Session {
    /// Empty session using `settings`.
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            cache: ProfileCache::new(),
            views: BTreeMap::new(),
            next_view: 1,
            observers: Vec::new(),
        }
    }

    /// Current settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Mutable settings; the caller decides when to save them.
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Profile cache shared by every canvas in the session.
    pub fn cache(&self) -> &ProfileCache {
        &self.cache
    }

    /// Registers an observer.
    pub fn subscribe(&mut self, observer: Box<dyn Observer>) {
        self.observers.push(observer);
    }

    /// Open views, in opening order.
    pub fn views(&self) -> impl Iterator<Item = ViewId> + '_ {
        self.views.keys().copied()
    }

    /// Canvas of an open view.
    pub fn canvas(&self, view: ViewId) -> Option<&Canvas> {
        self.views.get(&view).map(|v| &v.canvas)
    }

    /// File a view was opened from or last saved to.
    pub fn path(&self, view: ViewId) -> Option<&Path> {
        self.views.get(&view).and_then(|v| v.path.as_deref())
    }

    /// Resolves a layer handle.
    pub fn layer(&self, handle: LayerHandle) -> CanvasResult<&crate::Layer> {
        self.canvas_ref(handle.view)?
            .layer(handle.layer)
            .ok_or(CanvasError::LayerNotFound(handle.layer))
    }

    /// Opens a project or an image file.
    ///
    /// An image without a usable embedded profile gets the configured
    /// default for its colorspace, or the built-in one, with a warning. A
    /// CMYK image with neither is refused.
    pub fn open(&mut self, path: &Path) -> CanvasResult<Outcome<ViewId>> {
        let result = self.open_inner(path);
        self.finish(None, result)
    }

    fn open_inner(&mut self, path: &Path) -> CanvasResult<(ViewId, Vec<Message>)> {
        let mut messages = Vec::new();
        let canvas = if project::is_project_file(path) {
            project::read(path, &self.cache)?
        } else {
            let image = cyan_io::decode(path, &self.settings.decode_limits())?;
            let profile = self.profile_for_image(&image, &mut messages)?;
            Canvas::from_image(image, Some(profile))?
        };
        messages.push(Message::status(format!(
            "opened {} ({}x{} {}, {} layer(s))",
            path.display(),
            canvas.width(),
            canvas.height(),
            canvas.colorspace(),
            canvas.layer_count()
        )));
        let view = self.insert(canvas, Some(path.to_path_buf()));
        Ok((view, messages))
    }

    /// Creates a blank canvas with the default profile for `colorspace`.
    pub fn new_canvas(&mut self, width: u32, height: u32, colorspace: Colorspace) -> CanvasResult<Outcome<ViewId>> {
        let result = self.new_canvas_inner(width, height, colorspace);
        self.finish(None, result)
    }

    fn new_canvas_inner(
        &mut self,
        width: u32,
        height: u32,
        colorspace: Colorspace,
    ) -> CanvasResult<(ViewId, Vec<Message>)> {
        let mut messages = Vec::new();
        let profile = self.fallback_profile(colorspace)?;
        if profile.is_none() {
            messages.push(Message::warning(format!(
                "no {colorspace} profile configured, canvas is unprofiled"
            )));
        }
        let canvas = Canvas::new(width, height, colorspace, profile)?;
        Ok((self.insert(canvas, None), messages))
    }

    /// Decodes `path` and adds it as a layer, converted to the canvas profile.
    pub fn add_layer_from_file(
        &mut self,
        view: ViewId,
        path: &Path,
        at: Option<usize>,
    ) -> CanvasResult<Outcome<LayerHandle>> {
        let result = self.add_layer_inner(view, path, at);
        self.finish(Some(view), result)
    }

    fn add_layer_inner(
        &mut self,
        view: ViewId,
        path: &Path,
        at: Option<usize>,
    ) -> CanvasResult<(LayerHandle, Vec<Message>)> {
        let mut messages = Vec::new();
        let image = cyan_io::decode(path, &self.settings.decode_limits())?;
        let (intent, black_point) = (self.settings.color.intent, self.settings.color.blackpoint);
        let target = self.canvas_ref(view)?.profile().cloned();

        let image = match target {
            Some(dest) => {
                let source = self.profile_for_image(&image, &mut messages)?;
                convert_image(&image, Some(&source), &dest, intent, black_point)
                    .map_err(|e| CanvasError::ColorTransform(e.to_string()))?
            }
            None => image,
        };
        let canvas = self.canvas_mut(view)?;
        let layer = canvas.add_layer(image, at)?;
        messages.push(Message::status(format!("added layer {} from {}", layer, path.display())));
        self.notify_changed(view);
        Ok((LayerHandle { view, layer }, messages))
    }

    /// Applies a canvas operation to an open view.
    ///
    /// Canvas operations are all-or-nothing, so on error the view is
    /// unchanged. Observers see the new layer state on success.
    pub fn edit<T>(&mut self, view: ViewId, op: impl FnOnce(&mut Canvas) -> CanvasResult<T>) -> CanvasResult<T> {
        let result = op(self.canvas_mut(view)?);
        match result {
            Ok(value) => {
                self.notify_changed(view);
                Ok(value)
            }
            Err(e) => {
                self.report(Some(view), &Message::error(e.to_string()));
                Err(e)
            }
        }
    }

    /// Converts a view to `colorspace`.
    ///
    /// Without `profile` the configured default, or built-in, profile for
    /// `colorspace` is used; `intent` and `black_point` fall back to the
    /// configured values. Converting to the current colorspace and profile is
    /// reported and does nothing.
    pub fn convert(
        &mut self,
        view: ViewId,
        colorspace: Colorspace,
        profile: Option<&ColorProfile>,
        intent: Option<Intent>,
        black_point: Option<bool>,
    ) -> CanvasResult<Outcome<()>> {
        let result = self.convert_inner(view, colorspace, profile, intent, black_point);
        self.finish(Some(view), result)
    }

    fn convert_inner(
        &mut self,
        view: ViewId,
        colorspace: Colorspace,
        profile: Option<&ColorProfile>,
        intent: Option<Intent>,
        black_point: Option<bool>,
    ) -> CanvasResult<((), Vec<Message>)> {
        let dest = match profile {
            Some(p) => p.clone(),
            None => self
                .fallback_profile(colorspace)?
                .ok_or_else(|| IccError::MissingProfile(colorspace.to_string()))?,
        };
        let canvas = self.canvas_ref(view)?;
        if canvas.is_in(colorspace, &dest) {
            return Ok(((), vec![Message::status(format!("already in {colorspace}"))]));
        }
        let intent = intent.unwrap_or(self.settings.color.intent);
        let black_point = black_point.unwrap_or(self.settings.color.blackpoint);
        let converted = canvas.convert_colorspace(colorspace, &dest, intent, black_point)?;
        let text = format!("converted to {} ({})", colorspace, dest.description());
        *self.canvas_mut(view)? = converted;
        self.notify_changed(view);
        Ok(((), vec![Message::status(text)]))
    }

    /// Writes a view to a project file.
    ///
    /// Without `path` the view's own path is used, if it is a project.
    pub fn save_project(&mut self, view: ViewId, path: Option<&Path>) -> CanvasResult<Outcome<PathBuf>> {
        let result = self.save_inner(view, path);
        self.finish(Some(view), result)
    }

    fn save_inner(&mut self, view: ViewId, path: Option<&Path>) -> CanvasResult<(PathBuf, Vec<Message>)> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => self
                .path(view)
                .filter(|p| project::is_project_file(p))
                .map(Path::to_path_buf)
                .ok_or_else(|| CanvasError::structure(format!("{view} has no project path")))?,
        };
        project::write(self.canvas_ref(view)?, &path)?;
        if let Some(v) = self.views.get_mut(&view) {
            v.path = Some(path.clone());
        }
        let msg = Message::status(format!("saved {}", path.display()));
        Ok((path, vec![msg]))
    }

    /// Encodes one layer to an image file, format from the extension.
    pub fn export_layer(&self, handle: LayerHandle, path: &Path) -> CanvasResult<Outcome<Format>> {
        let result = self.layer(handle).and_then(|layer| {
            let format = cyan_io::write(path, layer.image())?;
            let msg = Message::status(format!("exported {} to {}", layer.label(), path.display()));
            Ok((format, vec![msg]))
        });
        self.finish(Some(handle.view), result)
    }

    /// Flattens a view and encodes the result.
    pub fn export_flattened(&self, view: ViewId, path: &Path) -> CanvasResult<Outcome<Format>> {
        let result = self
            .canvas_ref(view)
            .and_then(Canvas::flatten)
            .and_then(|flat| {
                let format = cyan_io::write(path, &flat)?;
                Ok((format, vec![Message::status(format!("flattened to {}", path.display()))]))
            });
        self.finish(Some(view), result)
    }

    /// Closes a view and hands back its canvas.
    pub fn close(&mut self, view: ViewId) -> Option<Canvas> {
        let closed = self.views.remove(&view).map(|v| v.canvas);
        if closed.is_some() {
            tracing::debug!(%view, "closed");
        }
        closed
    }

    /// Profile for a decoded image: embedded, configured default, or built-in.
    fn profile_for_image(&self, image: &ImageData, messages: &mut Vec<Message>) -> CanvasResult<ColorProfile> {
        let cs = image.colorspace;
        if let Some(bytes) = &image.icc_profile {
            match self.cache.intern(bytes) {
                Ok(p) if p.matches(cs) => return Ok(p),
                Ok(p) => messages.push(Message::warning(format!(
                    "embedded profile '{}' is {} but the image is {}",
                    p.description(),
                    p.info().colorspace,
                    cs
                ))),
                Err(e) => messages.push(Message::warning(format!("embedded profile unreadable: {e}"))),
            }
        }
        if let Some(p) = default_profile(&self.settings.color, cs, &self.cache) {
            messages.push(Message::warning(format!(
                "no embedded {} profile, assigned default '{}'",
                cs,
                p.description()
            )));
            return Ok(p);
        }
        match ColorProfile::builtin(cs)? {
            Some(p) => {
                messages.push(Message::warning(format!(
                    "no embedded {} profile, assigned built-in '{}'",
                    cs,
                    p.description()
                )));
                Ok(self.cache.intern(p.bytes())?)
            }
            None => Err(IccError::MissingProfile(cs.to_string()).into()),
        }
    }

    fn fallback_profile(&self, cs: Colorspace) -> CanvasResult<Option<ColorProfile>> {
        match default_profile(&self.settings.color, cs, &self.cache) {
            Some(p) => Ok(Some(p)),
            None => Ok(ColorProfile::builtin(cs)?),
        }
    }

    fn insert(&mut self, canvas: Canvas, path: Option<PathBuf>) -> ViewId {
        let view = ViewId(self.next_view);
        self.next_view += 1;
        self.views.insert(view, View { canvas, path });
        self.notify_changed(view);
        view
    }

    fn canvas_ref(&self, view: ViewId) -> CanvasResult<&Canvas> {
        self.canvas(view)
            .ok_or_else(|| CanvasError::structure(format!("{view} is not open")))
    }

    fn canvas_mut(&mut self, view: ViewId) -> CanvasResult<&mut Canvas> {
        self.views
            .get_mut(&view)
            .map(|v| &mut v.canvas)
            .ok_or_else(|| CanvasError::structure(format!("{view} is not open")))
    }

    fn finish<T>(&self, view: Option<ViewId>, result: CanvasResult<(T, Vec<Message>)>) -> CanvasResult<Outcome<T>> {
        match result {
            Ok((value, messages)) => {
                for m in &messages {
                    self.report(view, m);
                }
                Ok(Outcome::new(value, messages))
            }
            Err(e) => {
                self.report(view, &Message::error(e.to_string()));
                Err(e)
            }
        }
    }

    fn report(&self, view: Option<ViewId>, message: &Message) {
        match message.severity {
            Severity::Status => tracing::info!(view = ?view, "{}", message.text),
            Severity::Warning => tracing::warn!(view = ?view, "{}", message.text),
            Severity::Error => tracing::error!(view = ?view, "{}", message.text),
        }
        for o in &self.observers {
            o.message(view, message);
        }
    }

    fn notify_changed(&self, view: ViewId) {
        if self.observers.is_empty() {
            return;
        }
        if let Some(canvas) = self.canvas(view) {
            let layers = canvas.snapshot();
            for o in &self.observers {
                o.canvas_changed(view, &layers);
            }
        }
    }
}
