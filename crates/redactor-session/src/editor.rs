//! Editing session state.
//!
//! An [`EditorSession`] owns everything the editor screen shows: the original
//! and working images, the selected tool, pen and text settings, the ink
//! layer and the transform. It is a plain state object driven by method
//! calls; every visible change is announced on its [`EventBus`].
//!
//! The working image is an `Arc<Bitmap>` that is replaced wholesale on each
//! filter or reset, never mutated. Background work (filter previews, the final
//! render) runs on `spawn_blocking` against a snapshot of that `Arc`, so an
//! edit made while it runs cannot race with it. Preview results carry the
//! generation they were computed from and are dropped if the working image
//! has changed since.

use std::sync::Arc;

use redactor_core::{
    apply_filter_with, Bitmap, CanvasSize, Color, Compositor, FilterKind, FilterPreviews,
    InkLayer, Point, StrokeStyle, TextAnnotation, TransformState,
};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::task::{JoinError, JoinHandle};

use crate::config::{EditorConfig, Range};
use crate::events::{EventBus, SessionEvent};
use crate::photos::{PersistenceSink, SaveError, ShareSink};

/// Tool palette entries. Any tool can be selected at any time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EditorTool {
    #[default]
    Transform,
    Draw,
    Text,
    Filters,
}

impl EditorTool {
    pub const ALL: [EditorTool; 4] = [
        EditorTool::Transform,
        EditorTool::Draw,
        EditorTool::Text,
        EditorTool::Filters,
    ];

    pub fn label(self) -> &'static str {
        match self {
            EditorTool::Transform => "Rotate/Scale",
            EditorTool::Draw => "Draw",
            EditorTool::Text => "Text",
            EditorTool::Filters => "Filters",
        }
    }
}

/// Filter previews computed in the background, tagged with the working
/// image generation they were made from.
#[derive(Debug, Clone)]
pub struct ComputedPreviews {
    pub generation: u64,
    pub previews: FilterPreviews,
}

/// A preview computation in flight.
#[derive(Debug)]
pub struct PreviewJob {
    generation: u64,
    handle: JoinHandle<FilterPreviews>,
}

impl PreviewJob {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Wait for the previews. `None` if the task panicked.
    pub async fn join(self) -> Option<ComputedPreviews> {
        match self.handle.await {
            Ok(previews) => Some(ComputedPreviews {
                generation: self.generation,
                previews,
            }),
            Err(e) => {
                tracing::warn!(error = %e, "preview task failed");
                None
            }
        }
    }
}

pub struct EditorSession {
    config: EditorConfig,
    compositor: Compositor,
    original: Arc<Bitmap>,
    working: Arc<Bitmap>,
    tool: EditorTool,
    pen: StrokeStyle,
    ink: InkLayer,
    text: TextAnnotation,
    transform: TransformState,
    canvas: CanvasSize,
    previews: FilterPreviews,
    generation: u64,
    events: EventBus,
}

impl std::fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSession")
            .field("image", &(self.working.width, self.working.height))
            .field("tool", &self.tool)
            .field("transform", &self.transform)
            .field("strokes", &self.ink.strokes().len())
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

impl EditorSession {
    pub fn new(image: Arc<Bitmap>, config: EditorConfig, compositor: Compositor) -> Self {
        let canvas = config.canvas;
        let events = EventBus::new(config.event_capacity);
        tracing::debug!(
            width = image.width,
            height = image.height,
            canvas_width = canvas.width,
            canvas_height = canvas.height,
            "editing session started"
        );
        Self {
            original: Arc::clone(&image),
            working: image,
            tool: EditorTool::default(),
            pen: StrokeStyle::default(),
            ink: InkLayer::new(),
            text: TextAnnotation::centered_in(canvas),
            transform: TransformState::default(),
            canvas,
            previews: FilterPreviews::default(),
            generation: 0,
            events,
            config,
            compositor,
        }
    }

    // ----- Read access -----

    pub fn original(&self) -> &Arc<Bitmap> {
        &self.original
    }

    pub fn working(&self) -> &Arc<Bitmap> {
        &self.working
    }

    pub fn tool(&self) -> EditorTool {
        self.tool
    }

    pub fn pen(&self) -> StrokeStyle {
        self.pen
    }

    pub fn ink(&self) -> &InkLayer {
        &self.ink
    }

    pub fn text(&self) -> &TextAnnotation {
        &self.text
    }

    pub fn transform(&self) -> TransformState {
        self.transform
    }

    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    pub fn previews(&self) -> &FilterPreviews {
        &self.previews
    }

    /// Bumped every time the working image is replaced.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    // ----- Tools and transform -----

    pub fn select_tool(&mut self, tool: EditorTool) {
        self.tool = tool;
        self.events.emit(SessionEvent::ToolSelected(tool));
    }

    pub fn set_scale(&mut self, scale: f32) {
        // Unvalidated configs can carry a wider range than the core allows.
        self.transform.scale = self
            .config
            .scale_range
            .clamp(scale, 1.0)
            .clamp(TransformState::MIN_SCALE, TransformState::MAX_SCALE);
        self.events.emit(SessionEvent::TransformChanged(self.transform));
    }

    pub fn set_rotation(&mut self, degrees: f32) {
        self.transform.rotation_degrees =
            Range::new(0.0, TransformState::MAX_ROTATION).clamp(degrees, 0.0);
        self.events.emit(SessionEvent::TransformChanged(self.transform));
    }

    /// Point the displayed canvas at a new size. The text stays inside it.
    pub fn resize_canvas(&mut self, canvas: CanvasSize) {
        self.canvas = canvas;
        self.text.position = canvas.clamp_point(self.text.position);
    }

    // ----- Ink -----

    pub fn set_pen_color(&mut self, color: Color) {
        self.pen.color = color;
    }

    pub fn set_line_width(&mut self, width: f32) {
        let fallback = StrokeStyle::default().line_width;
        self.pen.line_width = self.config.line_width_range.clamp(width, fallback).round();
    }

    pub fn begin_stroke(&mut self, point: Point) {
        self.ink.begin_stroke(point, self.pen);
    }

    pub fn extend_stroke(&mut self, point: Point) {
        self.ink.extend_stroke(point);
    }

    pub fn end_stroke(&mut self) {
        self.ink.end_stroke();
        self.events.emit(SessionEvent::InkChanged {
            strokes: self.ink.strokes().len(),
        });
    }

    // ----- Text -----

    pub fn set_text(&mut self, content: impl Into<String>) {
        self.text.content = content.into();
        self.events.emit(SessionEvent::TextChanged);
    }

    pub fn set_text_color(&mut self, color: Color) {
        self.text.color = color;
        self.events.emit(SessionEvent::TextChanged);
    }

    pub fn set_text_size(&mut self, size: f32) {
        let fallback = TextAnnotation::default().font_size;
        self.text.font_size = self.config.font_size_range.clamp(size, fallback).round();
        self.events.emit(SessionEvent::TextChanged);
    }

    /// Move the text; positions outside the canvas are clamped onto it.
    pub fn drag_text(&mut self, point: Point) {
        self.text.drag_to(point, self.canvas);
        self.events.emit(SessionEvent::TextChanged);
    }

    // ----- Filters -----

    /// Replace the working image with a filtered copy. Returns false (and
    /// leaves the image alone) if the filter could not run.
    pub fn apply_filter(&mut self, kind: FilterKind) -> bool {
        match apply_filter_with(&self.working, kind, self.config.sepia_intensity) {
            Some(filtered) => {
                tracing::debug!(filter = kind.label(), "filter applied");
                self.replace_working(Arc::new(filtered));
                true
            }
            None => {
                tracing::debug!(filter = kind.label(), "filter produced no result");
                false
            }
        }
    }

    /// Go back to the image the session was opened with.
    pub fn reset_image(&mut self) {
        self.replace_working(Arc::clone(&self.original));
    }

    fn replace_working(&mut self, image: Arc<Bitmap>) {
        self.working = image;
        self.generation += 1;
        self.events.emit(SessionEvent::WorkingImageReplaced {
            generation: self.generation,
        });
    }

    /// Start computing filter previews for the current working image.
    pub fn spawn_previews(&self) -> PreviewJob {
        let source = Arc::clone(&self.working);
        let edge = self.config.preview_edge;
        let intensity = self.config.sepia_intensity;
        PreviewJob {
            generation: self.generation,
            handle: tokio::task::spawn_blocking(move || {
                FilterPreviews::generate(&source, edge, intensity)
            }),
        }
    }

    /// Show previews, unless they were computed from an image that has
    /// since been replaced.
    pub fn install_previews(&mut self, computed: ComputedPreviews) -> bool {
        if computed.generation != self.generation {
            tracing::debug!(
                computed = computed.generation,
                current = self.generation,
                "discarding stale previews"
            );
            return false;
        }
        self.previews = computed.previews;
        self.events.emit(SessionEvent::PreviewsReady {
            generation: self.generation,
        });
        true
    }

    /// Compute and install previews for the current working image.
    pub async fn refresh_previews(&mut self) -> bool {
        match self.spawn_previews().join().await {
            Some(computed) => self.install_previews(computed),
            None => false,
        }
    }

    // ----- Output -----

    /// Start rendering the final composite from a snapshot of the session.
    pub fn spawn_render(&self) -> JoinHandle<Bitmap> {
        let compositor = self.compositor.clone();
        let base = Arc::clone(&self.working);
        let ink = self.ink.clone();
        let text = self.text.clone();
        let transform = self.transform;
        let canvas = self.canvas;
        tokio::task::spawn_blocking(move || compositor.render(&base, transform, &ink, &text, canvas))
    }

    pub async fn render_final(&self) -> Result<Arc<Bitmap>, JoinError> {
        Ok(Arc::new(self.spawn_render().await?))
    }

    /// Render and hand the result to `sink`. On failure the session is left
    /// untouched so the user can try again.
    pub async fn save<S: PersistenceSink + ?Sized>(&self, sink: &S) -> Result<(), SaveError> {
        let result = match self.render_final().await {
            Ok(image) => sink.save(image).await,
            Err(e) => Err(SaveError::Task(e)),
        };

        match &result {
            Ok(()) => {
                tracing::info!("edited photo saved");
                self.events.emit(SessionEvent::Saved);
            }
            Err(e) => {
                tracing::warn!(error = %e, "saving edited photo failed");
                self.events.emit(SessionEvent::SaveFailed(e.to_string()));
            }
        }
        result
    }

    pub async fn share<S: ShareSink + ?Sized>(&self, sink: &S) -> Result<(), JoinError> {
        let image = self.render_final().await?;
        sink.share(image);
        self.events.emit(SessionEvent::Shared);
        Ok(())
    }
}
