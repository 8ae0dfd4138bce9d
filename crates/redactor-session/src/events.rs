//! Change notifications emitted by an editing session.

use redactor_core::TransformState;
use tokio::sync::broadcast;

use crate::editor::EditorTool;

/// Something visible changed in the session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    ToolSelected(EditorTool),
    TransformChanged(TransformState),
    /// A stroke was finished
    InkChanged { strokes: usize },
    TextChanged,
    /// The working image was replaced by a filter or a reset
    WorkingImageReplaced { generation: u64 },
    PreviewsReady { generation: u64 },
    Saved,
    SaveFailed(String),
    Shared,
}

/// Broadcast fan-out for [`SessionEvent`]s.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SessionEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    /// Deliver to current subscribers. Having none is not an error.
    pub fn emit(&self, event: SessionEvent) {
        tracing::trace!(?event, "session event");
        let _ = self.tx.send(event);
    }
}
