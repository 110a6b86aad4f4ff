//! Change notifications for stored models
//!
//! Uses tokio broadcast channels so any number of subscribers (UI layers,
//! sync tasks) can react to loads and saves. Emitting never blocks and
//! never fails; events sent with no subscribers are dropped.

use std::path::PathBuf;
use tokio::sync::broadcast;

/// What happened to a stored model
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// First access populated the shared instance
    Loaded { model: &'static str },

    /// The shared instance was replaced from disk
    Reloaded { model: &'static str },

    Saved { model: &'static str, path: PathBuf },

    Deleted { model: &'static str, path: PathBuf },
}

impl StoreEvent {
    pub fn model(&self) -> &'static str {
        match self {
            StoreEvent::Loaded { model }
            | StoreEvent::Reloaded { model }
            | StoreEvent::Saved { model, .. }
            | StoreEvent::Deleted { model, .. } => *model,
        }
    }
}

/// Event broadcaster for store events
#[derive(Debug, Clone)]
pub struct EventBroadcaster {
    tx: broadcast::Sender<StoreEvent>,
}

impl EventBroadcaster {
    /// Create a new event broadcaster
    ///
    /// # Arguments
    /// * `capacity` - Channel capacity (number of events buffered)
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Emit an event, returning how many subscribers it reached
    pub fn emit(&self, event: StoreEvent) -> usize {
        self.tx.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new(64)
    }
}
