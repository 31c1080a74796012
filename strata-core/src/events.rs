/// Change notifications emitted by the document store.
///
/// Delivery goes through a `tokio::sync::broadcast` channel. Sending never
/// blocks and a missing receiver is not an error, so the store stays
/// synchronous; a persistence or sync layer subscribes and pulls a snapshot
/// at its own cadence.
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DocumentEvent {
    ElementAdded { id: String },
    ElementUpdated { id: String },
    ElementRemoved { id: String },
    EdgeAdded { id: String },
    EdgeUpdated { id: String },
    EdgeRemoved { id: String },
    BoardChanged { id: String },
    /// Contents were replaced wholesale (undo/redo or load).
    Restored,
}

#[derive(Debug, Clone)]
pub struct EventHub {
    tx: broadcast::Sender<DocumentEvent>,
}

impl EventHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DocumentEvent> {
        self.tx.subscribe()
    }

    pub fn emit(&self, event: DocumentEvent) {
        if let Err(e) = self.tx.send(event) {
            log::trace!("[strata.events.send] No receivers: {:?}", e.0);
        }
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}
