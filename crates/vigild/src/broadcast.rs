//! Realtime broadcast seam.
//!
//! Fire-and-forget push to officers' live views: no delivery guarantee,
//! no backpressure signal to the caller. Injected so tests can swap in a
//! no-op or observe the stream.

use serde_json::Value;
use tokio::sync::broadcast;
use tracing::debug;

/// One event on the realtime channel.
#[derive(Debug, Clone)]
pub struct BroadcastEvent {
    pub event: String,
    pub payload: Value,
}

pub trait Broadcaster: Send + Sync {
    fn broadcast(&self, event: &str, payload: Value);
}

/// Discards everything. Default for unit tests.
#[derive(Default)]
pub struct NoopBroadcaster;

impl Broadcaster for NoopBroadcaster {
    fn broadcast(&self, _event: &str, _payload: Value) {}
}

/// Fans events out over a tokio broadcast channel. Lagging or absent
/// subscribers are the subscriber's problem, matching the fire-and-forget
/// contract.
pub struct ChannelBroadcaster {
    tx: broadcast::Sender<BroadcastEvent>,
}

impl ChannelBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BroadcastEvent> {
        self.tx.subscribe()
    }
}

impl Broadcaster for ChannelBroadcaster {
    fn broadcast(&self, event: &str, payload: Value) {
        let sent = self.tx.send(BroadcastEvent {
            event: event.to_string(),
            payload,
        });
        if sent.is_err() {
            // No subscribers; fine for fire-and-forget
            debug!("broadcast '{event}' had no subscribers");
        }
    }
}
