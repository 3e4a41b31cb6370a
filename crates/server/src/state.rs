//! Application state shared across request handlers.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::broadcast;
use wiredesk_shared::{RealtimeEvent, WireStatus, WireUpdateEvent};

use crate::store::Store;

const EVENT_CAPACITY: usize = 100;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    /// Serialized realtime events, fanned out to every socket.
    pub events: broadcast::Sender<String>,
    pub process_delay: Option<Duration>,
}

impl AppState {
    pub fn new(process_delay: Option<Duration>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            store: Arc::new(Store::new()),
            events,
            process_delay,
        }
    }

    /// Tell every connected socket that a wire changed status.
    pub fn broadcast_wire_update(&self, wire_id: i64, status: WireStatus, user_id: i64) {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or_default();
        let event = RealtimeEvent::WireUpdate(WireUpdateEvent {
            wire_id,
            status,
            user_id,
            timestamp,
        });
        match serde_json::to_string(&event) {
            Ok(json) => {
                let receivers = self.events.send(json).unwrap_or(0);
                tracing::debug!(wire_id, %status, receivers, "Broadcast wire_update");
            }
            Err(e) => tracing::error!("Failed to serialize wire_update: {}", e),
        }
    }
}
