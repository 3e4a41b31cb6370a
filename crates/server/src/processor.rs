//! Simulated wire processing for local runs.
//!
//! New wires move `pending -> processing -> completed`, one step per delay,
//! and every step is broadcast like a manual status change.

use std::time::Duration;

use wiredesk_shared::WireStatus;

use crate::state::AppState;

const STEPS: [WireStatus; 2] = [WireStatus::Processing, WireStatus::Completed];

pub fn spawn(state: AppState, wire_id: i64, user_id: i64, delay: Duration) {
    tokio::spawn(async move {
        for status in STEPS {
            tokio::time::sleep(delay).await;
            let Some(wire) = state.store.set_status(wire_id, status).await else {
                tracing::debug!("Wire {} deleted before processing finished", wire_id);
                return;
            };
            tracing::info!("Processed wire {} -> {}", wire.id, wire.status);
            state.broadcast_wire_update(wire.id, wire.status, user_id);
        }
    });
}
