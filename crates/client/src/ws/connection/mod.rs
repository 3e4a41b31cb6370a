//! Realtime connection state, reconnect policy and the channel itself.

use std::time::Duration;

mod channel;

pub use channel::RealtimeChannel;

/// Connection state for the realtime socket
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionState {
    /// Idle: never connected, or closed by the caller.
    Disconnected,
    Connecting,
    Connected,
    /// Lost the connection; waiting before reconnect attempt `attempt`.
    Reconnecting { attempt: u32 },
    /// Gave up after the last allowed attempt. Only `connect()` leaves this.
    Failed { reason: String },
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }

    pub fn is_connecting(&self) -> bool {
        matches!(
            self,
            ConnectionState::Connecting | ConnectionState::Reconnecting { .. }
        )
    }

    /// Whether a connection loop currently owns the socket.
    pub fn is_active(&self) -> bool {
        self.is_connected() || self.is_connecting()
    }
}

/// Configuration for auto-reconnect behavior
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectConfig {
    /// Maximum number of reconnect attempts after a connection is lost
    pub max_attempts: u32,
    /// Delay before the first attempt; doubles for each following one
    pub base_delay: Duration,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl ReconnectConfig {
    /// Delay before 1-indexed attempt `attempt`: `base_delay * 2^(attempt-1)`.
    /// `None` once `attempt` exceeds `max_attempts`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt > self.max_attempts {
            return None;
        }
        let factor = 1u32.checked_shl(attempt - 1)?;
        self.base_delay.checked_mul(factor)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RealtimeError {
    #[error("failed to connect: {0}")]
    Connect(String),
    #[error("socket error: {0}")]
    Io(String),
    #[error("realtime channel is not connected")]
    NotConnected,
    #[error("failed to serialize outbound message: {0}")]
    Serialize(String),
}
