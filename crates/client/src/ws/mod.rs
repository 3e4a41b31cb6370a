//! Realtime channel to the wire backend.
//!
//! ```text
//!   RealtimeChannel ──connect()──▶ connection loop ──▶ Connector (socket)
//!         │                              │
//!   on_message(handler)           text frame ─▶ RealtimeEvent::parse
//!         │                              │
//!         └────── HandlerRegistry ◀──────┘  dispatch in registration order
//! ```
//!
//! Views register a handler on mount and unsubscribe on unmount. The loop
//! reconnects with exponential backoff after an unexpected close and gives up
//! after `ReconnectConfig::max_attempts`.

mod connection;
mod handlers;
mod transport;

pub use connection::{ConnectionState, ReconnectConfig, RealtimeChannel, RealtimeError};
pub use handlers::{EventHandler, Subscription};
pub use transport::{Connector, Frame, FrameSink, FrameStream, Socket, TungsteniteConnector};
