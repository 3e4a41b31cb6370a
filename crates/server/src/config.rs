//! Server configuration from environment variables.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;

pub const DEFAULT_BIND: &str = "0.0.0.0:8000";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    /// Delay between simulated processing steps. `None` disables the simulator.
    pub process_delay: Option<Duration>,
}

impl ServerConfig {
    /// Parse configuration from environment variables.
    ///
    /// Environment variables:
    /// - `WIREDESK_BIND`: listen address (default: "0.0.0.0:8000")
    /// - `WIREDESK_PROCESS_DELAY_MS`: enables the processing simulator (default: unset)
    pub fn from_env() -> anyhow::Result<Self> {
        let bind = std::env::var("WIREDESK_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());
        let bind = bind
            .parse()
            .with_context(|| format!("WIREDESK_BIND `{bind}` is not a socket address"))?;

        let process_delay = match std::env::var("WIREDESK_PROCESS_DELAY_MS") {
            Ok(raw) => {
                let ms: u64 = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("WIREDESK_PROCESS_DELAY_MS `{raw}` is not a number"))?;
                Some(Duration::from_millis(ms))
            }
            Err(_) => None,
        };

        Ok(Self {
            bind,
            process_delay,
        })
    }
}
