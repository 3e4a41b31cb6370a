//! Client configuration from environment variables.
//!
//! Everything is read once at startup; there is no runtime reconfiguration.

use std::time::Duration;

use crate::ws::ReconnectConfig;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_WS_URL: &str = "ws://localhost:8000";
const DEFAULT_STALE_TIME_SECS: u64 = 60;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} is not a valid URL: {reason}")]
    InvalidUrl { var: &'static str, reason: String },
    #[error("{var} has an invalid value `{value}`")]
    InvalidValue { var: &'static str, value: String },
}

/// Feature toggles supplied by the deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureFlags {
    pub csv_export: bool,
    pub advanced_filters: bool,
    pub audit_log: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            csv_export: false,
            advanced_filters: true,
            audit_log: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// REST base URL, e.g. `http://localhost:8000`
    pub api_base_url: String,
    /// Realtime base URL, e.g. `ws://localhost:8000`
    pub ws_base_url: String,
    pub features: FeatureFlags,
    pub reconnect: ReconnectConfig,
    /// How long a fetched query result counts as fresh.
    pub stale_time: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            ws_base_url: DEFAULT_WS_URL.to_string(),
            features: FeatureFlags::default(),
            reconnect: ReconnectConfig::default(),
            stale_time: Duration::from_secs(DEFAULT_STALE_TIME_SECS),
        }
    }
}

impl ClientConfig {
    /// Read configuration from the process environment.
    ///
    /// Environment variables:
    /// - `WIREDESK_API_URL` (default: "http://localhost:8000")
    /// - `WIREDESK_WS_URL` (default: "ws://localhost:8000")
    /// - `WIREDESK_FEATURE_CSV_EXPORT` (default: false)
    /// - `WIREDESK_FEATURE_ADVANCED_FILTERS` (default: true)
    /// - `WIREDESK_FEATURE_AUDIT_LOG` (default: false)
    /// - `WIREDESK_STALE_TIME_SECS` (default: 60)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let api_base_url = url_var(&lookup, "WIREDESK_API_URL", DEFAULT_API_URL)?;
        let ws_base_url = url_var(&lookup, "WIREDESK_WS_URL", DEFAULT_WS_URL)?;

        let features = FeatureFlags {
            csv_export: bool_var(&lookup, "WIREDESK_FEATURE_CSV_EXPORT", defaults.features.csv_export)?,
            advanced_filters: bool_var(
                &lookup,
                "WIREDESK_FEATURE_ADVANCED_FILTERS",
                defaults.features.advanced_filters,
            )?,
            audit_log: bool_var(&lookup, "WIREDESK_FEATURE_AUDIT_LOG", defaults.features.audit_log)?,
        };

        let stale_time = match lookup("WIREDESK_STALE_TIME_SECS") {
            Some(raw) => Duration::from_secs(raw.trim().parse().map_err(|_| {
                ConfigError::InvalidValue {
                    var: "WIREDESK_STALE_TIME_SECS",
                    value: raw.clone(),
                }
            })?),
            None => defaults.stale_time,
        };

        Ok(Self {
            api_base_url,
            ws_base_url,
            features,
            reconnect: defaults.reconnect,
            stale_time,
        })
    }

    /// Full URL of the realtime endpoint.
    pub fn realtime_url(&self) -> String {
        format!(
            "{}{}",
            self.ws_base_url.trim_end_matches('/'),
            wiredesk_shared::WS_PATH
        )
    }
}

fn url_var(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: &str,
) -> Result<String, ConfigError> {
    let value = lookup(var).unwrap_or_else(|| default.to_string());
    url::Url::parse(&value).map_err(|e| ConfigError::InvalidUrl {
        var,
        reason: e.to_string(),
    })?;
    Ok(value.trim_end_matches('/').to_string())
}

fn bool_var(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: bool,
) -> Result<bool, ConfigError> {
    let Some(raw) = lookup(var) else {
        return Ok(default);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue { var, value: raw }),
    }
}
