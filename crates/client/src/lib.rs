//! wiredesk client
//!
//! Front end for managing wire transfers: an authenticated REST client, a
//! realtime channel with reconnect, a keyed query cache, and the list, form
//! and auth controllers a renderer drives.

pub mod api_client;
pub mod app;
pub mod auth_session;
pub mod config;
pub mod export;
pub mod logging;
pub mod routes;
pub mod storage;
pub mod stores;
pub mod views;
pub mod ws;

pub use api_client::ApiClient;
pub use app::AppContext;
pub use auth_session::{AuthSession, Session};
pub use config::{ClientConfig, FeatureFlags};
pub use routes::{Navigator, Route};
