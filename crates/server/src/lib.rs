//! wiredesk-server
//!
//! In-memory development backend for the wiredesk client: token auth, wire
//! CRUD and a `/ws` socket that broadcasts status changes.

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod middleware;
pub mod processor;
pub mod routes;
pub mod state;
pub mod store;
pub mod ws;

pub use config::ServerConfig;
pub use state::AppState;

/// Build the router for `state`.
pub fn app(state: AppState) -> Router {
    // Build CORS layer
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(routes::health::root))
        .route("/health", get(routes::health::health))
        // Auth
        .route("/api/auth/register", post(routes::auth::register))
        .route("/api/auth/login", post(routes::auth::login))
        .route("/api/auth/me", get(routes::auth::me))
        // Wires
        .route(
            "/api/wires",
            get(routes::wires::list_wires).post(routes::wires::create_wire),
        )
        .route(
            "/api/wires/{id}",
            get(routes::wires::get_wire)
                .put(routes::wires::update_wire)
                .delete(routes::wires::delete_wire),
        )
        // WebSocket
        .route(wiredesk_shared::WS_PATH, get(ws::ws_handler))
        // Apply middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Serve until the listener fails.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    axum::serve(listener, app(state)).await
}
