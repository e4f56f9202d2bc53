//! # MedBill API Server
//!
//! HTTP backend for the shop billing web app.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        API Server                                       │
//! │                                                                         │
//! │  request ──► TraceLayer ──► CorsLayer ──► resolve_owner ──► /api/*      │
//! │                                              │                 │        │
//! │                                              ▼                 ▼        │
//! │                                     IdentityStrategy     medbill-db     │
//! │                                     (verified /          repositories   │
//! │                                      unverified /        ProfitLedger   │
//! │                                      none)                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`config`]. Everything can be set through `MEDBILL_*` environment
//! variables.

pub mod auth;
pub mod config;
pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

use axum::middleware;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use config::ServerConfig;
pub use error::ApiError;
pub use state::AppState;

/// Builds the complete router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .nest("/api", routes::api_routes())
        .layer(middleware::from_fn_with_state(state.clone(), auth::resolve_owner))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
