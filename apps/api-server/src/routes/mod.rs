//! # HTTP Routes
//!
//! Every handler is owner-scoped through the [`crate::auth::Owner`] extractor,
//! except health, register and login.
//!
//! | Path                          | Module          |
//! |-------------------------------|-----------------|
//! | `/api/health`                 | [`health`]      |
//! | `/api/auth/*`                 | [`auth`]        |
//! | `/api/dashboard/*`            | [`dashboard`]   |
//! | `/api/items*`                 | [`items`]       |
//! | `/api/bills*`                 | [`bills`]       |
//! | `/api/reports*`               | [`reports`]     |
//! | `/api/customer-details`       | [`customers`]   |
//! | `/api/subscription/recharge`  | [`subscription`]|

use axum::routing::{get, post, put};
use axum::Router;

use crate::state::AppState;

pub mod auth;
pub mod bills;
pub mod customers;
pub mod dashboard;
pub mod health;
pub mod items;
pub mod reports;
pub mod subscription;

/// All `/api` routes, relative to the `/api` prefix.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/dashboard/summary", get(dashboard::summary))
        .route("/dashboard/revenue-graph", get(dashboard::revenue_graph))
        .route("/dashboard/top-items", get(dashboard::top_items))
        .route("/dashboard/expiry-losses", get(dashboard::expiry_losses))
        .route("/items", get(items::list).post(items::create))
        .route("/items/search", get(items::search))
        .route("/items/bulk-delete", post(items::bulk_delete))
        .route("/items/{id}", put(items::update).delete(items::delete))
        .route("/bills", get(bills::list).post(bills::create))
        .route("/bills/{id}", get(bills::get))
        .route("/reports", get(reports::items))
        .route("/reports/items-history", get(reports::items_history))
        .route("/customer-details", get(customers::get).post(customers::save))
        .route("/subscription/recharge", post(subscription::recharge))
}
