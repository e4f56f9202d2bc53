//! # Dashboard
//!
//! `summary` is the only endpoint that writes: it runs expiry detection
//! before reading the ledger. Everything else here is read-only.

use axum::extract::State;
use axum::Json;

use medbill_core::{ProfitSummary, TOP_ITEMS_LIMIT};

use crate::auth::Owner;
use crate::dto::{ExpiryLossView, RevenuePointView, TopItemView};
use crate::error::ApiError;
use crate::state::AppState;

pub async fn summary(State(state): State<AppState>, owner: Owner) -> Result<Json<ProfitSummary>, ApiError> {
    let summary = state.db.ledger().summary(owner.id, state.today()).await?;
    Ok(Json(summary))
}

pub async fn revenue_graph(
    State(state): State<AppState>,
    owner: Owner,
) -> Result<Json<Vec<RevenuePointView>>, ApiError> {
    let points = state.db.reports().revenue_graph(owner.id, state.today()).await?;
    Ok(Json(points.into_iter().map(Into::into).collect()))
}

pub async fn top_items(State(state): State<AppState>, owner: Owner) -> Result<Json<Vec<TopItemView>>, ApiError> {
    let items = state
        .db
        .reports()
        .top_items(owner.id, state.today(), TOP_ITEMS_LIMIT)
        .await?;
    Ok(Json(items.into_iter().map(Into::into).collect()))
}

pub async fn expiry_losses(
    State(state): State<AppState>,
    owner: Owner,
) -> Result<Json<Vec<ExpiryLossView>>, ApiError> {
    let rows = state.db.expiry_losses().list(owner.id).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}
