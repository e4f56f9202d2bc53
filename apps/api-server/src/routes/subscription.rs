use axum::extract::State;
use axum::Json;

use medbill_core::validation::{validate_amount, validate_plan_months};

use crate::auth::Owner;
use crate::dto::{RechargeRequest, RechargeResponse};
use crate::error::ApiError;
use crate::state::AppState;

/// Extends the owner's subscription by whole calendar months.
pub async fn recharge(
    State(state): State<AppState>,
    owner: Owner,
    Json(req): Json<RechargeRequest>,
) -> Result<Json<RechargeResponse>, ApiError> {
    let months = validate_plan_months(req.plan_months)?;
    let amount = validate_amount("amount", req.amount)?;

    let expiry = state
        .db
        .subscriptions()
        .recharge(owner.id, months, amount, state.today())
        .await?;

    Ok(Json(RechargeResponse { ok: true, expiry }))
}
