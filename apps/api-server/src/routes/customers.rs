//! Shop letterhead details, one record per owner.

use axum::extract::State;
use axum::Json;

use medbill_core::CustomerDetails;

use crate::auth::Owner;
use crate::dto::MessageResponse;
use crate::error::ApiError;
use crate::state::AppState;

pub async fn get(State(state): State<AppState>, owner: Owner) -> Result<Json<CustomerDetails>, ApiError> {
    Ok(Json(state.db.customers().get(owner.id).await?))
}

pub async fn save(
    State(state): State<AppState>,
    owner: Owner,
    Json(details): Json<CustomerDetails>,
) -> Result<Json<MessageResponse>, ApiError> {
    let trimmed = CustomerDetails {
        name: details.name.trim().to_string(),
        organization_name: details.organization_name.trim().to_string(),
        email: details.email.trim().to_string(),
        address: details.address.trim().to_string(),
        gstin: details.gstin.trim().to_uppercase(),
    };
    state.db.customers().upsert(owner.id, &trimmed).await?;

    Ok(Json(MessageResponse {
        success: true,
        message: "Customer saved successfully",
    }))
}
