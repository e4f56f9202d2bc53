//! Password accounts.
//!
//! Token-provisioned accounts have no password and cannot log in here.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use tracing::info;

use medbill_core::validation::{validate_email, validate_password};
use medbill_core::CoreError;

use crate::dto::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse, UserView};
use crate::error::ApiError;
use crate::state::AppState;

const DEFAULT_SHOP_NAME: &str = "My Shop";

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let email = validate_email(&req.email)?;
    validate_password(&req.password)?;
    let shop_name = req
        .shop_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_SHOP_NAME);

    let user = state.db.users().register(&email, &req.password, shop_name).await?;
    info!(user_id = user.id, "Account registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            id: user.id,
            message: "Registered",
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let email = req.email.trim().to_lowercase();
    if email.is_empty() || req.password.is_empty() {
        return Err(CoreError::InvalidCredentials.into());
    }

    let user = state
        .db
        .users()
        .authenticate(&email, &req.password)
        .await?
        .ok_or(CoreError::InvalidCredentials)?;

    Ok(Json(LoginResponse {
        user: UserView::new(user, state.today()),
    }))
}
