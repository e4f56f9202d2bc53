use axum::extract::State;
use axum::Json;
use serde::Serialize;
use ts_rs::TS;

use crate::state::AppState;

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct HealthResponse {
    pub ok: bool,
    pub database: bool,
}

/// Liveness. `ok` stays true while the process serves; `database` reports
/// whether a trivial query succeeds.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        database: state.db.health_check().await,
    })
}
