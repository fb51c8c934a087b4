/// Health check endpoint

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use serde_json::json;
use taskhub_shared::db::pool;

/// `GET /health`
///
/// Verifies database connectivity and reports the server version.
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    pool::health_check(&state.db).await?;

    Ok(Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    })))
}
