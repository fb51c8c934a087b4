/// Activity log endpoints (app admin only)
///
/// # Endpoints
///
/// - `GET /api/logs` - Newest entries first, filterable by acting user and
///   action, capped at 100 by default

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use taskhub_shared::models::activity_log::{ActivityLog, LogFilter};
use uuid::Uuid;

/// Log listing query
#[derive(Debug, Deserialize)]
pub struct LogListQuery {
    /// Restrict to one acting user
    pub user_id: Option<Uuid>,

    /// Restrict to one action tag, e.g. "login"
    pub action: Option<String>,

    /// Maximum entries (default 100)
    pub limit: Option<i64>,
}

/// List activity log entries
pub async fn list_logs(
    State(state): State<AppState>,
    Query(query): Query<LogListQuery>,
) -> ApiResult<Json<Vec<ActivityLog>>> {
    let entries = ActivityLog::list(
        &state.db,
        LogFilter {
            user_id: query.user_id,
            action: query.action,
            limit: query.limit,
        },
    )
    .await?;

    Ok(Json(entries))
}
