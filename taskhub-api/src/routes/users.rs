/// User administration endpoints (app admin only)
///
/// # Endpoints
///
/// - `GET    /api/users` - List users, optional `?q=` substring search
/// - `GET    /api/users/:id` - User details
/// - `PUT    /api/users/:id/role` - Change a user's global role
/// - `PUT    /api/users/:id/active` - Activate or deactivate a user
/// - `DELETE /api/users/:id` - Delete a user
///
/// The router already gates this group behind the live app_admin role;
/// handlers still run the evaluator so the self-deletion rule applies.
///
/// Role changes and deactivation take effect on the target's next request:
/// authentication re-fetches the live row, so outstanding tokens carry no
/// residual privilege.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::client_ip,
};
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use serde::Deserialize;
use taskhub_shared::{
    auth::{
        authorization::{evaluate, Action, Target},
        middleware::CurrentUser,
    },
    models::{
        activity_log::ActivityLog,
        user::{GlobalRole, User},
    },
};
use uuid::Uuid;

/// User listing query
#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    /// Substring search over username and email
    pub q: Option<String>,
}

/// Role update request
#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    /// New global role: "user", "team_admin", or "app_admin"
    pub role: String,
}

/// Active flag update request
#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    /// New active state
    pub active: bool,
}

/// List users
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<UserListQuery>,
) -> ApiResult<Json<Vec<User>>> {
    let users = match query.q {
        Some(term) if !term.is_empty() => User::search(&state.db, &term).await?,
        _ => User::list(&state.db).await?,
    };

    Ok(Json(users))
}

/// User details
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<User>> {
    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

/// Change a user's global role
///
/// # Errors
///
/// - `400 Bad Request`: Unknown role name
/// - `404 Not Found`: User doesn't exist
pub async fn update_role(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(req): Json<UpdateRoleRequest>,
) -> ApiResult<Json<User>> {
    let role = GlobalRole::parse(&req.role)
        .ok_or_else(|| ApiError::BadRequest(format!("Unknown role: {}", req.role)))?;

    evaluate(
        &current.actor(),
        Action::Update,
        Target::User { target_id: id },
        None,
    )?;

    let user = User::update_global_role(&state.db, id, role)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    ActivityLog::record(
        &state.db,
        current.user.id,
        "update_role",
        format!("Set role of '{}' to {}", user.username, role.as_str()),
        client_ip(&headers),
    )
    .await?;

    Ok(Json(user))
}

/// Activate or deactivate a user
///
/// Deactivation locks the account out on its next request.
pub async fn set_active(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(req): Json<SetActiveRequest>,
) -> ApiResult<StatusCode> {
    evaluate(
        &current.actor(),
        Action::Update,
        Target::User { target_id: id },
        None,
    )?;

    let updated = User::set_active(&state.db, id, req.active).await?;
    if !updated {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    ActivityLog::record(
        &state.db,
        current.user.id,
        "set_active",
        format!(
            "{} user {}",
            if req.active { "Activated" } else { "Deactivated" },
            id
        ),
        client_ip(&headers),
    )
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Delete a user
///
/// Self-deletion is refused with 409; the acting session must not orphan
/// itself. Memberships and comments cascade, activity entries keep a NULL
/// actor.
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> ApiResult<StatusCode> {
    evaluate(
        &current.actor(),
        Action::Delete,
        Target::User { target_id: id },
        None,
    )?;

    let deleted = User::delete(&state.db, id).await?;
    if !deleted {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    ActivityLog::record(
        &state.db,
        current.user.id,
        "delete_user",
        format!("Deleted user {}", id),
        client_ip(&headers),
    )
    .await?;

    Ok(StatusCode::NO_CONTENT)
}
