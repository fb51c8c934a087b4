/// Team endpoints
///
/// # Endpoints
///
/// - `GET    /api/teams` - Teams visible to the caller
/// - `POST   /api/teams` - Create a team (creator becomes its admin)
/// - `GET    /api/teams/:id` - Team details (members only)
/// - `DELETE /api/teams/:id` - Delete a team (team admin)
/// - `GET    /api/teams/:id/members` - List members
/// - `POST   /api/teams/:id/members` - Add a member (team admin)
/// - `DELETE /api/teams/:id/members/:user_id` - Remove a member (team admin)
///
/// Every handler loads the caller's live membership and runs the access
/// evaluator before touching the resource.

use crate::{
    app::AppState,
    error::{validation_details, ApiError, ApiResult},
    routes::client_ip,
};
use axum::{
    extract::{Path, State},
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
        membership::{CreateMembership, Membership, MembershipRole},
        team::{CreateTeam, Team},
        user::{GlobalRole, User},
    },
};
use uuid::Uuid;
use validator::Validate;

/// Create team request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTeamRequest {
    /// Team name
    #[validate(length(min = 1, max = 120, message = "Team name must be 1-120 characters"))]
    pub name: String,

    /// Optional description
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,
}

/// Add member request
#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    /// User to add
    pub user_id: Uuid,

    /// Role to assign (defaults to member)
    pub role: Option<MembershipRole>,
}

/// Teams visible to the caller
///
/// App admins see every team; everyone else sees the teams they hold a
/// membership in. No memberships means an empty list, not an error.
pub async fn list_teams(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Json<Vec<Team>>> {
    let teams = if current.user.global_role == GlobalRole::AppAdmin {
        Team::list_all(&state.db).await?
    } else {
        Team::list_for_user(&state.db, current.user.id).await?
    };

    Ok(Json(teams))
}

/// Create a team
///
/// Any active user may create a team; the creator is added as the team's
/// membership admin in the same request.
pub async fn create_team(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    headers: HeaderMap,
    Json(req): Json<CreateTeamRequest>,
) -> ApiResult<(StatusCode, Json<Team>)> {
    req.validate().map_err(validation_details)?;
    evaluate(&current.actor(), Action::Create, Target::TeamCreation, None)?;

    let team = Team::create(
        &state.db,
        CreateTeam {
            name: req.name,
            description: req.description.unwrap_or_default(),
            created_by: current.user.id,
        },
    )
    .await?;

    Membership::create(
        &state.db,
        CreateMembership {
            team_id: team.id,
            user_id: current.user.id,
            role: MembershipRole::Admin,
        },
    )
    .await?;

    ActivityLog::record(
        &state.db,
        current.user.id,
        "create_team",
        format!("Created team '{}'", team.name),
        client_ip(&headers),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(team)))
}

/// Team details
pub async fn get_team(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Team>> {
    let team = Team::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Team not found".to_string()))?;

    let membership = Membership::get_role(&state.db, team.id, current.user.id).await?;
    evaluate(&current.actor(), Action::Read, Target::Team, membership)?;

    Ok(Json(team))
}

/// Delete a team
///
/// Memberships and tasks cascade.
pub async fn delete_team(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> ApiResult<StatusCode> {
    let team = Team::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Team not found".to_string()))?;

    let membership = Membership::get_role(&state.db, team.id, current.user.id).await?;
    evaluate(&current.actor(), Action::Delete, Target::Team, membership)?;

    Team::delete(&state.db, team.id).await?;

    ActivityLog::record(
        &state.db,
        current.user.id,
        "delete_team",
        format!("Deleted team '{}'", team.name),
        client_ip(&headers),
    )
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// List a team's members
pub async fn list_members(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<Membership>>> {
    let team = Team::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Team not found".to_string()))?;

    let membership = Membership::get_role(&state.db, team.id, current.user.id).await?;
    evaluate(&current.actor(), Action::Read, Target::Team, membership)?;

    let members = Membership::list_by_team(&state.db, team.id).await?;

    Ok(Json(members))
}

/// Add a member to a team
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not a team admin (or app admin)
/// - `404 Not Found`: Team or target user doesn't exist
/// - `409 Conflict`: User is already a member
pub async fn add_member(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(req): Json<AddMemberRequest>,
) -> ApiResult<(StatusCode, Json<Membership>)> {
    let team = Team::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Team not found".to_string()))?;

    let membership = Membership::get_role(&state.db, team.id, current.user.id).await?;
    evaluate(&current.actor(), Action::Update, Target::Team, membership)?;

    let target_user = User::find_by_id(&state.db, req.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let created = Membership::create(
        &state.db,
        CreateMembership {
            team_id: team.id,
            user_id: target_user.id,
            role: req.role.unwrap_or(MembershipRole::Member),
        },
    )
    .await?;

    ActivityLog::record(
        &state.db,
        current.user.id,
        "add_member",
        format!("Added '{}' to team '{}'", target_user.username, team.name),
        client_ip(&headers),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// Remove a member from a team
pub async fn remove_member(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
    headers: HeaderMap,
) -> ApiResult<StatusCode> {
    let team = Team::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Team not found".to_string()))?;

    let membership = Membership::get_role(&state.db, team.id, current.user.id).await?;
    evaluate(&current.actor(), Action::Update, Target::Team, membership)?;

    let removed = Membership::delete(&state.db, team.id, user_id).await?;
    if !removed {
        return Err(ApiError::NotFound("Membership not found".to_string()));
    }

    ActivityLog::record(
        &state.db,
        current.user.id,
        "remove_member",
        format!("Removed user {} from team '{}'", user_id, team.name),
        client_ip(&headers),
    )
    .await?;

    Ok(StatusCode::NO_CONTENT)
}
