/// Task endpoints
///
/// # Endpoints
///
/// - `GET    /api/tasks` - Tasks visible to the caller, with filters
/// - `POST   /api/tasks` - Create a task in a team the caller belongs to
/// - `GET    /api/tasks/:id` - Task details with its comments (members only)
/// - `PUT    /api/tasks/:id` - Update a task (members)
/// - `DELETE /api/tasks/:id` - Delete a task (team admin)
///
/// Listing is scoped to the caller's teams before any filter applies, so a
/// `team_id` filter for a foreign team yields an empty set rather than a
/// leak. Creating a task requires an existing membership in the target
/// team and never grants one.

use crate::{
    app::AppState,
    error::{validation_details, ApiError, ApiResult},
    routes::client_ip,
};
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use taskhub_shared::{
    auth::{
        authorization::{evaluate, Action, Target},
        middleware::CurrentUser,
    },
    models::{
        activity_log::ActivityLog,
        comment::Comment,
        membership::Membership,
        task::{CreateTask, Task, TaskFilter, TaskScope, UpdateTask},
        team::Team,
        user::GlobalRole,
    },
};
use uuid::Uuid;
use validator::Validate;

/// Task listing filters, all optional
#[derive(Debug, Deserialize)]
pub struct TaskListQuery {
    /// Restrict to one team
    pub team_id: Option<Uuid>,

    /// Restrict to a workflow status
    pub status: Option<String>,

    /// Substring match on title or description
    pub q: Option<String>,
}

/// Create task request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    /// Owning team
    pub team_id: Uuid,

    /// Task title
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Workflow status (defaults to "todo")
    pub status: Option<String>,

    /// Priority (defaults to "medium")
    pub priority: Option<String>,

    /// Optional assignee
    pub assigned_to: Option<Uuid>,
}

/// Task detail response: the task's fields with its comments embedded
#[derive(Debug, Serialize)]
pub struct TaskDetail {
    /// The task itself, flattened into the top level
    #[serde(flatten)]
    pub task: Task,

    /// Comments on the task, oldest first
    pub comments: Vec<Comment>,
}

/// Tasks visible to the caller
///
/// App admins see every task; everyone else only tasks in their teams. A
/// caller with no memberships gets an empty list.
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<TaskListQuery>,
) -> ApiResult<Json<Vec<Task>>> {
    let scope = if current.user.global_role == GlobalRole::AppAdmin {
        TaskScope::All
    } else {
        let team_ids = Membership::team_ids_for_user(&state.db, current.user.id).await?;
        TaskScope::Teams(team_ids)
    };

    let tasks = Task::list(
        &state.db,
        scope,
        TaskFilter {
            team_id: query.team_id,
            status: query.status,
            search: query.q,
        },
    )
    .await?;

    Ok(Json(tasks))
}

/// Create a task
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not a member of the target team
/// - `404 Not Found`: Team doesn't exist
pub async fn create_task(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    headers: HeaderMap,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    req.validate().map_err(validation_details)?;

    let team = Team::find_by_id(&state.db, req.team_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Team not found".to_string()))?;

    let membership = Membership::get_role(&state.db, team.id, current.user.id).await?;
    evaluate(&current.actor(), Action::Create, Target::Task, membership)?;

    let task = Task::create(
        &state.db,
        CreateTask {
            team_id: team.id,
            title: req.title,
            description: req.description.unwrap_or_default(),
            status: req.status.unwrap_or_else(|| "todo".to_string()),
            priority: req.priority.unwrap_or_else(|| "medium".to_string()),
            created_by: current.user.id,
            assigned_to: req.assigned_to,
        },
    )
    .await?;

    ActivityLog::record(
        &state.db,
        current.user.id,
        "create_task",
        format!("Created task '{}' in team '{}'", task.title, team.name),
        client_ip(&headers),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(task)))
}

/// Task details with comments
pub async fn get_task(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TaskDetail>> {
    let task = Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let membership = Membership::get_role(&state.db, task.team_id, current.user.id).await?;
    evaluate(&current.actor(), Action::Read, Target::Task, membership)?;

    let comments = Comment::list_by_task(&state.db, task.id).await?;

    Ok(Json(TaskDetail { task, comments }))
}

/// Update a task
///
/// Any member of the owning team may update; only provided fields change.
pub async fn update_task(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(req): Json<UpdateTask>,
) -> ApiResult<Json<Task>> {
    let task = Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let membership = Membership::get_role(&state.db, task.team_id, current.user.id).await?;
    evaluate(&current.actor(), Action::Update, Target::Task, membership)?;

    let updated = Task::update(&state.db, task.id, req)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    ActivityLog::record(
        &state.db,
        current.user.id,
        "update_task",
        format!("Updated task '{}'", updated.title),
        client_ip(&headers),
    )
    .await?;

    Ok(Json(updated))
}

/// Delete a task
///
/// Requires the team admin membership role; comments cascade.
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> ApiResult<StatusCode> {
    let task = Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let membership = Membership::get_role(&state.db, task.team_id, current.user.id).await?;
    evaluate(&current.actor(), Action::Delete, Target::Task, membership)?;

    Task::delete(&state.db, task.id).await?;

    ActivityLog::record(
        &state.db,
        current.user.id,
        "delete_task",
        format!("Deleted task '{}'", task.title),
        client_ip(&headers),
    )
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_task_detail_embeds_comments_beside_task_fields() {
        let task_id = Uuid::new_v4();
        let author = Uuid::new_v4();
        let detail = TaskDetail {
            task: Task {
                id: task_id,
                team_id: Uuid::new_v4(),
                title: "Ship it".to_string(),
                description: String::new(),
                status: "todo".to_string(),
                priority: "medium".to_string(),
                created_by: author,
                assigned_to: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            comments: vec![Comment {
                id: Uuid::new_v4(),
                task_id,
                user_id: author,
                content: "On it".to_string(),
                created_at: Utc::now(),
            }],
        };

        let value = serde_json::to_value(&detail).unwrap();

        // Task fields sit at the top level, comments beside them
        assert_eq!(value["title"], "Ship it");
        assert_eq!(value["id"], serde_json::json!(task_id));
        assert_eq!(value["comments"][0]["content"], "On it");
    }
}
