/// Comment endpoints
///
/// # Endpoints
///
/// - `GET    /api/tasks/:id/comments` - List a task's comments (members)
/// - `POST   /api/tasks/:id/comments` - Comment on a task (members)
/// - `DELETE /api/comments/:id` - Delete a comment (author or team admin)

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
        comment::{Comment, CreateComment},
        membership::Membership,
        task::Task,
    },
};
use uuid::Uuid;
use validator::Validate;

/// Create comment request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    /// Comment body
    #[validate(length(min = 1, max = 5000, message = "Content must be 1-5000 characters"))]
    pub content: String,
}

/// List a task's comments
pub async fn list_comments(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Comment>>> {
    let task = Task::find_by_id(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let membership = Membership::get_role(&state.db, task.team_id, current.user.id).await?;
    evaluate(&current.actor(), Action::Read, Target::Task, membership)?;

    let comments = Comment::list_by_task(&state.db, task.id).await?;

    Ok(Json(comments))
}

/// Comment on a task
pub async fn create_comment(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(task_id): Path<Uuid>,
    headers: HeaderMap,
    Json(req): Json<CreateCommentRequest>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    req.validate().map_err(validation_details)?;

    let task = Task::find_by_id(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let membership = Membership::get_role(&state.db, task.team_id, current.user.id).await?;
    evaluate(
        &current.actor(),
        Action::Create,
        Target::Comment {
            author_id: current.user.id,
        },
        membership,
    )?;

    let comment = Comment::create(
        &state.db,
        CreateComment {
            task_id: task.id,
            user_id: current.user.id,
            content: req.content,
        },
    )
    .await?;

    ActivityLog::record(
        &state.db,
        current.user.id,
        "create_comment",
        format!("Commented on task '{}'", task.title),
        client_ip(&headers),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(comment)))
}

/// Delete a comment
///
/// The author may delete their own comment regardless of membership role;
/// anyone else needs the team admin role (or app admin).
pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> ApiResult<StatusCode> {
    let comment = Comment::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Comment not found".to_string()))?;

    // The team edge goes through the owning task
    let task = Task::find_by_id(&state.db, comment.task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let membership = Membership::get_role(&state.db, task.team_id, current.user.id).await?;
    evaluate(
        &current.actor(),
        Action::Delete,
        Target::Comment {
            author_id: comment.user_id,
        },
        membership,
    )?;

    Comment::delete(&state.db, comment.id).await?;

    ActivityLog::record(
        &state.db,
        current.user.id,
        "delete_comment",
        format!("Deleted a comment on task '{}'", task.title),
        client_ip(&headers),
    )
    .await?;

    Ok(StatusCode::NO_CONTENT)
}
