/// Task model and database operations
///
/// Tasks belong to a team; all access to them is decided from the caller's
/// membership in that team (or an app_admin global role). Listing supports
/// optional team, status, and search filters — every filter value is bound
/// as a query parameter.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     team_id UUID NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
///     title VARCHAR(200) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     status VARCHAR(32) NOT NULL DEFAULT 'todo',
///     priority VARCHAR(32) NOT NULL DEFAULT 'medium',
///     created_by UUID NOT NULL REFERENCES users(id),
///     assigned_to UUID REFERENCES users(id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Task model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Owning team
    pub team_id: Uuid,

    /// Short title
    pub title: String,

    /// Free-form description
    pub description: String,

    /// Workflow status, e.g. "todo", "in_progress", "done"
    pub status: String,

    /// Priority, e.g. "low", "medium", "high"
    pub priority: String,

    /// User who created the task
    pub created_by: Uuid,

    /// Optional assignee
    pub assigned_to: Option<Uuid>,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new task
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub team_id: Uuid,
    pub title: String,
    pub description: String,
    pub status: String,
    pub priority: String,
    pub created_by: Uuid,
    pub assigned_to: Option<Uuid>,
}

/// Input for updating a task; only non-None fields are written
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    /// `Some(None)` clears the assignee. An absent key deserializes to the
    /// outer `None` (unchanged), an explicit JSON `null` to `Some(None)`.
    #[serde(default, deserialize_with = "double_option")]
    pub assigned_to: Option<Option<Uuid>>,
}

// Plain serde collapses a missing key and an explicit null to the same
// None; wrapping the parsed value keeps the two cases apart.
fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<Uuid>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Uuid>::deserialize(deserializer).map(Some)
}

/// Filters for task listing; all optional, combined with AND
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    /// Restrict to one team
    pub team_id: Option<Uuid>,

    /// Restrict to a workflow status
    pub status: Option<String>,

    /// Substring match on title or description
    pub search: Option<String>,
}

/// Visibility scope for task listing
#[derive(Debug, Clone)]
pub enum TaskScope {
    /// app_admin: every task
    All,

    /// Ordinary caller: only tasks in these teams. An empty list yields an
    /// empty result set, never an error.
    Teams(Vec<Uuid>),
}

const TASK_COLUMNS: &str = "id, team_id, title, description, status, priority, created_by, assigned_to, created_at, updated_at";

impl Task {
    /// Creates a new task
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (team_id, title, description, status, priority, created_by, assigned_to)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, team_id, title, description, status, priority, created_by, assigned_to,
                      created_at, updated_at
            "#,
        )
        .bind(data.team_id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.status)
        .bind(data.priority)
        .bind(data.created_by)
        .bind(data.assigned_to)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Lists tasks visible within `scope`, narrowed by `filter`
    ///
    /// The query is assembled with numbered placeholders and bound values;
    /// user input never reaches the SQL text.
    pub async fn list(
        pool: &PgPool,
        scope: TaskScope,
        filter: TaskFilter,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let mut query = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE 1=1");
        let mut bind_count = 0;

        let team_ids = match &scope {
            TaskScope::All => None,
            TaskScope::Teams(ids) => {
                bind_count += 1;
                query.push_str(&format!(" AND team_id = ANY(${})", bind_count));
                Some(ids.clone())
            }
        };

        if filter.team_id.is_some() {
            bind_count += 1;
            query.push_str(&format!(" AND team_id = ${}", bind_count));
        }
        if filter.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(" AND status = ${}", bind_count));
        }
        let search_pattern = filter.search.as_ref().map(|s| format!("%{}%", s));
        if search_pattern.is_some() {
            bind_count += 1;
            query.push_str(&format!(
                " AND (title ILIKE ${0} OR description ILIKE ${0})",
                bind_count
            ));
        }

        query.push_str(" ORDER BY created_at DESC");

        let mut q = sqlx::query_as::<_, Task>(&query);
        if let Some(ids) = team_ids {
            q = q.bind(ids);
        }
        if let Some(team_id) = filter.team_id {
            q = q.bind(team_id);
        }
        if let Some(status) = filter.status {
            q = q.bind(status);
        }
        if let Some(pattern) = search_pattern {
            q = q.bind(pattern);
        }

        let tasks = q.fetch_all(pool).await?;

        Ok(tasks)
    }

    /// Updates a task; only fields present in `data` are written
    ///
    /// Returns the updated task if found, None if it doesn't exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(", status = ${}", bind_count));
        }
        if data.priority.is_some() {
            bind_count += 1;
            query.push_str(&format!(", priority = ${}", bind_count));
        }
        if data.assigned_to.is_some() {
            bind_count += 1;
            query.push_str(&format!(", assigned_to = ${}", bind_count));
        }

        query.push_str(&format!(
            " WHERE id = $1 RETURNING {TASK_COLUMNS}"
        ));

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(status) = data.status {
            q = q.bind(status);
        }
        if let Some(priority) = data.priority {
            q = q.bind(priority);
        }
        if let Some(assigned_to) = data.assigned_to {
            q = q.bind(assigned_to);
        }

        let task = q.fetch_optional(pool).await?;

        Ok(task)
    }

    /// Deletes a task; comments cascade. Returns true if a row was deleted.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_task_default_is_empty() {
        let update = UpdateTask::default();
        assert!(update.title.is_none());
        assert!(update.description.is_none());
        assert!(update.status.is_none());
        assert!(update.priority.is_none());
        assert!(update.assigned_to.is_none());
    }

    #[test]
    fn test_update_assignee_null_clears_absent_leaves_unchanged() {
        let cleared: UpdateTask = serde_json::from_str(r#"{"assigned_to": null}"#).unwrap();
        assert_eq!(cleared.assigned_to, Some(None));

        let untouched: UpdateTask = serde_json::from_str("{}").unwrap();
        assert_eq!(untouched.assigned_to, None);

        let id = Uuid::new_v4();
        let reassigned: UpdateTask =
            serde_json::from_str(&format!(r#"{{"assigned_to": "{}"}}"#, id)).unwrap();
        assert_eq!(reassigned.assigned_to, Some(Some(id)));
    }

    #[test]
    fn test_task_filter_default_is_unfiltered() {
        let filter = TaskFilter::default();
        assert!(filter.team_id.is_none());
        assert!(filter.status.is_none());
        assert!(filter.search.is_none());
    }
}
