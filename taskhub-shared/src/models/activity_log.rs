/// Activity log model and database operations
///
/// An append-only audit trail of notable actions (registration, login, team
/// and task lifecycle, role changes, user deletion). Readable only through
/// the admin surface.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE activity_logs (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     action VARCHAR(64) NOT NULL,
///     details TEXT NOT NULL DEFAULT '',
///     ip_address VARCHAR(64),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Default page size for log listings
pub const DEFAULT_LOG_LIMIT: i64 = 100;

/// Activity log entry
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ActivityLog {
    /// Unique entry ID
    pub id: Uuid,

    /// Acting user; NULL after the user is deleted
    pub user_id: Option<Uuid>,

    /// Short action tag, e.g. "login", "create_team"
    pub action: String,

    /// Human-readable detail
    pub details: String,

    /// Client address as reported by the transport, if known
    pub ip_address: Option<String>,

    /// When the entry was recorded
    pub created_at: DateTime<Utc>,
}

/// Filters for log listing
#[derive(Debug, Clone, Default)]
pub struct LogFilter {
    /// Restrict to one acting user
    pub user_id: Option<Uuid>,

    /// Restrict to one action tag
    pub action: Option<String>,

    /// Maximum entries to return; defaults to [`DEFAULT_LOG_LIMIT`]
    pub limit: Option<i64>,
}

impl ActivityLog {
    /// Records an activity entry
    ///
    /// Audit writes are best-effort from the caller's point of view but the
    /// error is still surfaced so routes can decide to fail loudly.
    pub async fn record(
        pool: &PgPool,
        user_id: Uuid,
        action: &str,
        details: String,
        ip_address: Option<String>,
    ) -> Result<Self, sqlx::Error> {
        let entry = sqlx::query_as::<_, ActivityLog>(
            r#"
            INSERT INTO activity_logs (user_id, action, details, ip_address)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, action, details, ip_address, created_at
            "#,
        )
        .bind(user_id)
        .bind(action)
        .bind(details)
        .bind(ip_address)
        .fetch_one(pool)
        .await?;

        Ok(entry)
    }

    /// Lists log entries, newest first, narrowed by `filter`
    pub async fn list(pool: &PgPool, filter: LogFilter) -> Result<Vec<Self>, sqlx::Error> {
        let mut query = String::from(
            "SELECT id, user_id, action, details, ip_address, created_at FROM activity_logs WHERE 1=1",
        );
        let mut bind_count = 0;

        if filter.user_id.is_some() {
            bind_count += 1;
            query.push_str(&format!(" AND user_id = ${}", bind_count));
        }
        if filter.action.is_some() {
            bind_count += 1;
            query.push_str(&format!(" AND action = ${}", bind_count));
        }

        bind_count += 1;
        query.push_str(&format!(" ORDER BY created_at DESC LIMIT ${}", bind_count));

        let mut q = sqlx::query_as::<_, ActivityLog>(&query);
        if let Some(user_id) = filter.user_id {
            q = q.bind(user_id);
        }
        if let Some(action) = filter.action {
            q = q.bind(action);
        }
        q = q.bind(filter.limit.unwrap_or(DEFAULT_LOG_LIMIT));

        let entries = q.fetch_all(pool).await?;

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_filter_default() {
        let filter = LogFilter::default();
        assert!(filter.user_id.is_none());
        assert!(filter.action.is_none());
        assert!(filter.limit.is_none());
    }
}
