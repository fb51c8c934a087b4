/// Database models for TaskHub
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: User accounts, credentials, and global roles
/// - `team`: Teams that scope tasks and memberships
/// - `membership`: User-team relationships with per-team roles
/// - `task`: Tasks owned by a team
/// - `comment`: Comments attached to tasks
/// - `activity_log`: Append-only audit trail of notable actions

pub mod activity_log;
pub mod comment;
pub mod membership;
pub mod task;
pub mod team;
pub mod user;
