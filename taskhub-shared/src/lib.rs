//! # TaskHub Shared Library
//!
//! This crate contains the types and business logic shared between the
//! TaskHub API server and its tooling.
//!
//! ## Module Organization
//!
//! - `models`: Database models and CRUD operations
//! - `auth`: Token issuing/verification, password hashing, request
//!   authentication middleware, and the access-control evaluator
//! - `db`: PostgreSQL connection pool management

pub mod auth;
pub mod db;
pub mod models;

/// Current version of the TaskHub shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
