//! # TaskHub API Server
//!
//! JSON API for multi-team task tracking: registration and login, teams
//! with per-team membership roles, tasks, comments, user administration,
//! and an activity log. Built with Axum and sqlx on PostgreSQL.
//!
//! ## Module Organization
//!
//! - `app`: Application state and router builder
//! - `config`: Environment-based configuration
//! - `error`: Unified API error type and HTTP mapping
//! - `middleware`: HTTP-edge middleware (security headers)
//! - `routes`: Request handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
