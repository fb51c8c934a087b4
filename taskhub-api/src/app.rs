/// Application state and router builder
///
/// This module defines the shared application state and builds the Axum
/// router with all routes and middleware. Configuration is threaded in
/// through [`AppState`]; handlers never read the environment.
///
/// # Example
///
/// ```no_run
/// use taskhub_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = taskhub_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::middleware::security::SecurityHeadersLayer;
use crate::{config::Config, routes};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{delete, get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use taskhub_shared::auth::middleware::{create_auth_middleware, require_app_admin};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor. Uses Arc
/// internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    /// Gets the token signing secret
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                          # Health check (public)
/// └── /api/
///     ├── POST /register               # Public
///     ├── POST /login                  # Public
///     ├── POST /refresh                # Public
///     ├── GET  /me                     # Authenticated
///     ├── /teams/                      # Authenticated
///     │   ├── GET|POST /
///     │   ├── GET|DELETE /:id
///     │   ├── GET|POST /:id/members
///     │   └── DELETE /:id/members/:user_id
///     ├── /tasks/                      # Authenticated
///     │   ├── GET|POST /
///     │   ├── GET|PUT|DELETE /:id
///     │   └── GET|POST /:id/comments
///     ├── /comments/                   # Authenticated
///     │   └── DELETE /:id
///     ├── /users/                      # App admin only
///     │   ├── GET /
///     │   ├── GET|DELETE /:id
///     │   ├── PUT /:id/role
///     │   └── PUT /:id/active
///     └── /logs/                       # App admin only
///         └── GET /
/// ```
///
/// Authentication runs before every non-public route and re-fetches the
/// live user; the admin group additionally checks the live global role.
/// Per-resource authorization happens inside handlers via the access
/// evaluator, since it needs the target's team and ownership edges.
pub fn build_router(state: AppState) -> Router {
    // Owned clones: the middleware closure must not borrow from `state`,
    // which is moved into the router below.
    let auth_layer = axum::middleware::from_fn(create_auth_middleware(
        state.db.clone(),
        state.jwt_secret().to_string(),
    ));

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Public auth endpoints plus the authenticated /me, directly under /api
    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh))
        .route("/me", get(routes::auth::me).layer(auth_layer.clone()));

    // Team-scoped resources (authenticated; per-resource checks in handlers)
    let team_routes = Router::new()
        .route("/", get(routes::teams::list_teams).post(routes::teams::create_team))
        .route("/:id", get(routes::teams::get_team).delete(routes::teams::delete_team))
        .route(
            "/:id/members",
            get(routes::teams::list_members).post(routes::teams::add_member),
        )
        .route("/:id/members/:user_id", delete(routes::teams::remove_member))
        .layer(auth_layer.clone());

    let task_routes = Router::new()
        .route("/", get(routes::tasks::list_tasks).post(routes::tasks::create_task))
        .route(
            "/:id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route(
            "/:id/comments",
            get(routes::comments::list_comments).post(routes::comments::create_comment),
        )
        .layer(auth_layer.clone());

    let comment_routes = Router::new()
        .route("/:id", delete(routes::comments::delete_comment))
        .layer(auth_layer.clone());

    // Admin surface: authentication, then the live-role admin gate
    let user_routes = Router::new()
        .route("/", get(routes::users::list_users))
        .route("/:id", get(routes::users::get_user).delete(routes::users::delete_user))
        .route("/:id/role", put(routes::users::update_role))
        .route("/:id/active", put(routes::users::set_active))
        .layer(axum::middleware::from_fn(require_app_admin))
        .layer(auth_layer.clone());

    let log_routes = Router::new()
        .route("/", get(routes::logs::list_logs))
        .layer(axum::middleware::from_fn(require_app_admin))
        .layer(auth_layer);

    let api_routes = Router::new()
        .merge(auth_routes)
        .nest("/teams", team_routes)
        .nest("/tasks", task_routes)
        .nest("/comments", comment_routes)
        .nest("/users", user_routes)
        .nest("/logs", log_routes);

    // Configure CORS based on environment
    let cors = if !state.config.api.production
        && state.config.api.cors_origins.contains(&"*".to_string())
    {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter(|origin| origin.as_str() != "*")
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}
