/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /api/register` - Register a new account
/// - `POST /api/login` - Login, get tokens, set the token cookie
/// - `POST /api/refresh` - Exchange a refresh token for a new access token
/// - `GET  /api/me` - The authenticated caller's live record
///
/// Login sets the `token` cookie (HttpOnly, SameSite=Lax) for browser
/// clients alongside returning both tokens in the body; API clients use
/// the `Authorization: Bearer` header instead.

use crate::{
    app::AppState,
    error::{validation_details, ApiError, ApiResult, ValidationErrorDetail},
    routes::client_ip,
};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use taskhub_shared::{
    auth::{
        jwt,
        middleware::{CurrentUser, TOKEN_COOKIE},
        password,
    },
    models::{
        activity_log::ActivityLog,
        user::{CreateUser, User},
    },
};
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Unique username
    #[validate(length(min = 3, max = 80, message = "Username must be 3-80 characters"))]
    pub username: String,

    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password (also validated for strength)
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// Register response
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    /// Access token (1h)
    pub access_token: String,

    /// Refresh token (30d)
    pub refresh_token: String,

    /// The newly created user
    pub user: User,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Username
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    /// Password
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// Access token (1h)
    pub access_token: String,

    /// Refresh token (30d)
    pub refresh_token: String,

    /// The authenticated user
    pub user: User,
}

/// Refresh token request
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    /// Refresh token
    pub refresh_token: String,
}

/// Refresh token response
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    /// New access token (1h)
    pub access_token: String,
}

/// Register a new account
///
/// New accounts always start with the `user` global role and no
/// memberships; there is no way to request a role at registration.
/// Registration establishes a session right away: the response carries
/// both tokens and sets the token cookie, like login.
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed or weak password
/// - `409 Conflict`: Username or email already exists
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, CookieJar, Json<RegisterResponse>)> {
    req.validate().map_err(validation_details)?;

    password::validate_password_strength(&req.password).map_err(|e| {
        ApiError::ValidationError(vec![ValidationErrorDetail {
            field: "password".to_string(),
            message: e,
        }])
    })?;

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            username: req.username,
            email: req.email,
            password_hash,
        },
    )
    .await?;

    ActivityLog::record(
        &state.db,
        user.id,
        "register",
        format!("User '{}' registered", user.username),
        client_ip(&headers),
    )
    .await?;

    let (access_token, refresh_token) = issue_session(&user, state.jwt_secret())?;
    let jar = jar.add(token_cookie(access_token.clone(), state.config.api.production));

    Ok((
        StatusCode::CREATED,
        jar,
        Json(RegisterResponse {
            access_token,
            refresh_token,
            user,
        }),
    ))
}

/// Login and get tokens
///
/// On success the response carries both tokens and the `token` cookie is
/// set with the access token for browser clients.
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown username, wrong password, or deactivated
///   account — all with the same body, so callers can't probe accounts
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> ApiResult<(CookieJar, Json<LoginResponse>)> {
    req.validate().map_err(validation_details)?;

    let invalid = || ApiError::Unauthorized("Invalid username or password".to_string());

    let user = User::find_by_username(&state.db, &req.username)
        .await?
        .ok_or_else(invalid)?;

    if !password::verify_password(&req.password, &user.password_hash)? {
        return Err(invalid());
    }

    if !user.active {
        return Err(invalid());
    }

    let (access_token, refresh_token) = issue_session(&user, state.jwt_secret())?;

    ActivityLog::record(
        &state.db,
        user.id,
        "login",
        format!("User '{}' logged in", user.username),
        client_ip(&headers),
    )
    .await?;

    let jar = jar.add(token_cookie(access_token.clone(), state.config.api.production));

    Ok((
        jar,
        Json(LoginResponse {
            access_token,
            refresh_token,
            user,
        }),
    ))
}

/// Exchange a refresh token for a new access token
///
/// The token cookie is refreshed alongside.
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid or expired refresh token
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<(CookieJar, Json<RefreshResponse>)> {
    let access_token = jwt::refresh_access_token(&req.refresh_token, state.jwt_secret())?;

    let jar = jar.add(token_cookie(access_token.clone(), state.config.api.production));

    Ok((jar, Json(RefreshResponse { access_token })))
}

/// The authenticated caller's live record
///
/// Reflects role changes immediately, unlike the stale snapshot inside
/// the token.
pub async fn me(Extension(current): Extension<CurrentUser>) -> Json<User> {
    Json(current.user)
}

/// Issues the access/refresh token pair for a fresh session
fn issue_session(user: &User, secret: &str) -> Result<(String, String), ApiError> {
    let access_claims = jwt::Claims::new(
        user.id,
        &user.username,
        user.global_role,
        jwt::TokenType::Access,
    );
    let refresh_claims = jwt::Claims::new(
        user.id,
        &user.username,
        user.global_role,
        jwt::TokenType::Refresh,
    );

    let access_token = jwt::create_token(&access_claims, secret)?;
    let refresh_token = jwt::create_token(&refresh_claims, secret)?;

    Ok((access_token, refresh_token))
}

fn token_cookie(access_token: String, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(TOKEN_COOKIE, access_token);
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_path("/");
    cookie.set_secure(secure);
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use taskhub_shared::models::user::GlobalRole;
    use uuid::Uuid;

    #[test]
    fn test_issue_session_mints_both_token_types() {
        let user = User {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "$argon2id$irrelevant".to_string(),
            global_role: GlobalRole::User,
            active: true,
            created_at: Utc::now(),
        };
        let secret = "test-secret-key-at-least-32-bytes-long";

        let (access, refresh) = issue_session(&user, secret).expect("session");

        let access_claims = jwt::validate_access_token(&access, secret).expect("access");
        assert_eq!(access_claims.sub, user.id);
        assert_eq!(access_claims.username, "alice");

        let refresh_claims = jwt::validate_refresh_token(&refresh, secret).expect("refresh");
        assert_eq!(refresh_claims.sub, user.id);
    }

    #[test]
    fn test_register_request_validation() {
        let valid = RegisterRequest {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "MyPassw0rd".to_string(),
        };
        assert!(valid.validate().is_ok());

        let bad_email = RegisterRequest {
            username: "alice".to_string(),
            email: "not-an-email".to_string(),
            password: "MyPassw0rd".to_string(),
        };
        assert!(bad_email.validate().is_err());

        let short_username = RegisterRequest {
            username: "al".to_string(),
            email: "alice@example.com".to_string(),
            password: "MyPassw0rd".to_string(),
        };
        assert!(short_username.validate().is_err());
    }

    #[test]
    fn test_token_cookie_attributes() {
        let cookie = token_cookie("abc".to_string(), true);
        assert_eq!(cookie.name(), TOKEN_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.path(), Some("/"));

        let dev_cookie = token_cookie("abc".to_string(), false);
        assert_eq!(dev_cookie.secure(), Some(false));
    }
}
