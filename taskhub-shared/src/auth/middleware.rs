/// Request authentication for Axum
///
/// The middleware turns an incoming request into a verified acting
/// identity, or rejects it with 401. Credential lookup order:
///
/// 1. `Authorization: Bearer <token>` header
/// 2. `token` cookie (browser clients)
///
/// After verifying the token signature and expiration, the middleware
/// re-fetches the user row. The live record decides everything from here:
/// a deactivated or deleted user is rejected even while their token is
/// still cryptographically valid, and the role embedded in the token is
/// never consulted again.
///
/// # Request Extensions
///
/// On success a [`CurrentUser`] is added to the request extensions for
/// handlers to extract with `Extension<CurrentUser>`.
///
/// # Example
///
/// ```no_run
/// use axum::{middleware, routing::get, Extension, Router};
/// use sqlx::PgPool;
/// use taskhub_shared::auth::middleware::{create_auth_middleware, CurrentUser};
///
/// async fn whoami(Extension(current): Extension<CurrentUser>) -> String {
///     current.user.username
/// }
///
/// fn routes(pool: PgPool, secret: String) -> Router {
///     Router::new()
///         .route("/api/me", get(whoami))
///         .layer(middleware::from_fn(create_auth_middleware(pool, secret)))
/// }
/// ```

use axum::{
    extract::Request,
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use sqlx::PgPool;

use super::authorization::Actor;
use super::jwt::{validate_access_token, Claims, JwtError};
use crate::models::user::{GlobalRole, User};

/// Cookie carrying the access token for browser clients
pub const TOKEN_COOKIE: &str = "token";

/// The verified acting identity, added to request extensions
///
/// `user` is the live database row, fetched per request. `claims` is the
/// verified token payload; its role field is a stale snapshot kept only
/// for logging.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// Live user record
    pub user: User,

    /// Verified token claims
    pub claims: Claims,
}

impl CurrentUser {
    /// The actor view the access evaluator takes
    pub fn actor(&self) -> Actor {
        Actor::from_user(&self.user)
    }
}

/// Error type for the authentication middleware
#[derive(Debug)]
pub enum AuthError {
    /// No bearer header and no token cookie
    MissingCredentials,

    /// Signature, expiration, issuer, or token-type check failed
    InvalidToken(String),

    /// Token verified but the subject no longer exists or is deactivated
    UnknownOrInactiveUser,

    /// Authenticated, but the route requires the app_admin role
    Forbidden,

    /// Database error during the live user fetch
    DatabaseError(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::MissingCredentials => {
                (StatusCode::UNAUTHORIZED, "Missing credentials").into_response()
            }
            AuthError::InvalidToken(msg) => (StatusCode::UNAUTHORIZED, msg).into_response(),
            AuthError::UnknownOrInactiveUser => {
                // Same status and wording as a bad token; the caller learns
                // nothing about account state.
                (StatusCode::UNAUTHORIZED, "Invalid token").into_response()
            }
            AuthError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden").into_response(),
            AuthError::DatabaseError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}

/// Pulls the access token out of the request headers
///
/// The bearer header wins when both are present. A malformed Authorization
/// header (missing the `Bearer ` prefix) is skipped rather than rejected,
/// so browser clients with a stray header still authenticate via cookie.
pub fn extract_credential(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        if let Some(token) = value.strip_prefix("Bearer ") {
            return Some(token.to_string());
        }
    }

    CookieJar::from_headers(headers)
        .get(TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
}

/// Authentication middleware
///
/// Extracts and verifies the access token, re-fetches the live user, and
/// adds a [`CurrentUser`] extension.
///
/// # Errors
///
/// Returns 401 Unauthorized if:
/// - No credential is present in header or cookie
/// - The token fails verification or has expired
/// - The token is a refresh token
/// - The user no longer exists or is deactivated
pub async fn auth_middleware(
    pool: PgPool,
    secret: String,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = extract_credential(req.headers()).ok_or(AuthError::MissingCredentials)?;

    let claims = validate_access_token(&token, &secret).map_err(|e| match e {
        JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
        _ => AuthError::InvalidToken("Invalid token".to_string()),
    })?;

    // Live fetch; the token's role snapshot is not trusted past this point
    let fetched = User::find_by_id(&pool, claims.sub)
        .await
        .map_err(|e| AuthError::DatabaseError(format!("User lookup failed: {}", e)))?;
    let user = ensure_active(fetched)?;

    req.extensions_mut().insert(CurrentUser { user, claims });

    Ok(next.run(req).await)
}

/// Accepts the live fetch result only for an existing, active user
///
/// A deleted subject and a deactivated one map to the same error, so a
/// still-valid token reveals nothing about which it was.
fn ensure_active(user: Option<User>) -> Result<User, AuthError> {
    match user {
        Some(user) if user.active => Ok(user),
        _ => Err(AuthError::UnknownOrInactiveUser),
    }
}

/// Creates an authentication middleware closure
///
/// Captures the pool and secret so the middleware can be layered with
/// `axum::middleware::from_fn`.
pub fn create_auth_middleware(
    pool: PgPool,
    secret: impl Into<String>,
) -> impl Fn(
    Request,
    Next,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, AuthError>> + Send>>
       + Clone {
    let secret = secret.into();
    move |req, next| {
        let pool = pool.clone();
        let secret = secret.clone();
        Box::pin(auth_middleware(pool, secret, req, next))
    }
}

/// Admin gate, layered after [`auth_middleware`]
///
/// Checks the live global role on the [`CurrentUser`] extension. A token
/// minted before a demotion carries the old role claim, but it is the live
/// value that decides here.
pub async fn require_app_admin(req: Request, next: Next) -> Result<Response, AuthError> {
    let current = req
        .extensions()
        .get::<CurrentUser>()
        .ok_or(AuthError::MissingCredentials)?;

    if current.user.global_role != GlobalRole::AppAdmin {
        return Err(AuthError::Forbidden);
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            headers.insert(
                header::HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        headers
    }

    #[test]
    fn test_extract_credential_from_bearer_header() {
        let headers = headers_with(&[("authorization", "Bearer abc.def.ghi")]);
        assert_eq!(extract_credential(&headers), Some("abc.def.ghi".to_string()));
    }

    #[test]
    fn test_extract_credential_from_cookie() {
        let headers = headers_with(&[("cookie", "theme=dark; token=abc.def.ghi")]);
        assert_eq!(extract_credential(&headers), Some("abc.def.ghi".to_string()));
    }

    #[test]
    fn test_bearer_header_wins_over_cookie() {
        let headers = headers_with(&[
            ("authorization", "Bearer from-header"),
            ("cookie", "token=from-cookie"),
        ]);
        assert_eq!(extract_credential(&headers), Some("from-header".to_string()));
    }

    #[test]
    fn test_malformed_authorization_falls_back_to_cookie() {
        let headers = headers_with(&[
            ("authorization", "Basic dXNlcjpwYXNz"),
            ("cookie", "token=from-cookie"),
        ]);
        assert_eq!(extract_credential(&headers), Some("from-cookie".to_string()));
    }

    #[test]
    fn test_extract_credential_absent() {
        assert_eq!(extract_credential(&HeaderMap::new()), None);

        let headers = headers_with(&[("cookie", "theme=dark")]);
        assert_eq!(extract_credential(&headers), None);
    }

    #[test]
    fn test_live_fetch_rejects_missing_and_inactive_users() {
        use chrono::Utc;
        use uuid::Uuid;

        // Token verified, subject gone: the deletion wins over the token
        assert!(matches!(
            ensure_active(None),
            Err(AuthError::UnknownOrInactiveUser)
        ));

        let mut user = User {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "$argon2id$irrelevant".to_string(),
            global_role: GlobalRole::User,
            active: false,
            created_at: Utc::now(),
        };

        // Deactivated mid-token-lifetime: rejected on the next request
        assert!(matches!(
            ensure_active(Some(user.clone())),
            Err(AuthError::UnknownOrInactiveUser)
        ));

        user.active = true;
        let accepted = ensure_active(Some(user)).expect("active user passes");
        assert_eq!(accepted.username, "alice");
    }

    #[test]
    fn test_auth_error_responses() {
        assert_eq!(
            AuthError::MissingCredentials.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::InvalidToken("Token expired".to_string())
                .into_response()
                .status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::UnknownOrInactiveUser.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AuthError::Forbidden.into_response().status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AuthError::DatabaseError("boom".to_string())
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
