/// Token issuing and verification
///
/// Bearer tokens are JWTs signed with HS256. Claims carry the user id,
/// username, and a snapshot of the global role at issue time.
///
/// # Security
///
/// - **Algorithm**: HS256 (HMAC-SHA256)
/// - **Access tokens**: short-lived (1 hour) to bound the damage of a leak
/// - **Refresh tokens**: long-lived (30 days), exchangeable for new access
///   tokens
/// - **Secret**: supplied by configuration, at least 32 bytes, never a
///   hardcoded default
///
/// The embedded role claim is informational only; authorization always
/// consults the live user record (see [`crate::auth::middleware`]).
///
/// # Example
///
/// ```
/// use taskhub_shared::auth::jwt::{create_token, validate_token, Claims, TokenType};
/// use taskhub_shared::models::user::GlobalRole;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = "an-unpredictable-secret-of-32-bytes!";
/// let claims = Claims::new(Uuid::new_v4(), "alice", GlobalRole::User, TokenType::Access);
/// let token = create_token(&claims, secret)?;
///
/// let verified = validate_token(&token, secret)?;
/// assert_eq!(verified.sub, claims.sub);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::GlobalRole;

/// Issuer claim stamped into every token
const ISSUER: &str = "taskhub";

/// Error type for token operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create a token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Signature mismatch, wrong issuer, or unparseable structure
    #[error("Invalid token: {0}")]
    Invalid(String),
}

/// Token type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Access token, short-lived, used for API authentication
    Access,

    /// Refresh token, long-lived, used only to mint new access tokens
    Refresh,
}

impl TokenType {
    /// Default expiration duration for this token type
    pub fn default_expiration(&self) -> Duration {
        match self {
            TokenType::Access => Duration::hours(1),
            TokenType::Refresh => Duration::days(30),
        }
    }
}

/// Token claims
///
/// `sub` identifies the user; `username` and `role` are snapshots taken at
/// issue time and are never consulted for authorization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - user ID
    pub sub: Uuid,

    /// Username at issue time
    pub username: String,

    /// Global role at issue time (snapshot, informational)
    pub role: GlobalRole,

    /// Issuer - always "taskhub"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Token type (custom claim)
    pub token_type: TokenType,
}

impl Claims {
    /// Creates claims with the default expiration for the token type
    pub fn new(user_id: Uuid, username: &str, role: GlobalRole, token_type: TokenType) -> Self {
        Self::with_expiration(user_id, username, role, token_type, token_type.default_expiration())
    }

    /// Creates claims with a custom expiration
    pub fn with_expiration(
        user_id: Uuid,
        username: &str,
        role: GlobalRole,
        token_type: TokenType,
        expires_in: Duration,
    ) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            username: username.to_string(),
            role,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + expires_in).timestamp(),
            token_type,
        }
    }

    /// Checks whether the expiration has already elapsed
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Creates a signed token from claims
///
/// # Errors
///
/// Returns `JwtError::CreateError` if encoding fails.
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Verifies a token and extracts its claims
///
/// Checks the signature, expiration, and issuer. Absent input is the
/// caller's precondition — this function is never handed "no token".
///
/// # Errors
///
/// - `JwtError::Expired` when the expiration has elapsed
/// - `JwtError::Invalid` for signature mismatches, wrong issuer, or a
///   structurally malformed token
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        _ => JwtError::Invalid(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}

/// Verifies a token and checks it is an access token
pub fn validate_access_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let claims = validate_token(token, secret)?;

    if claims.token_type != TokenType::Access {
        return Err(JwtError::Invalid(
            "Expected access token, got refresh token".to_string(),
        ));
    }

    Ok(claims)
}

/// Verifies a token and checks it is a refresh token
pub fn validate_refresh_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let claims = validate_token(token, secret)?;

    if claims.token_type != TokenType::Refresh {
        return Err(JwtError::Invalid(
            "Expected refresh token, got access token".to_string(),
        ));
    }

    Ok(claims)
}

/// Mints a new access token from a valid refresh token
///
/// The new token carries the same identity and role snapshot as the
/// refresh token it was exchanged for.
pub fn refresh_access_token(refresh_token: &str, secret: &str) -> Result<String, JwtError> {
    let refresh_claims = validate_refresh_token(refresh_token, secret)?;

    let access_claims = Claims::new(
        refresh_claims.sub,
        &refresh_claims.username,
        refresh_claims.role,
        TokenType::Access,
    );

    create_token(&access_claims, secret)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_token_type_expiration() {
        assert_eq!(TokenType::Access.default_expiration(), Duration::hours(1));
        assert_eq!(TokenType::Refresh.default_expiration(), Duration::days(30));
    }

    #[test]
    fn test_claims_creation() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, "alice", GlobalRole::User, TokenType::Access);

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.role, GlobalRole::User);
        assert_eq!(claims.iss, "taskhub");
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_create_and_validate_token() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, "alice", GlobalRole::TeamAdmin, TokenType::Access);
        let token = create_token(&claims, SECRET).expect("Should create token");

        let validated = validate_token(&token, SECRET).expect("Should validate token");
        assert_eq!(validated.sub, user_id);
        assert_eq!(validated.username, "alice");
        assert_eq!(validated.role, GlobalRole::TeamAdmin);
        assert_eq!(validated.token_type, TokenType::Access);
    }

    #[test]
    fn test_validate_with_wrong_secret() {
        let claims = Claims::new(Uuid::new_v4(), "alice", GlobalRole::User, TokenType::Access);
        let token = create_token(&claims, SECRET).expect("Should create token");

        let result = validate_token(&token, "a-completely-different-32-byte-secret");
        assert!(matches!(result, Err(JwtError::Invalid(_))));
    }

    #[test]
    fn test_validate_expired_token() {
        let claims = Claims::with_expiration(
            Uuid::new_v4(),
            "alice",
            GlobalRole::User,
            TokenType::Access,
            Duration::seconds(-3600),
        );

        assert!(claims.is_expired());

        let token = create_token(&claims, SECRET).expect("Should create token");
        let result = validate_token(&token, SECRET);

        assert!(matches!(result, Err(JwtError::Expired)));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let claims = Claims::new(Uuid::new_v4(), "alice", GlobalRole::User, TokenType::Access);
        let token = create_token(&claims, SECRET).expect("Should create token");

        // Swap the payload segment for garbage; the signature no longer matches
        let mut parts: Vec<&str> = token.split('.').collect();
        assert_eq!(parts.len(), 3);
        parts[1] = "eyJmb3JnZWQiOnRydWV9";
        let tampered = parts.join(".");

        let result = validate_token(&tampered, SECRET);
        assert!(matches!(result, Err(JwtError::Invalid(_))));
    }

    #[test]
    fn test_structurally_malformed_token_rejected() {
        assert!(matches!(
            validate_token("not-a-jwt-at-all", SECRET),
            Err(JwtError::Invalid(_))
        ));
        assert!(matches!(validate_token("", SECRET), Err(JwtError::Invalid(_))));
    }

    #[test]
    fn test_token_type_checks() {
        let access = create_token(
            &Claims::new(Uuid::new_v4(), "a", GlobalRole::User, TokenType::Access),
            SECRET,
        )
        .unwrap();
        let refresh = create_token(
            &Claims::new(Uuid::new_v4(), "a", GlobalRole::User, TokenType::Refresh),
            SECRET,
        )
        .unwrap();

        assert!(validate_access_token(&access, SECRET).is_ok());
        assert!(validate_access_token(&refresh, SECRET).is_err());
        assert!(validate_refresh_token(&refresh, SECRET).is_ok());
        assert!(validate_refresh_token(&access, SECRET).is_err());
    }

    #[test]
    fn test_refresh_access_token() {
        let user_id = Uuid::new_v4();
        let refresh_claims = Claims::new(user_id, "alice", GlobalRole::User, TokenType::Refresh);
        let refresh_token = create_token(&refresh_claims, SECRET).unwrap();

        let new_access = refresh_access_token(&refresh_token, SECRET).unwrap();
        let validated = validate_access_token(&new_access, SECRET).unwrap();
        assert_eq!(validated.sub, user_id);
        assert_eq!(validated.token_type, TokenType::Access);
    }

    #[test]
    fn test_refresh_with_access_token_fails() {
        let access_claims = Claims::new(Uuid::new_v4(), "alice", GlobalRole::User, TokenType::Access);
        let access_token = create_token(&access_claims, SECRET).unwrap();

        assert!(refresh_access_token(&access_token, SECRET).is_err());
    }
}
