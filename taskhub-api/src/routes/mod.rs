/// Request handlers
///
/// Each submodule covers one resource. Handlers extract the authenticated
/// identity from the [`CurrentUser`](taskhub_shared::auth::middleware::CurrentUser)
/// extension the middleware adds, load the target and the caller's
/// membership, and hand both to the access evaluator before touching data.

use axum::http::HeaderMap;

pub mod auth;
pub mod comments;
pub mod health;
pub mod logs;
pub mod tasks;
pub mod teams;
pub mod users;

/// Client address for activity logging
///
/// Takes the first entry of `X-Forwarded-For` when the API sits behind a
/// proxy. Spoofable by direct callers, so only used for audit context,
/// never for authorization.
pub(crate) fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_client_ip_takes_first_forwarded_entry() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        assert_eq!(client_ip(&headers), Some("203.0.113.7".to_string()));
    }

    #[test]
    fn test_client_ip_absent() {
        assert_eq!(client_ip(&HeaderMap::new()), None);
    }
}
