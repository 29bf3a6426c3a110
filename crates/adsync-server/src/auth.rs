//! Caller identity.
//!
//! Sessions are owned by the dashboard's session layer, which forwards the
//! authenticated user id in [`USER_HEADER`]. Every `/api` handler takes an
//! [`AuthUser`]; a request without the header is rejected with 401.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;

use crate::error::ServerError;

pub const USER_HEADER: &str = "x-user-id";

/// The authenticated user id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser(pub String);

impl AuthUser {
    pub fn id(&self) -> &str {
        &self.0
    }
}

/// User id carried by `headers`, if any.
pub fn user_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        user_from_headers(&parts.headers)
            .map(AuthUser)
            .ok_or(ServerError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_user_from_headers() {
        let mut headers = HeaderMap::new();
        assert_eq!(user_from_headers(&headers), None);

        headers.insert(USER_HEADER, HeaderValue::from_static("  "));
        assert_eq!(user_from_headers(&headers), None);

        headers.insert(USER_HEADER, HeaderValue::from_static("user-1"));
        assert_eq!(user_from_headers(&headers).as_deref(), Some("user-1"));
    }
}
