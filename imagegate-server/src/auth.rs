//! Bearer-token authorization for the admin endpoints.

use axum::http::{header, HeaderMap};

use crate::error::ServerError;

/// Check the `Authorization: Bearer <token>` header against `expected`.
///
/// A missing header, another scheme, a wrong token, or no configured token
/// are all refused the same way.
pub fn authorize(headers: &HeaderMap, expected: Option<&str>) -> Result<(), ServerError> {
    let expected = expected.ok_or(ServerError::Unauthorized)?;
    let provided = bearer_token(headers).ok_or(ServerError::Unauthorized)?;

    if constant_time_eq(provided.as_bytes(), expected.as_bytes()) {
        Ok(())
    } else {
        Err(ServerError::Unauthorized)
    }
}

/// Extract the token from an `Authorization: Bearer` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Compare two byte strings in time independent of where they differ
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_valid_token() {
        assert!(authorize(&headers("Bearer s3cret"), Some("s3cret")).is_ok());
        assert!(authorize(&headers("bearer s3cret"), Some("s3cret")).is_ok());
    }

    #[test]
    fn test_wrong_token() {
        assert!(authorize(&headers("Bearer s3cre7"), Some("s3cret")).is_err());
        assert!(authorize(&headers("Bearer s3cret-longer"), Some("s3cret")).is_err());
    }

    #[test]
    fn test_missing_or_malformed_header() {
        assert!(authorize(&HeaderMap::new(), Some("s3cret")).is_err());
        assert!(authorize(&headers("Basic s3cret"), Some("s3cret")).is_err());
        assert!(authorize(&headers("Bearer "), Some("s3cret")).is_err());
        assert!(authorize(&headers("s3cret"), Some("s3cret")).is_err());
    }

    #[test]
    fn test_no_configured_token_refuses_everything() {
        assert!(matches!(
            authorize(&headers("Bearer anything"), None),
            Err(ServerError::Unauthorized)
        ));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"ab"));
        assert!(constant_time_eq(b"", b""));
    }
}
