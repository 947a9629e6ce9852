use axum::{
    extract::Request,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use thiserror::Error;
use tracing::warn;

/// Header the edge sets with the shared secret
pub const ORIGIN_VERIFY_HEADER: &str = "x-origin-verify";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("origin token header missing")]
    MissingToken,
    #[error("origin token mismatch")]
    InvalidToken,
}

/// Checks that a request came through the edge by comparing the shared secret
pub struct OriginGate {
    expected_token: Vec<u8>,
}

impl OriginGate {
    pub fn new(expected_token: impl Into<String>) -> Self {
        Self {
            expected_token: expected_token.into().into_bytes(),
        }
    }

    /// Byte-exact, constant-time comparison of the origin token
    pub fn verify(&self, headers: &HeaderMap) -> Result<(), AuthError> {
        let token = headers
            .get(ORIGIN_VERIFY_HEADER)
            .ok_or(AuthError::MissingToken)?;

        if bool::from(token.as_bytes().ct_eq(&self.expected_token)) {
            Ok(())
        } else {
            Err(AuthError::InvalidToken)
        }
    }
}

#[derive(Serialize)]
pub struct ForbiddenResponse {
    pub message: &'static str,
}

pub fn forbidden() -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(ForbiddenResponse {
            message: "Forbidden: Invalid Origin Token",
        }),
    )
        .into_response()
}

pub async fn origin_middleware(
    gate: Arc<OriginGate>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Response {
    match gate.verify(&headers) {
        Ok(()) => next.run(request).await,
        Err(err) => {
            warn!(reason = %err, "rejected request without a valid origin token");
            forbidden()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(token: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ORIGIN_VERIFY_HEADER, HeaderValue::from_static(token));
        headers
    }

    #[test]
    fn test_accepts_matching_token() {
        let gate = OriginGate::new("s3cret");
        assert_eq!(gate.verify(&headers_with("s3cret")), Ok(()));
    }

    #[test]
    fn test_rejects_missing_token() {
        let gate = OriginGate::new("s3cret");
        assert_eq!(gate.verify(&HeaderMap::new()), Err(AuthError::MissingToken));
    }

    #[test]
    fn test_value_comparison_is_byte_exact() {
        let gate = OriginGate::new("s3cret");
        assert_eq!(gate.verify(&headers_with("S3CRET")), Err(AuthError::InvalidToken));
        assert_eq!(gate.verify(&headers_with("s3cret ")), Err(AuthError::InvalidToken));
        assert_eq!(gate.verify(&headers_with("s3cre")), Err(AuthError::InvalidToken));
    }
}
