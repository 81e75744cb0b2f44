//! Caller identity extraction
//!
//! The identity is an opaque UTF-8 string taken from the `x-agent-id` header
//! and passed to the store for owner binding. It is not authenticated.

use crate::api::response::ApiError;
use agentpad_core::Error;
use axum::{extract::FromRequestParts, http::request::Parts};

/// Header carrying the caller identity
pub const CALLER_HEADER: &str = "x-agent-id";

/// Optional caller identity; absent or blank headers yield `None`.
/// A header that is not valid UTF-8 is rejected with 400.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallerId(pub Option<String>);

impl CallerId {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

#[async_trait::async_trait]
impl<S> FromRequestParts<S> for CallerId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(CALLER_HEADER) else {
            return Ok(CallerId(None));
        };
        // Any UTF-8, not just visible ASCII
        let value = std::str::from_utf8(value.as_bytes()).map_err(|_| {
            ApiError(Error::InvalidInput(format!(
                "{} header must be valid UTF-8",
                CALLER_HEADER
            )))
        })?;

        let caller = Some(value.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string);
        Ok(CallerId(caller))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, Request, StatusCode};

    async fn extract_raw(header: Option<HeaderValue>) -> Result<CallerId, ApiError> {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(CALLER_HEADER, value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        CallerId::from_request_parts(&mut parts, &()).await
    }

    async fn extract(header: Option<&str>) -> CallerId {
        let value = header.map(|h| HeaderValue::from_bytes(h.as_bytes()).unwrap());
        extract_raw(value).await.unwrap()
    }

    #[tokio::test]
    async fn test_caller_header() {
        assert_eq!(extract(Some("alice")).await.as_deref(), Some("alice"));
        assert_eq!(extract(Some("  bob ")).await.as_deref(), Some("bob"));
        assert_eq!(extract(Some("   ")).await, CallerId(None));
        assert_eq!(extract(None).await, CallerId(None));
        assert_eq!(extract(Some("ålice")).await.as_deref(), Some("ålice"));
        assert_eq!(extract(Some(" 代理-7 ")).await.as_deref(), Some("代理-7"));
    }

    #[tokio::test]
    async fn test_non_utf8_caller_rejected() {
        let value = HeaderValue::from_bytes(&[0x61, 0xff, 0x62]).unwrap();
        let err = extract_raw(Some(value)).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
