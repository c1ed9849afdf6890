//! Caller identity extractor

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{HeaderMap, request::Parts},
};

/// Header carrying the acting account id
pub const CALLER_ID_HEADER: &str = "x-user-id";

fn caller_id_from_headers(headers: &HeaderMap) -> Option<i64> {
    headers
        .get(CALLER_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.trim().parse::<i64>().ok())
        .filter(|id| *id > 0)
}

/// Account id the request claims to act as
///
/// Never rejects: a missing, malformed or non-positive header
/// yields `CallerId(None)` and the route's guard decides the error.
///
/// # Usage
/// ```ignore
/// async fn handler(caller: CallerId) -> Result<Json<..>, AppError> {
///     let caller_id = guard::require_caller(caller)?;
///     ...
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerId(pub Option<i64>);

#[async_trait]
impl<S> FromRequestParts<S> for CallerId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(CallerId(caller_id_from_headers(&parts.headers)))
    }
}
