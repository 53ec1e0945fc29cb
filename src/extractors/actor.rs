//! Extract the acting user from request (X-User-Id header), used for *_BY audit columns.

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};

/// Header name for the acting user. Default: `X-User-Id`.
pub const ACTOR_HEADER: &str = "X-User-Id";

/// Extractor for optional actor id from the `X-User-Id` header.
#[derive(Clone, Debug, Default)]
pub struct Actor(pub Option<String>);

#[async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(ACTOR_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        Ok(Actor(value))
    }
}
