//! Request extractors.

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::error::AppError;

/// Header carrying the client-chosen key of a transfer request.
pub const IDEMPOTENCY_KEY_HEADER: &str = "X-Idempotency-Key";

/// The `X-Idempotency-Key` header parsed as a UUID.
///
/// Rejects the request with 400 if the header is missing or not a UUID.
#[derive(Debug, Clone, Copy)]
pub struct IdempotencyKey(pub Uuid);

impl<S> FromRequestParts<S> for IdempotencyKey
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(IDEMPOTENCY_KEY_HEADER)
            .ok_or_else(|| {
                AppError::InvalidRequest(format!("{IDEMPOTENCY_KEY_HEADER} header is required"))
            })?
            .to_str()
            .map_err(|_| {
                AppError::InvalidRequest(format!("{IDEMPOTENCY_KEY_HEADER} must be ASCII"))
            })?;

        let key = Uuid::parse_str(raw.trim()).map_err(|_| {
            AppError::InvalidRequest(format!("{IDEMPOTENCY_KEY_HEADER} must be a UUID"))
        })?;

        Ok(IdempotencyKey(key))
    }
}
