//! Transfer HTTP handlers.
//!
//! This module implements transfer-related API endpoints:
//! - POST /api/transfers - Move money between accounts (idempotent)
//! - GET /api/transfers?page=&pageSize= - Page through completed transfers

use crate::{
    error::AppError,
    extract::IdempotencyKey,
    models::{
        idempotency::TransferStatus,
        page::{Page, PageQuery},
        transfer::{TransferRequest, TransferResponse, TransferView},
    },
    state::AppState,
};
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};

/// Transfer money between accounts.
///
/// # Headers
///
/// `X-Idempotency-Key: <uuid>` (required)
///
/// # Request Body
///
/// ```json
/// {
///   "from": "550e8400-...",
///   "to": "660e8400-...",
///   "amount": "75.00",
///   "currency": "EUR"
/// }
/// ```
///
/// # Response
///
/// | Status | Meaning |
/// |---|---|
/// | 201 | `COMPLETED`: money moved (now or by an earlier request with this key) |
/// | 409 | `PROCESSING`: an earlier request with this key is still running |
/// | 400 | `BAD_REQUEST`: rejected (unknown account, insufficient funds, ...) |
/// | 503 | `FAILED`: an earlier attempt with this key failed |
///
/// A first attempt that fails unexpectedly returns the error itself, e.g.
/// 503 `exchange_unavailable`.
pub async fn create_transfer(
    State(state): State<AppState>,
    IdempotencyKey(idempotency_key): IdempotencyKey,
    Json(request): Json<TransferRequest>,
) -> Result<(StatusCode, Json<TransferResponse>), AppError> {
    let outcome = state.orchestrator.handle(idempotency_key, request).await?;

    let status = match outcome.status {
        TransferStatus::Completed => StatusCode::CREATED,
        TransferStatus::Processing => StatusCode::CONFLICT,
        TransferStatus::BadRequest => StatusCode::BAD_REQUEST,
        TransferStatus::Failed => StatusCode::SERVICE_UNAVAILABLE,
    };

    Ok((status, Json(TransferResponse::new(idempotency_key, outcome))))
}

/// List completed transfers.
///
/// # Query Parameters
///
/// - `page`: zero-based page number (default 0)
/// - `pageSize`: 1 to 100
///
/// # Response (200)
///
/// ```json
/// {
///   "content": [
///     { "sender_id": "...", "recipient_id": "...", "amount": "75", "currency": "EUR" }
///   ],
///   "page": 0,
///   "page_size": 20,
///   "total_elements": 1,
///   "total_pages": 1
/// }
/// ```
pub async fn list_successful_transfers(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<TransferView>>, AppError> {
    let page = state
        .monitor
        .successful_transfers(query.page, query.page_size)
        .await?;

    Ok(Json(page))
}
