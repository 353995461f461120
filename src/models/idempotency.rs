//! Idempotency records guarding transfer requests.
//!
//! Every transfer request carries a client-chosen key. The first request
//! reserves the key as `PROCESSING`; the final outcome is written back so
//! retries replay it instead of moving money again.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of a transfer request, keyed by its idempotency key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "transfer_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferStatus {
    /// Key reserved, transfer not finished yet
    Processing,
    /// Money moved and the transfer is recorded
    Completed,
    /// Request rejected; it will never succeed as sent
    BadRequest,
    /// Transfer aborted by an unexpected error
    Failed,
}

/// Represents a row of the `idempotency` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Idempotency {
    pub id: Uuid,

    /// Client-supplied key, unique across all requests
    pub idempotency_key: Uuid,

    pub status: TransferStatus,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}
