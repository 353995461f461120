//! Transfer data models and API request/response types.
//!
//! This module defines:
//! - `Transfer`: Database entity for a completed transfer
//! - `NewTransfer`: A validated posting, ready to be applied atomically
//! - `TransferRequest` / `TransferResponse`: Body types of `POST /api/transfers`
//! - `TransferView`: Row of the completed-transfers listing

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::account::{Balance, Currency};
use super::idempotency::TransferStatus;

/// Represents a completed transfer from the database.
///
/// `amount` and `currency` are the values the client asked to send,
/// before any conversion into the sender's or recipient's currency.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize)]
pub struct Transfer {
    pub id: Uuid,

    /// Key of the request that produced this transfer (unique)
    pub idempotency_key: Uuid,

    pub sender_id: Uuid,

    pub recipient_id: Uuid,

    pub amount: Decimal,

    pub currency: Currency,

    pub created_at: DateTime<Utc>,
}

/// A validated transfer, expressed in each account's own currency.
///
/// # Atomicity Guarantee
///
/// Repositories apply the debit, the credit and the `Transfer` insert
/// in one unit: all of it commits or none of it does.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransfer {
    pub idempotency_key: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    /// Amount taken from the sender, in the sender's currency
    pub debit: Decimal,
    /// Amount given to the recipient, in the recipient's currency
    pub credit: Decimal,
    /// What the client asked to send
    pub requested: Balance,
}

/// Request to transfer money between accounts.
///
/// # JSON Example
///
/// ```json
/// {
///   "from": "550e8400-e29b-41d4-a716-446655440000",
///   "to": "660e8400-e29b-41d4-a716-446655440001",
///   "amount": "75.50",
///   "currency": "EUR"
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct TransferRequest {
    pub from: Uuid,
    pub to: Uuid,
    pub amount: Decimal,
    pub currency: Currency,
}

impl TransferRequest {
    pub fn balance(&self) -> Balance {
        Balance::new(self.amount, self.currency)
    }
}

/// Result of handling a transfer request.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferOutcome {
    pub status: TransferStatus,
    /// Set when the transfer is `COMPLETED`
    pub transfer_id: Option<Uuid>,
    /// Reason for a `BAD_REQUEST` seen on this attempt
    pub message: Option<String>,
}

impl TransferOutcome {
    pub fn completed(transfer_id: Uuid) -> Self {
        Self {
            status: TransferStatus::Completed,
            transfer_id: Some(transfer_id),
            message: None,
        }
    }

    pub fn rejected(message: String) -> Self {
        Self {
            status: TransferStatus::BadRequest,
            transfer_id: None,
            message: Some(message),
        }
    }

    pub fn replayed(status: TransferStatus, transfer_id: Option<Uuid>) -> Self {
        Self {
            status,
            transfer_id,
            message: None,
        }
    }
}

/// Response returned by `POST /api/transfers`.
///
/// # JSON Example
///
/// ```json
/// {
///   "idempotency_key": "4b1c...",
///   "status": "COMPLETED",
///   "transfer_id": "770e8400-e29b-41d4-a716-446655440002"
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct TransferResponse {
    pub idempotency_key: Uuid,
    pub status: TransferStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transfer_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl TransferResponse {
    pub fn new(idempotency_key: Uuid, outcome: TransferOutcome) -> Self {
        Self {
            idempotency_key,
            status: outcome.status,
            transfer_id: outcome.transfer_id,
            message: outcome.message,
        }
    }
}

/// A completed transfer as shown by the monitoring endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferView {
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub amount: Decimal,
    pub currency: Currency,
}

impl From<Transfer> for TransferView {
    fn from(transfer: Transfer) -> Self {
        Self {
            sender_id: transfer.sender_id,
            recipient_id: transfer.recipient_id,
            amount: transfer.amount.normalize(),
            currency: transfer.currency,
        }
    }
}
