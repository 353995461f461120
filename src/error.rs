//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use uuid::Uuid;

/// Application-wide error type.
///
/// # Error Categories
///
/// - **Storage Errors**: Any sqlx::Error from database operations
/// - **Transfer Rejections**: Requests that can never succeed as sent
///   (see [`AppError::is_bad_request`])
/// - **Upstream Errors**: The exchange rate provider could not answer
/// - **Validation Errors**: Malformed request data
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed (e.g., connection error, query error).
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Referenced account does not exist.
    #[error("User with id='{0}' does not exist")]
    AccountNotFound(Uuid),

    /// Sender cannot cover the debit in its own currency.
    #[error("insufficient funds")]
    InsufficientFunds,

    /// Requested amount is below zero.
    #[error("negative transfer")]
    NegativeTransfer,

    /// Sender and recipient are the same account.
    #[error("cannot transfer to the same account")]
    SameAccountTransfer,

    /// Request body, headers or parameters are invalid.
    #[error("Invalid request")]
    InvalidRequest(String),

    /// Exchange rate provider failed or timed out.
    #[error("Exchange rate service unavailable: {0}")]
    ExchangeUnavailable(String),

    /// State that should be impossible was observed.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether the error rejects the transfer request itself.
    ///
    /// These outcomes are final: retrying with the same data fails the same way,
    /// so they are recorded as `BAD_REQUEST` rather than `FAILED`.
    pub fn is_bad_request(&self) -> bool {
        matches!(
            self,
            AppError::AccountNotFound(_)
                | AppError::InsufficientFunds
                | AppError::NegativeTransfer
                | AppError::SameAccountTransfer
        )
    }
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// All errors return JSON in this format:
/// ```json
/// {
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
///
/// # Status Code Mapping
///
/// - `AccountNotFound` → 404 Not Found
/// - `InsufficientFunds` → 422 Unprocessable Entity
/// - `NegativeTransfer`, `SameAccountTransfer`, `InvalidRequest` → 400 Bad Request
/// - `ExchangeUnavailable` → 503 Service Unavailable
/// - `Database`, `Internal` → 500 Internal Server Error (hides details from client)
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::AccountNotFound(_) => {
                (StatusCode::NOT_FOUND, "account_not_found", self.to_string())
            }
            AppError::InsufficientFunds => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "insufficient_funds",
                self.to_string(),
            ),
            AppError::NegativeTransfer => {
                (StatusCode::BAD_REQUEST, "negative_transfer", self.to_string())
            }
            AppError::SameAccountTransfer => {
                (StatusCode::BAD_REQUEST, "same_account", self.to_string())
            }
            AppError::InvalidRequest(ref msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", msg.clone())
            }
            AppError::ExchangeUnavailable(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "exchange_unavailable",
                "Exchange rate service unavailable".to_string(),
            ),
            AppError::Database(ref e) => {
                tracing::error!(error = %e, "database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
            AppError::Internal(ref msg) => {
                tracing::error!(error = %msg, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_rejections_are_bad_requests() {
        assert!(AppError::AccountNotFound(Uuid::new_v4()).is_bad_request());
        assert!(AppError::InsufficientFunds.is_bad_request());
        assert!(AppError::NegativeTransfer.is_bad_request());
        assert!(AppError::SameAccountTransfer.is_bad_request());
        assert!(!AppError::ExchangeUnavailable("down".into()).is_bad_request());
        assert!(!AppError::Internal("boom".into()).is_bad_request());
    }

    #[test]
    fn account_not_found_names_the_user() {
        let id = Uuid::nil();
        assert_eq!(
            AppError::AccountNotFound(id).to_string(),
            "User with id='00000000-0000-0000-0000-000000000000' does not exist"
        );
    }

    #[test]
    fn status_codes_follow_error_kind() {
        let cases = [
            (AppError::AccountNotFound(Uuid::nil()), StatusCode::NOT_FOUND),
            (AppError::InsufficientFunds, StatusCode::UNPROCESSABLE_ENTITY),
            (AppError::NegativeTransfer, StatusCode::BAD_REQUEST),
            (
                AppError::ExchangeUnavailable("timeout".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                AppError::Internal("missing".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }
}
