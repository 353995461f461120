//! Idempotent handling of transfer requests.
//!
//! A request's idempotency key is reserved before any money moves. The
//! outcome of the first attempt is written back under the key, and every
//! later request with the same key gets that outcome instead of a new transfer.

use std::sync::Arc;

use uuid::Uuid;

use super::transfer_service::TransferService;
use crate::error::AppError;
use crate::models::idempotency::TransferStatus;
use crate::models::transfer::{TransferOutcome, TransferRequest};
use crate::repositories::{IdempotencyRepository, TransferRepository};

#[derive(Clone)]
pub struct TransferOrchestrator {
    transfer_service: TransferService,
    idempotency: Arc<dyn IdempotencyRepository>,
    transfers: Arc<dyn TransferRepository>,
}

impl TransferOrchestrator {
    pub fn new(
        transfer_service: TransferService,
        idempotency: Arc<dyn IdempotencyRepository>,
        transfers: Arc<dyn TransferRepository>,
    ) -> Self {
        Self {
            transfer_service,
            idempotency,
            transfers,
        }
    }

    /// Handle a transfer request at most once per idempotency key.
    ///
    /// # Returns
    ///
    /// - The stored status if the key was seen before
    /// - `COMPLETED` with the new transfer's id on success
    /// - `BAD_REQUEST` with the reason if the request was rejected
    ///
    /// # Errors
    ///
    /// Any other failure marks the key `FAILED` and is returned as is.
    pub async fn handle(
        &self,
        idempotency_key: Uuid,
        request: TransferRequest,
    ) -> Result<TransferOutcome, AppError> {
        if !self.idempotency.reserve(idempotency_key).await? {
            return self.replay(idempotency_key).await;
        }

        let result = self
            .transfer_service
            .transfer(idempotency_key, request.from, request.to, request.balance())
            .await;

        match result {
            Ok(transfer) => {
                if let Err(mark_err) = self
                    .idempotency
                    .set_status(idempotency_key, TransferStatus::Completed)
                    .await
                {
                    tracing::error!(
                        %idempotency_key,
                        transfer_id = %transfer.id,
                        error = %mark_err,
                        "transfer committed but could not be marked completed"
                    );
                    return Err(mark_err);
                }
                Ok(TransferOutcome::completed(transfer.id))
            }
            Err(e) if e.is_bad_request() => {
                tracing::info!(%idempotency_key, reason = %e, "transfer rejected");
                self.idempotency
                    .set_status(idempotency_key, TransferStatus::BadRequest)
                    .await?;
                Ok(TransferOutcome::rejected(e.to_string()))
            }
            Err(e) => {
                tracing::debug!(
                    "Failed to transfer {} from {} to {}: {}",
                    request.balance(),
                    request.from,
                    request.to,
                    e
                );
                if let Err(mark_err) = self
                    .idempotency
                    .set_status(idempotency_key, TransferStatus::Failed)
                    .await
                {
                    tracing::warn!(%idempotency_key, error = %mark_err, "could not mark transfer as failed");
                }
                Err(e)
            }
        }
    }

    async fn replay(&self, idempotency_key: Uuid) -> Result<TransferOutcome, AppError> {
        let status = self
            .idempotency
            .find_status(idempotency_key)
            .await?
            .ok_or_else(|| {
                AppError::Internal(format!(
                    "idempotency key {idempotency_key} is reserved but has no status"
                ))
            })?;

        let transfer_id = match status {
            TransferStatus::Completed => self
                .transfers
                .find_by_idempotency_key(idempotency_key)
                .await?
                .map(|t| t.id),
            _ => None,
        };

        tracing::info!(%idempotency_key, ?status, "replaying transfer outcome");
        Ok(TransferOutcome::replayed(status, transfer_id))
    }
}
