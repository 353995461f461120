//! Transfer service - validation and atomic execution of transfers.
//!
//! # Process
//!
//! 1. Validate the request and convert the amount into both account currencies
//! 2. Hand the resulting posting to the repository, which locks both accounts,
//!    re-checks the sender's balance and applies everything in one unit

use std::sync::Arc;

use rust_decimal::{Decimal, RoundingStrategy};
use uuid::Uuid;

use super::exchange_service::{ExchangeService, RATE_SCALE};
use crate::error::AppError;
use crate::models::account::{Account, Balance};
use crate::models::transfer::{NewTransfer, Transfer};
use crate::repositories::{AccountRepository, TransferRepository};

/// Accounts and converted amounts of a transfer that passed validation.
#[derive(Debug, Clone)]
pub struct TransferValidation {
    pub from: Account,
    pub to: Account,
    /// Amount to take from `from`, in its currency
    pub balance_to_deduct: Balance,
    /// Amount to give to `to`, in its currency
    pub balance_to_add: Balance,
}

#[derive(Clone)]
pub struct TransferValidator {
    accounts: Arc<dyn AccountRepository>,
    exchange: ExchangeService,
}

impl TransferValidator {
    pub fn new(accounts: Arc<dyn AccountRepository>, exchange: ExchangeService) -> Self {
        Self { accounts, exchange }
    }

    /// Check that `balance` can move from `from_id` to `to_id`.
    ///
    /// # Errors
    ///
    /// In order of evaluation:
    /// - `NegativeTransfer`: amount below zero
    /// - `SameAccountTransfer`: sender and recipient are the same
    /// - `AccountNotFound`: sender, then recipient, does not exist
    /// - `InsufficientFunds`: sender cannot cover the converted amount
    /// - `ExchangeUnavailable`: a rate could not be obtained
    pub async fn validate(
        &self,
        from_id: Uuid,
        to_id: Uuid,
        balance: Balance,
    ) -> Result<TransferValidation, AppError> {
        if balance.amount < Decimal::ZERO {
            return Err(AppError::NegativeTransfer);
        }
        if from_id == to_id {
            return Err(AppError::SameAccountTransfer);
        }

        let from = self.account_exists(from_id).await?;
        let to = self.account_exists(to_id).await?;

        let balance_to_deduct = round(self.exchange.exchange_to(balance, from.currency).await?);
        if balance_to_deduct.amount > from.balance {
            return Err(AppError::InsufficientFunds);
        }

        let balance_to_add = round(self.exchange.exchange_to(balance, to.currency).await?);

        Ok(TransferValidation {
            from,
            to,
            balance_to_deduct,
            balance_to_add,
        })
    }

    async fn account_exists(&self, id: Uuid) -> Result<Account, AppError> {
        self.accounts
            .find_by_id(id)
            .await?
            .ok_or(AppError::AccountNotFound(id))
    }
}

/// Converted amounts are stored with the same scale as the database columns.
fn round(balance: Balance) -> Balance {
    Balance::new(
        balance
            .amount
            .round_dp_with_strategy(RATE_SCALE, RoundingStrategy::MidpointAwayFromZero),
        balance.currency,
    )
}

#[derive(Clone)]
pub struct TransferService {
    validator: TransferValidator,
    transfers: Arc<dyn TransferRepository>,
}

impl TransferService {
    pub fn new(validator: TransferValidator, transfers: Arc<dyn TransferRepository>) -> Self {
        Self {
            validator,
            transfers,
        }
    }

    /// Move `balance` from `from_id` to `to_id`, recording it under `idempotency_key`.
    ///
    /// The sender is debited in its own currency and the recipient credited in
    /// its own currency; the recorded transfer keeps the requested balance.
    pub async fn transfer(
        &self,
        idempotency_key: Uuid,
        from_id: Uuid,
        to_id: Uuid,
        balance: Balance,
    ) -> Result<Transfer, AppError> {
        let validation = self.validator.validate(from_id, to_id, balance).await?;

        let transfer = self
            .transfers
            .execute(NewTransfer {
                idempotency_key,
                sender_id: validation.from.id,
                recipient_id: validation.to.id,
                debit: validation.balance_to_deduct.amount,
                credit: validation.balance_to_add.amount,
                requested: balance,
            })
            .await?;

        tracing::info!(
            transfer_id = %transfer.id,
            from = %from_id,
            to = %to_id,
            requested = %balance,
            debited = %validation.balance_to_deduct,
            credited = %validation.balance_to_add,
            "transfer executed"
        );

        Ok(transfer)
    }
}
