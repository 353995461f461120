//! Storage ports used by the services.
//!
//! Each trait has two implementations:
//! - [`postgres`]: sqlx queries against PostgreSQL
//! - [`in_memory`]: a process-local store behind a `tokio` lock

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::account::{Account, Balance};
use crate::models::idempotency::TransferStatus;
use crate::models::page::{Page, PageRequest};
use crate::models::transfer::{NewTransfer, Transfer};

pub mod in_memory;
pub mod postgres;

#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Persist a new account holding `balance`.
    async fn create(&self, balance: Balance) -> Result<Account, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, AppError>;

    /// All accounts, newest first.
    async fn list(&self) -> Result<Vec<Account>, AppError>;

    /// Verify the backing store answers.
    async fn ping(&self) -> Result<(), AppError>;
}

#[async_trait]
pub trait TransferRepository: Send + Sync {
    /// Apply a validated transfer.
    ///
    /// Debits the sender, credits the recipient and records the transfer
    /// atomically. The sender's balance is checked again while the accounts
    /// are locked.
    ///
    /// # Errors
    ///
    /// - `AccountNotFound` if either account disappeared
    /// - `InsufficientFunds` if the sender can no longer cover the debit
    async fn execute(&self, transfer: NewTransfer) -> Result<Transfer, AppError>;

    async fn find_by_idempotency_key(&self, key: Uuid) -> Result<Option<Transfer>, AppError>;

    /// Completed transfers ordered by creation time, then id.
    async fn find_page(&self, request: PageRequest) -> Result<Page<Transfer>, AppError>;
}

#[async_trait]
pub trait IdempotencyRepository: Send + Sync {
    /// Claim `key` as `PROCESSING`.
    ///
    /// Returns `false` if the key was already claimed. Only one of several
    /// concurrent callers for the same key gets `true`.
    async fn reserve(&self, key: Uuid) -> Result<bool, AppError>;

    async fn find_status(&self, key: Uuid) -> Result<Option<TransferStatus>, AppError>;

    async fn set_status(&self, key: Uuid, status: TransferStatus) -> Result<(), AppError>;
}
