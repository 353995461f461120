//! PostgreSQL repositories.
//!
//! # Atomicity Guarantees
//!
//! Transfers run inside one PostgreSQL transaction. Both account rows are
//! locked with `FOR UPDATE` in id order, so two opposite transfers between
//! the same accounts cannot deadlock.

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::{AccountRepository, IdempotencyRepository, TransferRepository};
use crate::db::DbPool;
use crate::error::AppError;
use crate::models::account::{Account, Balance};
use crate::models::idempotency::{Idempotency, TransferStatus};
use crate::models::page::{Page, PageRequest};
use crate::models::transfer::{NewTransfer, Transfer};

#[derive(Clone)]
pub struct PgAccountRepository {
    pool: DbPool,
}

impl PgAccountRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountRepository for PgAccountRepository {
    async fn create(&self, balance: Balance) -> Result<Account, AppError> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (balance, currency)
            VALUES ($1, $2)
            RETURNING id, balance, currency, created_at, updated_at
            "#,
        )
        .bind(balance.amount)
        .bind(balance.currency)
        .fetch_one(&self.pool)
        .await?;

        Ok(account)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<_, Account>(
            "SELECT id, balance, currency, created_at, updated_at FROM accounts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    async fn list(&self) -> Result<Vec<Account>, AppError> {
        let accounts = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, balance, currency, created_at, updated_at
            FROM accounts
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(accounts)
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct PgTransferRepository {
    pool: DbPool,
}

impl PgTransferRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransferRepository for PgTransferRepository {
    async fn execute(&self, transfer: NewTransfer) -> Result<Transfer, AppError> {
        let mut tx = self.pool.begin().await?;

        // ORDER BY id makes every transfer take its row locks in the same order
        let locked: Vec<(Uuid, Decimal)> = sqlx::query_as(
            "SELECT id, balance FROM accounts WHERE id = ANY($1) ORDER BY id FOR UPDATE",
        )
        .bind(vec![transfer.sender_id, transfer.recipient_id])
        .fetch_all(&mut *tx)
        .await?;

        let sender_balance = locked
            .iter()
            .find(|(id, _)| *id == transfer.sender_id)
            .map(|(_, balance)| *balance)
            .ok_or(AppError::AccountNotFound(transfer.sender_id))?;

        if !locked.iter().any(|(id, _)| *id == transfer.recipient_id) {
            return Err(AppError::AccountNotFound(transfer.recipient_id));
        }

        if sender_balance < transfer.debit {
            return Err(AppError::InsufficientFunds);
        }

        sqlx::query(
            "UPDATE accounts SET balance = balance - $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(transfer.debit)
        .bind(transfer.sender_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE accounts SET balance = balance + $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(transfer.credit)
        .bind(transfer.recipient_id)
        .execute(&mut *tx)
        .await?;

        let recorded = sqlx::query_as::<_, Transfer>(
            r#"
            INSERT INTO transfers (idempotency_key, sender_id, recipient_id, amount, currency)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, idempotency_key, sender_id, recipient_id, amount, currency, created_at
            "#,
        )
        .bind(transfer.idempotency_key)
        .bind(transfer.sender_id)
        .bind(transfer.recipient_id)
        .bind(transfer.requested.amount)
        .bind(transfer.requested.currency)
        .fetch_one(&mut *tx)
        .await?;

        // Dropping `tx` on an early return above rolls everything back
        tx.commit().await?;

        Ok(recorded)
    }

    async fn find_by_idempotency_key(&self, key: Uuid) -> Result<Option<Transfer>, AppError> {
        let transfer = sqlx::query_as::<_, Transfer>(
            r#"
            SELECT id, idempotency_key, sender_id, recipient_id, amount, currency, created_at
            FROM transfers
            WHERE idempotency_key = $1
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(transfer)
    }

    async fn find_page(&self, request: PageRequest) -> Result<Page<Transfer>, AppError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transfers")
            .fetch_one(&self.pool)
            .await?;

        let offset = i64::try_from(request.offset())
            .map_err(|_| AppError::InvalidRequest("page is out of range".to_string()))?;

        let transfers = sqlx::query_as::<_, Transfer>(
            r#"
            SELECT id, idempotency_key, sender_id, recipient_id, amount, currency, created_at
            FROM transfers
            ORDER BY created_at, id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(i64::from(request.page_size))
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(transfers, request, total.max(0) as u64))
    }
}

/// Idempotency keys, each statement committing on its own.
///
/// Reservation and status updates run outside the transfer's transaction,
/// so a rolled-back transfer still leaves its key marked.
#[derive(Clone)]
pub struct PgIdempotencyRepository {
    pool: DbPool,
}

impl PgIdempotencyRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdempotencyRepository for PgIdempotencyRepository {
    async fn reserve(&self, key: Uuid) -> Result<bool, AppError> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO idempotency (idempotency_key, status)
            VALUES ($1, $2)
            ON CONFLICT (idempotency_key) DO NOTHING
            "#,
        )
        .bind(key)
        .bind(TransferStatus::Processing)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(inserted == 1)
    }

    async fn find_status(&self, key: Uuid) -> Result<Option<TransferStatus>, AppError> {
        let record = sqlx::query_as::<_, Idempotency>(
            r#"
            SELECT id, idempotency_key, status, created_at, updated_at
            FROM idempotency
            WHERE idempotency_key = $1
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(|r| r.status))
    }

    async fn set_status(&self, key: Uuid, status: TransferStatus) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE idempotency SET status = $1, updated_at = NOW() WHERE idempotency_key = $2",
        )
        .bind(status)
        .bind(key)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
