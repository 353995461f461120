//! In-memory storage backend.
//!
//! Accounts, transfers and idempotency records share one `tokio` lock, so a
//! transfer's balance checks, updates and insert happen under a single write
//! guard. Used by `STORAGE_BACKEND=memory` and by the test suite.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AccountRepository, IdempotencyRepository, TransferRepository};
use crate::error::AppError;
use crate::models::account::{Account, BALANCE_LIMIT, Balance};
use crate::models::idempotency::{Idempotency, TransferStatus};
use crate::models::page::{Page, PageRequest};
use crate::models::transfer::{NewTransfer, Transfer};

#[derive(Default)]
struct State {
    accounts: HashMap<Uuid, Account>,
    /// Kept in insertion order, which is also `created_at` order
    transfers: Vec<Transfer>,
    idempotency: HashMap<Uuid, Idempotency>,
}

/// A thread-safe in-memory store implementing every repository trait.
///
/// Clones share the same underlying data.
#[derive(Default, Clone)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountRepository for InMemoryStore {
    async fn create(&self, balance: Balance) -> Result<Account, AppError> {
        let now = Utc::now();
        let account = Account {
            id: Uuid::new_v4(),
            balance: balance.amount,
            currency: balance.currency,
            created_at: now,
            updated_at: now,
        };

        let mut state = self.state.write().await;
        state.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, AppError> {
        let state = self.state.read().await;
        Ok(state.accounts.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Account>, AppError> {
        let state = self.state.read().await;
        let mut accounts: Vec<Account> = state.accounts.values().cloned().collect();
        accounts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(accounts)
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}

#[async_trait]
impl TransferRepository for InMemoryStore {
    async fn execute(&self, transfer: NewTransfer) -> Result<Transfer, AppError> {
        let mut state = self.state.write().await;

        if state
            .transfers
            .iter()
            .any(|t| t.idempotency_key == transfer.idempotency_key)
        {
            return Err(AppError::Internal(format!(
                "transfer with idempotency key {} already recorded",
                transfer.idempotency_key
            )));
        }

        let sender_balance = state
            .accounts
            .get(&transfer.sender_id)
            .map(|a| a.balance)
            .ok_or(AppError::AccountNotFound(transfer.sender_id))?;
        if !state.accounts.contains_key(&transfer.recipient_id) {
            return Err(AppError::AccountNotFound(transfer.recipient_id));
        }
        if sender_balance < transfer.debit {
            return Err(AppError::InsufficientFunds);
        }

        // Both new balances are computed before either account is touched
        let sender_after = sender_balance
            .checked_sub(transfer.debit)
            .ok_or(AppError::InsufficientFunds)?;
        let recipient_after = state
            .accounts
            .get(&transfer.recipient_id)
            .and_then(|a| a.balance.checked_add(transfer.credit))
            .filter(|balance| *balance < BALANCE_LIMIT)
            .ok_or_else(|| {
                AppError::InvalidRequest(format!(
                    "balance of account {} would exceed the supported limit",
                    transfer.recipient_id
                ))
            })?;

        let now = Utc::now();
        if let Some(sender) = state.accounts.get_mut(&transfer.sender_id) {
            sender.balance = sender_after;
            sender.updated_at = now;
        }
        if let Some(recipient) = state.accounts.get_mut(&transfer.recipient_id) {
            recipient.balance = recipient_after;
            recipient.updated_at = now;
        }

        let recorded = Transfer {
            id: Uuid::new_v4(),
            idempotency_key: transfer.idempotency_key,
            sender_id: transfer.sender_id,
            recipient_id: transfer.recipient_id,
            amount: transfer.requested.amount,
            currency: transfer.requested.currency,
            created_at: now,
        };
        state.transfers.push(recorded.clone());

        Ok(recorded)
    }

    async fn find_by_idempotency_key(&self, key: Uuid) -> Result<Option<Transfer>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .transfers
            .iter()
            .find(|t| t.idempotency_key == key)
            .cloned())
    }

    async fn find_page(&self, request: PageRequest) -> Result<Page<Transfer>, AppError> {
        let state = self.state.read().await;
        let offset = usize::try_from(request.offset()).unwrap_or(usize::MAX);
        let content = state
            .transfers
            .iter()
            .skip(offset)
            .take(request.page_size as usize)
            .cloned()
            .collect();
        Ok(Page::new(content, request, state.transfers.len() as u64))
    }
}

#[async_trait]
impl IdempotencyRepository for InMemoryStore {
    async fn reserve(&self, key: Uuid) -> Result<bool, AppError> {
        let mut state = self.state.write().await;
        if state.idempotency.contains_key(&key) {
            return Ok(false);
        }

        let now = Utc::now();
        state.idempotency.insert(
            key,
            Idempotency {
                id: Uuid::new_v4(),
                idempotency_key: key,
                status: TransferStatus::Processing,
                created_at: now,
                updated_at: now,
            },
        );
        Ok(true)
    }

    async fn find_status(&self, key: Uuid) -> Result<Option<TransferStatus>, AppError> {
        let state = self.state.read().await;
        Ok(state.idempotency.get(&key).map(|r| r.status))
    }

    async fn set_status(&self, key: Uuid, status: TransferStatus) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        if let Some(record) = state.idempotency.get_mut(&key) {
            record.status = status;
            record.updated_at = Utc::now();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::account::Currency;
    use rust_decimal_macros::dec;

    fn posting(key: Uuid, from: Uuid, to: Uuid, debit: rust_decimal::Decimal) -> NewTransfer {
        NewTransfer {
            idempotency_key: key,
            sender_id: from,
            recipient_id: to,
            debit,
            credit: debit,
            requested: Balance::new(debit, Currency::Eur),
        }
    }

    #[tokio::test]
    async fn created_account_can_be_fetched() {
        let store = InMemoryStore::new();
        let created = store
            .create(Balance::new(dec!(100), Currency::Eur))
            .await
            .unwrap();

        let fetched = store.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.balance, dec!(100));
        assert_eq!(fetched.currency, Currency::Eur);
        assert!(store.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn execute_moves_money_and_records_transfer() {
        let store = InMemoryStore::new();
        let sender = store.create(Balance::new(dec!(100), Currency::Eur)).await.unwrap();
        let recipient = store.create(Balance::new(dec!(50), Currency::Eur)).await.unwrap();
        let key = Uuid::new_v4();

        let transfer = store
            .execute(posting(key, sender.id, recipient.id, dec!(1)))
            .await
            .unwrap();

        assert_eq!(transfer.idempotency_key, key);
        assert_eq!(transfer.sender_id, sender.id);
        assert_eq!(transfer.recipient_id, recipient.id);
        assert_eq!(transfer.amount, dec!(1));
        assert_eq!(transfer.currency, Currency::Eur);

        let sender = store.find_by_id(sender.id).await.unwrap().unwrap();
        let recipient = store.find_by_id(recipient.id).await.unwrap().unwrap();
        assert_eq!(sender.balance, dec!(99));
        assert_eq!(recipient.balance, dec!(51));
        assert_eq!(
            store.find_by_idempotency_key(key).await.unwrap(),
            Some(transfer)
        );
    }

    #[tokio::test]
    async fn execute_rejects_duplicate_idempotency_key() {
        let store = InMemoryStore::new();
        let sender = store.create(Balance::new(dec!(100), Currency::Eur)).await.unwrap();
        let recipient = store.create(Balance::new(dec!(50), Currency::Eur)).await.unwrap();
        let key = Uuid::new_v4();
        store
            .execute(posting(key, sender.id, recipient.id, dec!(1)))
            .await
            .unwrap();

        let second = store
            .execute(posting(key, sender.id, recipient.id, dec!(2)))
            .await;

        assert!(second.is_err());
        let sender = store.find_by_id(sender.id).await.unwrap().unwrap();
        assert_eq!(sender.balance, dec!(99));
    }

    #[tokio::test]
    async fn execute_leaves_balances_untouched_on_insufficient_funds() {
        let store = InMemoryStore::new();
        let sender = store.create(Balance::new(dec!(10), Currency::Eur)).await.unwrap();
        let recipient = store.create(Balance::new(dec!(0), Currency::Eur)).await.unwrap();

        let result = store
            .execute(posting(Uuid::new_v4(), sender.id, recipient.id, dec!(10.01)))
            .await;

        assert!(matches!(result, Err(AppError::InsufficientFunds)));
        let recipient = store.find_by_id(recipient.id).await.unwrap().unwrap();
        assert_eq!(recipient.balance, dec!(0));
        assert_eq!(
            store
                .find_page(PageRequest::new(0, 10).unwrap())
                .await
                .unwrap()
                .total_elements,
            0
        );
    }

    #[tokio::test]
    async fn credit_past_the_balance_limit_changes_nothing() {
        let store = InMemoryStore::new();
        let sender = store.create(Balance::new(dec!(100), Currency::Eur)).await.unwrap();
        let recipient = store
            .create(Balance::new(rust_decimal::Decimal::MAX, Currency::Eur))
            .await
            .unwrap();

        let result = store
            .execute(posting(Uuid::new_v4(), sender.id, recipient.id, dec!(1)))
            .await;

        assert!(matches!(result, Err(AppError::InvalidRequest(_))));
        let sender = store.find_by_id(sender.id).await.unwrap().unwrap();
        let recipient = store.find_by_id(recipient.id).await.unwrap().unwrap();
        assert_eq!(sender.balance, dec!(100));
        assert_eq!(recipient.balance, rust_decimal::Decimal::MAX);
        assert_eq!(
            store
                .find_page(PageRequest::new(0, 10).unwrap())
                .await
                .unwrap()
                .total_elements,
            0
        );
    }

    #[tokio::test]
    async fn zero_amount_is_recorded_without_moving_money() {
        let store = InMemoryStore::new();
        let sender = store.create(Balance::new(dec!(100), Currency::Eur)).await.unwrap();
        let recipient = store.create(Balance::new(dec!(50), Currency::Eur)).await.unwrap();
        let key = Uuid::new_v4();

        let transfer = store
            .execute(posting(key, sender.id, recipient.id, dec!(0)))
            .await
            .unwrap();

        assert_eq!(transfer.amount, dec!(0));
        assert_eq!(store.find_by_id(sender.id).await.unwrap().unwrap().balance, dec!(100));
        assert_eq!(store.find_by_id(recipient.id).await.unwrap().unwrap().balance, dec!(50));
        assert_eq!(store.find_by_idempotency_key(key).await.unwrap(), Some(transfer));
    }

    #[tokio::test]
    async fn list_returns_newest_account_first() {
        let store = InMemoryStore::new();
        let mut created = Vec::new();
        for _ in 0..3 {
            created.push(store.create(Balance::new(dec!(1), Currency::Usd)).await.unwrap());
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }

        let listed: Vec<Uuid> = store.list().await.unwrap().iter().map(|a| a.id).collect();

        let expected: Vec<Uuid> = created.iter().rev().map(|a| a.id).collect();
        assert_eq!(listed, expected);
    }

    #[tokio::test]
    async fn reserve_is_first_come_first_served() {
        let store = InMemoryStore::new();
        let key = Uuid::new_v4();

        assert!(store.reserve(key).await.unwrap());
        assert!(!store.reserve(key).await.unwrap());
        assert_eq!(
            store.find_status(key).await.unwrap(),
            Some(TransferStatus::Processing)
        );
    }

    #[tokio::test]
    async fn set_status_overwrites_reservation() {
        let store = InMemoryStore::new();
        let key = Uuid::new_v4();
        store.reserve(key).await.unwrap();

        store
            .set_status(key, TransferStatus::Completed)
            .await
            .unwrap();

        assert_eq!(
            store.find_status(key).await.unwrap(),
            Some(TransferStatus::Completed)
        );
        assert_eq!(store.find_status(Uuid::new_v4()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn pages_follow_insertion_order() {
        let store = InMemoryStore::new();
        let sender = store.create(Balance::new(dec!(100), Currency::Eur)).await.unwrap();
        let recipient = store.create(Balance::new(dec!(0), Currency::Eur)).await.unwrap();
        for n in 1..=5 {
            store
                .execute(posting(
                    Uuid::new_v4(),
                    sender.id,
                    recipient.id,
                    rust_decimal::Decimal::from(n),
                ))
                .await
                .unwrap();
        }

        let page = store
            .find_page(PageRequest::new(1, 2).unwrap())
            .await
            .unwrap();

        let amounts: Vec<_> = page.content.iter().map(|t| t.amount).collect();
        assert_eq!(amounts, vec![dec!(3), dec!(4)]);
        assert_eq!(page.total_elements, 5);
        assert_eq!(page.total_pages, 3);
    }
}
