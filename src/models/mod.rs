//! Data models representing database entities and API bodies.

/// Accounts, currencies and balances
pub mod account;
/// Idempotency records and transfer statuses
pub mod idempotency;
/// Pagination
pub mod page;
/// Transfers between accounts
pub mod transfer;
