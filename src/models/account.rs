//! Account data models and API request/response types.
//!
//! This module defines:
//! - `Currency`: Currencies an account can be held in
//! - `Balance`: An amount of money in a given currency
//! - `Account`: Database entity representing an account
//! - `CreateAccountRequest` / `AccountResponse`: API bodies

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Exclusive upper bound of a balance. `NUMERIC(38, 10)` keeps 28 integer digits.
pub const BALANCE_LIMIT: Decimal = dec!(10000000000000000000000000000);

/// Currencies supported by the service.
///
/// Stored in PostgreSQL as the `currency` enum type and serialized
/// as the upper-case ISO 4217 code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "currency", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Eur,
    Usd,
    Huf,
}

impl Currency {
    /// ISO 4217 code.
    pub fn code(self) -> &'static str {
        match self {
            Currency::Eur => "EUR",
            Currency::Usd => "USD",
            Currency::Huf => "HUF",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// An amount of money in a specific currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub amount: Decimal,
    pub currency: Currency,
}

impl Balance {
    pub fn new(amount: Decimal, currency: Currency) -> Self {
        Self { amount, currency }
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}

/// Represents an account record from the database.
///
/// # Database Table
///
/// Maps to the `accounts` table. The balance is a `NUMERIC(38, 10)`
/// held in the account's own currency, which never changes after creation.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize)]
pub struct Account {
    /// Unique identifier for this account
    pub id: Uuid,

    /// Current balance in `currency`
    ///
    /// Must be >= 0 (enforced by database CHECK constraint).
    pub balance: Decimal,

    pub currency: Currency,

    /// Timestamp when account was created
    pub created_at: DateTime<Utc>,

    /// Timestamp of last balance update
    pub updated_at: DateTime<Utc>,
}

/// Request body for creating a new account.
///
/// # JSON Example
///
/// ```json
/// {
///   "balance": "100.00",
///   "currency": "EUR"
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    /// Opening balance (defaults to 0 if not provided)
    #[serde(default)]
    pub balance: Decimal,

    pub currency: Currency,
}

/// Response body for account endpoints.
///
/// # JSON Example
///
/// ```json
/// {
///   "id": "550e8400-e29b-41d4-a716-446655440000",
///   "balance": "100.00",
///   "currency": "EUR",
///   "created_at": "2025-12-20T10:00:00Z",
///   "updated_at": "2025-12-20T10:00:00Z"
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub id: Uuid,
    pub balance: Decimal,
    pub currency: Currency,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            balance: account.balance.normalize(),
            currency: account.currency,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balance_limit_has_twenty_eight_integer_digits() {
        assert_eq!(BALANCE_LIMIT, Decimal::from(10u64.pow(14)) * Decimal::from(10u64.pow(14)));
    }

    #[test]
    fn currency_uses_iso_codes_on_the_wire() {
        assert_eq!(serde_json::to_string(&Currency::Huf).unwrap(), "\"HUF\"");
        let parsed: Currency = serde_json::from_str("\"EUR\"").unwrap();
        assert_eq!(parsed, Currency::Eur);
        assert!(serde_json::from_str::<Currency>("\"GBP\"").is_err());
    }

    #[test]
    fn create_request_defaults_to_empty_balance() {
        let request: CreateAccountRequest =
            serde_json::from_str(r#"{ "currency": "USD" }"#).unwrap();
        assert_eq!(request.balance, Decimal::ZERO);
        assert_eq!(request.currency, Currency::Usd);
    }

    #[test]
    fn response_drops_storage_padding() {
        let now = Utc::now();
        let response = AccountResponse::from(Account {
            id: Uuid::new_v4(),
            balance: dec!(25.0000000000),
            currency: Currency::Eur,
            created_at: now,
            updated_at: now,
        });
        assert_eq!(response.balance.to_string(), "25");
    }
}
