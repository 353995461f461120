//! Currency conversion.
//!
//! Rates come from an [`ExchangeRateClient`]. The service is configured with
//! either the simulated [`MockExchangeRateClient`] or the HTTP client in
//! [`super::exchange_client`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use crate::error::AppError;
use crate::models::account::{Balance, Currency};

/// Decimal places kept for rates and converted amounts.
pub const RATE_SCALE: u32 = 10;

/// Source of exchange rates.
#[async_trait]
pub trait ExchangeRateClient: Send + Sync {
    /// How many units of `to` one unit of `from` buys.
    ///
    /// # Errors
    ///
    /// `ExchangeUnavailable` if the rate cannot be obtained.
    async fn exchange_rate(&self, from: Currency, to: Currency) -> Result<Decimal, AppError>;
}

const HUF_PER_EUR: Decimal = dec!(379.08);
const HUF_PER_USD: Decimal = dec!(322.13);

/// Simulated rate provider with fixed HUF cross rates.
///
/// Every call waits `latency` and then fails with probability
/// `failure_rate`, mimicking a slow and flaky remote API.
#[derive(Debug, Clone)]
pub struct MockExchangeRateClient {
    latency: Duration,
    failure_rate: f64,
}

impl MockExchangeRateClient {
    pub fn new(latency: Duration, failure_rate: f64) -> Self {
        Self {
            latency,
            failure_rate,
        }
    }

    /// A client that answers immediately and never fails.
    pub fn reliable() -> Self {
        Self::new(Duration::ZERO, 0.0)
    }

    fn huf_per(currency: Currency) -> Decimal {
        match currency {
            Currency::Eur => HUF_PER_EUR,
            Currency::Usd => HUF_PER_USD,
            Currency::Huf => Decimal::ONE,
        }
    }
}

#[async_trait]
impl ExchangeRateClient for MockExchangeRateClient {
    async fn exchange_rate(&self, from: Currency, to: Currency) -> Result<Decimal, AppError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        if self.failure_rate > 0.0 && rand::random::<f64>() < self.failure_rate {
            return Err(AppError::ExchangeUnavailable(
                "Service unavailable".to_string(),
            ));
        }

        if from == to {
            return Ok(Decimal::ONE);
        }

        let rate = Self::huf_per(from)
            .checked_div(Self::huf_per(to))
            .ok_or_else(|| AppError::Internal(format!("no rate for {from}/{to}")))?;
        Ok(rate.round_dp_with_strategy(RATE_SCALE, RoundingStrategy::MidpointAwayFromZero))
    }
}

/// Converts balances between currencies.
#[derive(Clone)]
pub struct ExchangeService {
    client: Arc<dyn ExchangeRateClient>,
}

impl ExchangeService {
    pub fn new(client: Arc<dyn ExchangeRateClient>) -> Self {
        Self { client }
    }

    /// Express `balance` in currency `to`.
    ///
    /// Balances already in `to` are returned unchanged without asking the client.
    pub async fn exchange_to(&self, balance: Balance, to: Currency) -> Result<Balance, AppError> {
        if balance.currency == to {
            return Ok(balance);
        }

        let rate = self.client.exchange_rate(balance.currency, to).await?;
        let amount = rate
            .checked_mul(balance.amount)
            .ok_or_else(|| AppError::InvalidRequest("amount is too large".to_string()))?;

        tracing::debug!(from = %balance, %to, %rate, "converted balance");
        Ok(Balance::new(amount, to))
    }
}
