//! HTTP exchange rate provider.
//!
//! Fetches `GET {base}/rates/{FROM}/{TO}` and expects a JSON body
//! `{ "rate": "379.08" }`. Any transport failure, non-success status or
//! malformed body is reported as `ExchangeUnavailable`.

use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;
use url::Url;

use super::exchange_service::{ExchangeRateClient, RATE_SCALE};
use crate::error::AppError;
use crate::models::account::Currency;

#[derive(Debug, Deserialize)]
struct RateResponse {
    rate: Decimal,
}

#[derive(Debug, Clone)]
pub struct HttpExchangeRateClient {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpExchangeRateClient {
    /// Build a client for the API rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` if `base_url` is not an absolute http(s) URL,
    /// `Internal` if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| AppError::InvalidRequest(format!("invalid exchange API URL: {e}")))?;
        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            return Err(AppError::InvalidRequest(
                "exchange API URL must be an http(s) base URL".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("HTTP client error: {e}")))?;

        Ok(Self { client, base_url })
    }

    fn rate_url(&self, from: Currency, to: Currency) -> Url {
        let mut url = self.base_url.clone();
        // cannot_be_a_base URLs are rejected in `new`
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["rates", from.code(), to.code()]);
        }
        url
    }
}

#[async_trait]
impl ExchangeRateClient for HttpExchangeRateClient {
    async fn exchange_rate(&self, from: Currency, to: Currency) -> Result<Decimal, AppError> {
        let url = self.rate_url(from, to);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(%url, error = %e, "exchange rate request failed");
                AppError::ExchangeUnavailable(format!("request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%url, %status, "exchange rate API returned an error");
            return Err(AppError::ExchangeUnavailable(format!(
                "rate API answered {status}"
            )));
        }

        let body: RateResponse = response
            .json()
            .await
            .map_err(|e| AppError::ExchangeUnavailable(format!("malformed rate response: {e}")))?;

        if body.rate <= Decimal::ZERO {
            return Err(AppError::ExchangeUnavailable(format!(
                "rate API returned non-positive rate {}",
                body.rate
            )));
        }

        Ok(body
            .rate
            .round_dp_with_strategy(RATE_SCALE, RoundingStrategy::MidpointAwayFromZero))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, extract::Path, http::StatusCode, routing::get};
    use rust_decimal_macros::dec;
    use serde_json::json;

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/api/")
    }

    #[tokio::test]
    async fn fetches_rate_from_remote_api() {
        let app = Router::new().route(
            "/api/rates/{from}/{to}",
            get(|Path((from, to)): Path<(String, String)>| async move {
                assert_eq!((from.as_str(), to.as_str()), ("EUR", "HUF"));
                Json(json!({ "rate": "379.08" }))
            }),
        );
        let base = serve(app).await;
        let client = HttpExchangeRateClient::new(&base, Duration::from_secs(2)).unwrap();

        let rate = client
            .exchange_rate(Currency::Eur, Currency::Huf)
            .await
            .unwrap();

        assert_eq!(rate, dec!(379.08));
    }

    #[tokio::test]
    async fn server_error_means_unavailable() {
        let app = Router::new().route(
            "/api/rates/{from}/{to}",
            get(|| async { StatusCode::SERVICE_UNAVAILABLE }),
        );
        let base = serve(app).await;
        let client = HttpExchangeRateClient::new(&base, Duration::from_secs(2)).unwrap();

        let result = client.exchange_rate(Currency::Usd, Currency::Huf).await;

        assert!(matches!(result, Err(AppError::ExchangeUnavailable(_))));
    }

    #[tokio::test]
    async fn malformed_body_means_unavailable() {
        let app = Router::new().route(
            "/api/rates/{from}/{to}",
            get(|| async { Json(json!({ "price": 1 })) }),
        );
        let base = serve(app).await;
        let client = HttpExchangeRateClient::new(&base, Duration::from_secs(2)).unwrap();

        let result = client.exchange_rate(Currency::Usd, Currency::Eur).await;

        assert!(matches!(result, Err(AppError::ExchangeUnavailable(_))));
    }

    #[test]
    fn rate_url_appends_to_base_path() {
        let client =
            HttpExchangeRateClient::new("https://rates.example.com/v2", Duration::from_secs(1))
                .unwrap();

        assert_eq!(
            client.rate_url(Currency::Usd, Currency::Eur).as_str(),
            "https://rates.example.com/v2/rates/USD/EUR"
        );
    }

    #[test]
    fn rejects_non_http_urls() {
        assert!(HttpExchangeRateClient::new("ftp://rates.example.com", Duration::from_secs(1)).is_err());
        assert!(HttpExchangeRateClient::new("not a url", Duration::from_secs(1)).is_err());
    }
}
