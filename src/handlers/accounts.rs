//! Account management HTTP handlers.
//!
//! This module implements the account-related API endpoints:
//! - POST /api/accounts - Open an account
//! - GET /api/accounts/{id} - Get account by ID
//! - GET /api/accounts - List all accounts

use crate::{
    error::AppError,
    models::account::{AccountResponse, BALANCE_LIMIT, Balance, CreateAccountRequest},
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Open a new account.
///
/// # Request Body
///
/// ```json
/// {
///   "balance": "100.00",
///   "currency": "EUR"
/// }
/// ```
///
/// # Response
///
/// - **Success (201 Created)**: Returns the created account
/// - **Error (400)**: Negative opening balance, or one too large to store
pub async fn create_account(
    State(state): State<AppState>,
    Json(request): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<AccountResponse>), AppError> {
    if request.balance < Decimal::ZERO {
        return Err(AppError::InvalidRequest(
            "Opening balance cannot be negative".to_string(),
        ));
    }
    if request.balance >= BALANCE_LIMIT {
        return Err(AppError::InvalidRequest(format!(
            "Opening balance must be below {BALANCE_LIMIT}"
        )));
    }

    let account = state
        .repositories
        .accounts
        .create(Balance::new(request.balance, request.currency))
        .await?;

    tracing::info!(account_id = %account.id, currency = %account.currency, "account created");

    Ok((StatusCode::CREATED, Json(account.into())))
}

/// Get a specific account by ID.
///
/// # Response
///
/// - **Success (200 OK)**: Returns account details
/// - **Error (404)**: Account not found
pub async fn get_account(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
) -> Result<Json<AccountResponse>, AppError> {
    let account = state
        .repositories
        .accounts
        .find_by_id(account_id)
        .await?
        .ok_or(AppError::AccountNotFound(account_id))?;

    Ok(Json(account.into()))
}

/// List all accounts, newest first.
pub async fn list_accounts(
    State(state): State<AppState>,
) -> Result<Json<Vec<AccountResponse>>, AppError> {
    let accounts = state.repositories.accounts.list().await?;

    Ok(Json(accounts.into_iter().map(Into::into).collect()))
}

#[cfg(test)]
mod tests {
    use crate::handlers::test_support::TestApp;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn create_then_fetch_account() {
        let app = TestApp::new();

        let (status, created) = app
            .post("/api/accounts", json!({ "balance": "100.50", "currency": "EUR" }))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["currency"], "EUR");
        assert_eq!(created["balance"], "100.5");

        let id = created["id"].as_str().unwrap();
        let (status, fetched) = app.get(&format!("/api/accounts/{id}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["id"], created["id"]);

        let (status, listed) = app.get("/api/accounts").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_account_is_404() {
        let app = TestApp::new();

        let (status, body) = app
            .get("/api/accounts/00000000-0000-0000-0000-000000000001")
            .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "account_not_found");
    }

    #[tokio::test]
    async fn negative_opening_balance_is_rejected() {
        let app = TestApp::new();

        let (status, body) = app
            .post("/api/accounts", json!({ "balance": "-1", "currency": "USD" }))
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "invalid_request");
    }

    #[tokio::test]
    async fn opening_balance_beyond_storage_range_is_rejected() {
        let app = TestApp::new();

        let (status, body) = app
            .post(
                "/api/accounts",
                json!({ "balance": "79228162514264337593543950335", "currency": "EUR" }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "invalid_request");

        let (status, _) = app
            .post(
                "/api/accounts",
                json!({ "balance": "9999999999999999999999999999", "currency": "EUR" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn accounts_are_listed_newest_first() {
        let app = TestApp::new();
        let mut ids = Vec::new();
        for currency in ["EUR", "USD", "HUF"] {
            let (_, created) = app
                .post("/api/accounts", json!({ "balance": "1", "currency": currency }))
                .await;
            ids.push(created["id"].clone());
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }

        let (status, listed) = app.get("/api/accounts").await;

        assert_eq!(status, StatusCode::OK);
        let listed: Vec<_> = listed.as_array().unwrap().iter().map(|a| a["id"].clone()).collect();
        ids.reverse();
        assert_eq!(listed, ids);
    }
}
