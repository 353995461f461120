//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (JSON body, URL params, headers)
//! 2. Delegates to the services held in [`crate::state::AppState`]
//! 3. Returns HTTP response (JSON, status code)

/// Account management endpoints
pub mod accounts;
pub mod health;
/// Transfer submission and monitoring endpoints
pub mod transfers;
