//! Business logic services.
//!
//! Services contain core business logic separated from HTTP handlers.
//! They depend on the storage traits in [`crate::repositories`], never on a
//! concrete backend.

pub mod exchange_client;
pub mod exchange_service;
pub mod monitor_service;
pub mod transfer_orchestrator;
pub mod transfer_service;
