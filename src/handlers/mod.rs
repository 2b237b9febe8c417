//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (JSON body, URL params, etc.)
//! 2. Delegates to the service layer or the engine
//! 3. Returns HTTP response (JSON, status code)

/// Balance lookup endpoint
pub mod accounts;
/// Liveness endpoint
pub mod health;
/// Manual sweep trigger
pub mod reconciliation;
/// Transaction creation and status endpoints
pub mod transactions;
