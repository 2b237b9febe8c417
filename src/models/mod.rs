//! Data models representing database entities.
//!
//! This module contains all data structures that map to database tables.

/// User account balance model
pub mod account;
/// Ledger entry model and transaction API types
pub mod ledger;
