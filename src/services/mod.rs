//! Business logic services.
//!
//! Services contain core business logic separated from HTTP handlers.
//! They handle validation and ledger access; balance mutation is never done
//! here — that is the reconciliation engine's job.

pub mod transaction_service;
