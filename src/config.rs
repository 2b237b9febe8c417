//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to automatically deserialize environment variables into a type-safe struct.

use serde::Deserialize;

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `DATABASE_URL` (required): PostgreSQL connection string
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
/// - `PROVIDER_BASE_URL` (required): base URL of the external payment provider
/// - `PROVIDER_SECRET` (required): shared secret used to sign provider requests
/// - `PROVIDER_TIMEOUT_SECS` (optional): per-request provider timeout, defaults to 5
/// - `SWEEP_INTERVAL_SECS` (optional): reconciliation sweep period, defaults to 60
/// - `SWEEP_BUDGET_SECS` (optional): wall-clock budget of one sweep, defaults to 30
/// - `MAX_SUBMIT_ATTEMPTS` (optional): transient submission failures tolerated
///   before an entry is failed, defaults to 5
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,

    #[serde(default = "default_port")]
    pub server_port: u16,

    pub provider_base_url: String,

    pub provider_secret: String,

    #[serde(default = "default_provider_timeout_secs")]
    pub provider_timeout_secs: u64,

    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    #[serde(default = "default_sweep_budget_secs")]
    pub sweep_budget_secs: u64,

    #[serde(default = "default_max_submit_attempts")]
    pub max_submit_attempts: u32,
}

/// Default port if SERVER_PORT environment variable is not set.
fn default_port() -> u16 {
    3000
}

/// Default provider timeout. A hung provider call is classified as a
/// transient network failure, so this stays short.
fn default_provider_timeout_secs() -> u64 {
    5
}

/// Default sweep period.
fn default_sweep_interval_secs() -> u64 {
    60
}

/// Default sweep budget. Must stay below the sweep interval so one tick's
/// tail does not pile onto the next.
fn default_sweep_budget_secs() -> u64 {
    30
}

/// Default submission retry cap.
fn default_max_submit_attempts() -> u32 {
    5
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables and deserializes them into a Config struct.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing (e.g., DATABASE_URL)
    /// - Environment variable values cannot be parsed into expected types
    pub fn from_env() -> Result<Self, envy::Error> {
        // Try to load .env file if it exists (does nothing if not found)
        dotenvy::dotenv().ok();

        // Parse environment variables into Config struct
        // Field names are automatically converted: database_url -> DATABASE_URL
        envy::from_env::<Config>()
    }
}
