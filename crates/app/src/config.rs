//! Configuration
//!
//! Every setting can come from a flag or an environment variable; `.env` is
//! read first.

use std::time::Duration;

use clap::Args;

use crate::domain::reservations::HttpReservationConfig;

/// Database settings.
#[derive(Debug, Clone, Args)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: String,
}

/// Reservation system settings.
#[derive(Debug, Clone, Args)]
pub struct ReservationConfig {
    /// Base URL of the reservation system API
    #[arg(long, env = "RESERVATION_API_URL")]
    pub reservation_api_url: String,

    /// API key sent with every reservation request
    #[arg(long, env = "RESERVATION_API_KEY", hide_env_values = true)]
    pub reservation_api_key: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "RESERVATION_TIMEOUT_SECONDS", default_value_t = 30u64)]
    pub reservation_timeout_seconds: u64,
}

impl ReservationConfig {
    #[must_use]
    pub fn client_config(&self) -> HttpReservationConfig {
        HttpReservationConfig {
            base_url: self.reservation_api_url.clone(),
            api_key: self.reservation_api_key.clone(),
            timeout: Duration::from_secs(self.reservation_timeout_seconds),
        }
    }
}

/// Log output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Debug, Clone, Args)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "info", global = true)]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(
        long,
        env = "LOG_FORMAT",
        value_enum,
        default_value_t = LogFormat::Compact,
        global = true
    )]
    pub log_format: LogFormat,
}
