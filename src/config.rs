//! Configuration handling for the adapter.
//!
//! All connection settings arrive from the environment (or CLI flags), with
//! the variable names the deployment already uses for its hosted PostgreSQL.
//! The values are opaque to the adapter core; parsing happens here only.

use clap::{Parser, ValueEnum};
use sqlx::postgres::{PgConnectOptions, PgSslMode};
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 5432;
pub const DEFAULT_POOL_SIZE: u32 = 10;
pub const DEFAULT_IDLE_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 2_000;
pub const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;

/// Named timezone every physical connection is pinned to.
pub const DEFAULT_TIMEZONE: &str = "America/Argentina/Buenos_Aires";

/// TLS trust policy for the server certificate.
///
/// The hosted deployment uses `require` with an unverified certificate
/// (the legacy `rejectUnauthorized: false` posture).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TlsTrustPolicy {
    /// No TLS.
    Disable,
    /// TLS if the server offers it.
    #[default]
    Prefer,
    /// TLS required, certificate not verified.
    Require,
    /// TLS required with full certificate verification.
    VerifyFull,
}

impl std::fmt::Display for TlsTrustPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disable => write!(f, "disable"),
            Self::Prefer => write!(f, "prefer"),
            Self::Require => write!(f, "require"),
            Self::VerifyFull => write!(f, "verify-full"),
        }
    }
}

/// Adapter configuration parsed from CLI arguments and environment variables.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "parkeo-db",
    about = "MySQL-compatibility PostgreSQL adapter for the Parkeo backend",
    version
)]
pub struct Config {
    /// Database host
    #[arg(long, env = "SUPABASE_DB_HOST")]
    pub host: String,

    /// Database port
    #[arg(long, default_value_t = DEFAULT_PORT, env = "SUPABASE_DB_PORT")]
    pub port: u16,

    /// Database name
    #[arg(long, env = "SUPABASE_DB_NAME")]
    pub database: String,

    /// Database user
    #[arg(long, env = "SUPABASE_DB_USER")]
    pub user: String,

    /// Database password (sensitive - never logged)
    #[arg(long, env = "SUPABASE_DB_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Maximum number of pooled physical connections
    #[arg(long, default_value_t = DEFAULT_POOL_SIZE, env = "PARKEO_DB_POOL_SIZE")]
    pub pool_size: u32,

    /// Idle connection timeout in milliseconds
    #[arg(long, default_value_t = DEFAULT_IDLE_TIMEOUT_MS, env = "PARKEO_DB_IDLE_TIMEOUT_MS")]
    pub idle_timeout_ms: u64,

    /// Connection establishment timeout in milliseconds
    #[arg(long, default_value_t = DEFAULT_CONNECT_TIMEOUT_MS, env = "PARKEO_DB_CONNECT_TIMEOUT_MS")]
    pub connect_timeout_ms: u64,

    /// Checkout timeout in seconds before PoolExhausted is raised
    #[arg(long, default_value_t = DEFAULT_ACQUIRE_TIMEOUT_SECS, env = "PARKEO_DB_ACQUIRE_TIMEOUT")]
    pub acquire_timeout_secs: u64,

    /// Named timezone pinned on every physical connection
    #[arg(long, default_value = DEFAULT_TIMEZONE, env = "PARKEO_DB_TIMEZONE")]
    pub timezone: String,

    /// TLS trust policy for the server certificate
    #[arg(long, value_enum, default_value_t = TlsTrustPolicy::Prefer, env = "PARKEO_DB_SSL_MODE")]
    pub ssl_mode: TlsTrustPolicy,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "PARKEO_DB_LOG_LEVEL")]
    pub log_level: String,

    /// Enable JSON logging format
    #[arg(long, env = "PARKEO_DB_JSON_LOGS")]
    pub json_logs: bool,

    /// Run a single MySQL-dialect statement after the connectivity probe
    #[arg(long = "sql", value_name = "STATEMENT")]
    pub run_sql: Option<String>,
}

impl Config {
    /// Parse configuration from command line arguments and environment.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Build sqlx connection options from this configuration.
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.database)
            .username(&self.user)
            .password(&self.password)
            .ssl_mode(match self.ssl_mode {
                TlsTrustPolicy::Disable => PgSslMode::Disable,
                TlsTrustPolicy::Prefer => PgSslMode::Prefer,
                TlsTrustPolicy::Require => PgSslMode::Require,
                TlsTrustPolicy::VerifyFull => PgSslMode::VerifyFull,
            })
    }

    /// Get the idle timeout as a Duration.
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    /// Get the connection establishment timeout as a Duration.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Get the checkout timeout as a Duration.
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    /// Create a configuration with defaults (useful for testing).
    pub fn for_testing(host: &str, database: &str, user: &str, password: &str) -> Self {
        Self {
            host: host.to_string(),
            port: DEFAULT_PORT,
            database: database.to_string(),
            user: user.to_string(),
            password: password.to_string(),
            pool_size: DEFAULT_POOL_SIZE,
            idle_timeout_ms: DEFAULT_IDLE_TIMEOUT_MS,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            acquire_timeout_secs: DEFAULT_ACQUIRE_TIMEOUT_SECS,
            timezone: DEFAULT_TIMEZONE.to_string(),
            ssl_mode: TlsTrustPolicy::Prefer,
            log_level: "info".to_string(),
            json_logs: false,
            run_sql: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::for_testing("localhost", "parkeo", "parkeo", "secret");
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.pool_size, 10);
        assert_eq!(config.timezone, "America/Argentina/Buenos_Aires");
        assert_eq!(config.acquire_timeout(), Duration::from_secs(30));
        assert_eq!(config.connect_timeout(), Duration::from_millis(2_000));
        assert_eq!(config.idle_timeout(), Duration::from_millis(30_000));
    }

    #[test]
    fn test_tls_policy_display() {
        assert_eq!(TlsTrustPolicy::Require.to_string(), "require");
        assert_eq!(TlsTrustPolicy::VerifyFull.to_string(), "verify-full");
    }
}
