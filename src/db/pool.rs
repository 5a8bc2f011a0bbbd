//! Connection pool management.
//!
//! Wraps a bounded `sqlx::PgPool`. Every new physical connection is pinned
//! to the configured named timezone exactly once, in the `after_connect`
//! hook, so server-side date arithmetic never depends on the host session.
//! Checkout blocks up to the acquire timeout and then fails with
//! `PoolExhausted`; a faulted idle connection is handled per the injected
//! [`FaultPolicy`] instead of terminating the process from inside the layer.

use crate::config::Config;
use crate::error::{AdapterError, AdapterResult};
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Executor, Postgres, Transaction};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// What to do when a pooled-but-unused connection turns out to be broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FaultPolicy {
    /// Surface `IdleConnectionFault` and let the owning process decide
    /// whether to abort. Matches the legacy deployment's posture of never
    /// keeping a half-open socket in rotation.
    #[default]
    Escalate,
    /// Discard the broken connection and retry the checkout once.
    Retire,
}

/// Owns the bounded set of physical connections.
pub struct PoolManager {
    pool: PgPool,
    fault_policy: FaultPolicy,
    acquire_timeout: Duration,
}

impl PoolManager {
    /// Establish the pool and validate connectivity.
    pub async fn connect(config: &Config, fault_policy: FaultPolicy) -> AdapterResult<Self> {
        // SET TIME ZONE takes no bind parameters; the zone name comes from
        // configuration, so escape it for literal position.
        let set_timezone = format!("SET TIME ZONE '{}'", config.timezone.replace('\'', "''"));

        let options = PgPoolOptions::new()
            .max_connections(config.pool_size)
            .acquire_timeout(config.acquire_timeout())
            .idle_timeout(Some(config.idle_timeout()))
            .test_before_acquire(true)
            .after_connect(move |conn, _meta| {
                let set_timezone = set_timezone.clone();
                Box::pin(async move {
                    conn.execute(set_timezone.as_str()).await?;
                    debug!("New physical connection established, session timezone pinned");
                    Ok(())
                })
            });

        let connect = options.connect_with(config.connect_options());
        let pool = match tokio::time::timeout(config.connect_timeout(), connect).await {
            Ok(Ok(pool)) => pool,
            Ok(Err(e)) => {
                return Err(AdapterError::connection(
                    format!("Failed to connect: {}", e),
                    connection_suggestion(&e),
                ));
            }
            Err(_) => {
                return Err(AdapterError::connection(
                    format!(
                        "Connection attempt timed out after {}ms",
                        config.connect_timeout().as_millis()
                    ),
                    "Check that the PostgreSQL host is reachable",
                ));
            }
        };

        info!(
            host = %config.host,
            database = %config.database,
            pool_size = config.pool_size,
            timezone = %config.timezone,
            "Connected to PostgreSQL"
        );

        Ok(Self {
            pool,
            fault_policy,
            acquire_timeout: config.acquire_timeout(),
        })
    }

    /// Check out a connection, blocking up to the acquire timeout.
    pub async fn checkout(&self) -> AdapterResult<PoolConnection<Postgres>> {
        match self.pool.acquire().await {
            Ok(conn) => Ok(conn),
            Err(sqlx::Error::PoolTimedOut) => {
                Err(AdapterError::pool_exhausted(self.acquire_timeout.as_secs()))
            }
            Err(e @ (sqlx::Error::Io(_) | sqlx::Error::Tls(_))) => self.handle_idle_fault(e).await,
            Err(e) => Err(e.into()),
        }
    }

    /// Begin a transaction on a dedicated checked-out connection.
    pub async fn begin(&self) -> AdapterResult<Transaction<'static, Postgres>> {
        match self.pool.begin().await {
            Ok(tx) => Ok(tx),
            Err(sqlx::Error::PoolTimedOut) => {
                Err(AdapterError::pool_exhausted(self.acquire_timeout.as_secs()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn handle_idle_fault(
        &self,
        err: sqlx::Error,
    ) -> AdapterResult<PoolConnection<Postgres>> {
        match self.fault_policy {
            FaultPolicy::Escalate => {
                error!(error = %err, "Idle connection fault, escalating to owner");
                Err(AdapterError::idle_fault(err.to_string()))
            }
            FaultPolicy::Retire => {
                // sqlx already dropped the broken connection; one retry picks
                // up a fresh physical connection.
                warn!(error = %err, "Idle connection fault, retiring and retrying checkout");
                match self.pool.acquire().await {
                    Ok(conn) => Ok(conn),
                    Err(sqlx::Error::PoolTimedOut) => {
                        Err(AdapterError::pool_exhausted(self.acquire_timeout.as_secs()))
                    }
                    Err(e) => Err(e.into()),
                }
            }
        }
    }

    /// Underlying pool handle, for lightweight round trips.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Number of currently idle connections.
    pub fn num_idle(&self) -> usize {
        self.pool.num_idle()
    }

    /// Drain and close the pool. Idempotent.
    pub async fn close(&self) {
        if self.pool.is_closed() {
            return;
        }
        self.pool.close().await;
        info!("Connection pool closed");
    }
}

/// Generate a helpful suggestion for connection errors.
fn connection_suggestion(error: &sqlx::Error) -> String {
    let error_str = error.to_string().to_lowercase();

    if error_str.contains("connection refused") {
        return "Check that the PostgreSQL server is running and accessible".to_string();
    }
    if error_str.contains("authentication") || error_str.contains("password") {
        return "Verify SUPABASE_DB_USER and SUPABASE_DB_PASSWORD".to_string();
    }
    if error_str.contains("does not exist") {
        return "Check that SUPABASE_DB_NAME names an existing database".to_string();
    }
    if error_str.contains("tls") || error_str.contains("ssl") {
        return "Check the TLS trust policy (--ssl-mode) or try disabling it".to_string();
    }
    "Verify host, port and credentials".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_policy_default_escalates() {
        assert_eq!(FaultPolicy::default(), FaultPolicy::Escalate);
    }

    #[test]
    fn test_connection_suggestions() {
        let io = sqlx::Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "connection refused",
        ));
        assert!(connection_suggestion(&io).contains("running"));
    }
}
