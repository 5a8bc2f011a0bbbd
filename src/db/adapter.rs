//! Adapter facade.
//!
//! The single entry point legacy call sites use: translate-and-run queries,
//! untranslated pass-through, transaction handles, a connectivity probe, and
//! pool shutdown. Call sites written for the MySQL driver keep their query
//! text and result-shape expectations; everything Postgres-specific stays
//! behind this type.

use crate::config::Config;
use crate::db::compat::{emulate, LegacyResult};
use crate::db::executor::run_statement;
use crate::db::pool::{FaultPolicy, PoolManager};
use crate::db::transaction::TransactionHandle;
use crate::error::{AdapterError, AdapterResult};
use crate::sql::{translate, QueryParam, Statement};
use tracing::{error, info};

pub struct Adapter {
    pool: PoolManager,
}

impl Adapter {
    /// Connect with the default fault policy ([`FaultPolicy::Escalate`]).
    pub async fn connect(config: &Config) -> AdapterResult<Self> {
        Self::with_fault_policy(config, FaultPolicy::default()).await
    }

    /// Connect with an explicit policy for broken idle connections.
    pub async fn with_fault_policy(
        config: &Config,
        fault_policy: FaultPolicy,
    ) -> AdapterResult<Self> {
        let pool = PoolManager::connect(config, fault_policy).await?;
        Ok(Self { pool })
    }

    /// Translate a MySQL-dialect statement and run it, returning the legacy
    /// result shape.
    ///
    /// Transaction control text is rejected here: a bare BEGIN on an
    /// auto-checked-out connection would be released back to the pool
    /// mid-transaction. Callers use [`Adapter::begin`] instead.
    pub async fn query(&self, sql: &str, params: Vec<QueryParam>) -> AdapterResult<LegacyResult> {
        let original = Statement::with_params(sql, params);
        let kind = original.kind();
        if kind.is_transaction_control() {
            return Err(AdapterError::transaction_integrity(
                "Transaction control is not allowed through query(); use begin() \
                 to obtain a handle bound to one connection",
            ));
        }

        let translated = translate(&original);
        let mut conn = self.pool.checkout().await?;
        let raw = run_statement(&mut *conn, &translated, &kind, &original.sql).await?;
        Ok(emulate(raw.rows, raw.columns, raw.rows_affected, &original))
    }

    /// Run a statement verbatim, without dialect translation.
    ///
    /// For text already written against Postgres. Placeholders must use the
    /// `$n` form and the result still arrives in the legacy shape.
    pub async fn query_direct(
        &self,
        sql: &str,
        params: Vec<QueryParam>,
    ) -> AdapterResult<LegacyResult> {
        let original = Statement::with_params(sql, params);
        let kind = original.kind();
        if kind.is_transaction_control() {
            return Err(AdapterError::transaction_integrity(
                "Transaction control is not allowed through query_direct(); use begin()",
            ));
        }

        let mut conn = self.pool.checkout().await?;
        let raw = run_statement(&mut *conn, &original, &kind, &original.sql).await?;
        Ok(emulate(raw.rows, raw.columns, raw.rows_affected, &original))
    }

    /// Start a transaction bound to one physical connection for its whole
    /// lifetime.
    pub async fn begin(&self) -> AdapterResult<TransactionHandle> {
        let tx = self.pool.begin().await?;
        TransactionHandle::new(tx).await
    }

    /// Round-trip probe. Logs the outcome and never panics; returns whether
    /// the database answered.
    pub async fn test_connection(&self) -> bool {
        match sqlx::query_scalar::<_, chrono::DateTime<chrono::Utc>>("SELECT NOW()")
            .fetch_one(self.pool.pool())
            .await
        {
            Ok(now) => {
                info!(server_time = %now, "Database connection OK");
                true
            }
            Err(e) => {
                error!(error = %e, "Database connection check failed");
                false
            }
        }
    }

    /// Number of idle connections currently pooled.
    pub fn num_idle(&self) -> usize {
        self.pool.num_idle()
    }

    /// Drain and close the pool. Safe to call more than once.
    pub async fn shutdown(&self) {
        self.pool.close().await;
    }
}
