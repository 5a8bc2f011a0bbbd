//! Transaction lifetime bound to one physical connection.
//!
//! The legacy MySQL driver guaranteed that every statement between BEGIN and
//! COMMIT ran on the same socket. Acquiring a fresh pooled connection per
//! statement would silently break that, so a [`TransactionHandle`] owns its
//! checked-out connection for the whole lifetime and records the backend
//! process id at BEGIN. Commit re-reads the pid and refuses to proceed on a
//! mismatch.

use crate::db::compat::{emulate, LegacyResult};
use crate::db::executor::run_statement;
use crate::error::{AdapterError, AdapterResult};
use crate::sql::{translate, QueryParam, Statement};
use sqlx::{Postgres, Transaction};
use tracing::{debug, warn};

pub struct TransactionHandle {
    tx: Transaction<'static, Postgres>,
    backend_pid: i32,
}

impl TransactionHandle {
    /// Wrap a freshly begun transaction, capturing the backend pid that all
    /// subsequent statements must observe.
    pub(crate) async fn new(mut tx: Transaction<'static, Postgres>) -> AdapterResult<Self> {
        let backend_pid: i32 = sqlx::query_scalar("SELECT pg_backend_pid()")
            .fetch_one(&mut *tx)
            .await?;
        debug!(backend_pid, "Transaction started");
        Ok(Self { tx, backend_pid })
    }

    /// Backend process id of the physical connection this transaction owns.
    pub fn backend_pid(&self) -> i32 {
        self.backend_pid
    }

    /// Translate and run one statement inside the transaction.
    ///
    /// A failed statement leaves the handle usable: the caller decides
    /// whether to roll back, matching the legacy driver's behavior.
    pub async fn query(
        &mut self,
        sql: &str,
        params: Vec<QueryParam>,
    ) -> AdapterResult<LegacyResult> {
        let original = Statement::with_params(sql, params);
        let kind = original.kind();
        if kind.is_transaction_control() {
            return Err(AdapterError::transaction_integrity(
                "Transaction control statements are managed by commit()/rollback(), \
                 not by raw SQL inside an open transaction",
            ));
        }

        let translated = translate(&original);
        let raw = run_statement(&mut *self.tx, &translated, &kind, &original.sql).await?;
        Ok(emulate(raw.rows, raw.columns, raw.rows_affected, &original))
    }

    /// Verify the connection identity, then commit.
    pub async fn commit(mut self) -> AdapterResult<()> {
        let pid: i32 = sqlx::query_scalar("SELECT pg_backend_pid()")
            .fetch_one(&mut *self.tx)
            .await?;
        if pid != self.backend_pid {
            warn!(
                expected = self.backend_pid,
                actual = pid,
                "Backend pid changed during transaction"
            );
            return Err(AdapterError::transaction_integrity(format!(
                "Transaction began on backend {} but would commit on backend {}",
                self.backend_pid, pid
            )));
        }
        self.tx.commit().await?;
        debug!(backend_pid = self.backend_pid, "Transaction committed");
        Ok(())
    }

    /// Explicitly roll back. Dropping the handle without calling this rolls
    /// back as well.
    pub async fn rollback(self) -> AdapterResult<()> {
        self.tx.rollback().await?;
        debug!(backend_pid = self.backend_pid, "Transaction rolled back");
        Ok(())
    }
}

impl std::fmt::Debug for TransactionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionHandle")
            .field("backend_pid", &self.backend_pid)
            .finish_non_exhaustive()
    }
}
