//! Error types for the adapter.
//!
//! All failures surfaced by this crate are variants of [`AdapterError`],
//! defined with `thiserror`. Translation and result shaping never fail:
//! they degrade softly and log instead. Execution and pool errors always
//! propagate to the immediate caller; this layer performs no retries.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdapterError {
    /// The engine rejected a statement. Carries both the original MySQL-style
    /// text and the translated PostgreSQL text for diagnostics.
    #[error("Statement failed: {message}")]
    Statement {
        message: String,
        /// e.g. "42P01" for undefined table
        sql_state: Option<String>,
        original_sql: String,
        translated_sql: String,
    },

    /// Checkout blocked past the acquire timeout. Recoverable by the caller
    /// via retry/backoff; this layer never retries on its own.
    #[error("Connection pool exhausted: no connection became free within {elapsed_secs}s")]
    PoolExhausted { elapsed_secs: u64 },

    /// A pooled-but-unused physical connection faulted. Under
    /// [`FaultPolicy::Escalate`](crate::db::FaultPolicy::Escalate) the owning
    /// process decides whether to abort.
    #[error("Idle connection fault: {message}")]
    IdleConnectionFault { message: String },

    /// A transaction invariant was violated, or transaction-control text was
    /// routed through the non-transactional query path.
    #[error("Transaction integrity violation: {message}")]
    TransactionIntegrity { message: String },

    #[error("Connection failed: {message}")]
    Connection { message: String, suggestion: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AdapterError {
    /// Create a statement error with original/translated diagnostics attached.
    pub fn statement(
        message: impl Into<String>,
        sql_state: Option<String>,
        original_sql: impl Into<String>,
        translated_sql: impl Into<String>,
    ) -> Self {
        Self::Statement {
            message: message.into(),
            sql_state,
            original_sql: original_sql.into(),
            translated_sql: translated_sql.into(),
        }
    }

    /// Create a pool exhaustion error.
    pub fn pool_exhausted(elapsed_secs: u64) -> Self {
        Self::PoolExhausted { elapsed_secs }
    }

    /// Create an idle connection fault.
    pub fn idle_fault(message: impl Into<String>) -> Self {
        Self::IdleConnectionFault {
            message: message.into(),
        }
    }

    /// Create a transaction integrity error.
    pub fn transaction_integrity(message: impl Into<String>) -> Self {
        Self::TransactionIntegrity {
            message: message.into(),
        }
    }

    /// Create a connection error with a helpful suggestion.
    pub fn connection(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the suggestion for this error, if available.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Connection { suggestion, .. } => Some(suggestion),
            _ => None,
        }
    }

    /// Check if this error is worth retrying at the call site.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::PoolExhausted { .. } | Self::Connection { .. })
    }

    /// The SQLSTATE code reported by the engine, if any.
    pub fn sql_state(&self) -> Option<&str> {
        match self {
            Self::Statement { sql_state, .. } => sql_state.as_deref(),
            _ => None,
        }
    }
}

/// Convert sqlx errors that are not tied to one statement's text.
///
/// Statement-level failures are wrapped by the executor instead, so the
/// original and translated SQL can ride along.
impl From<sqlx::Error> for AdapterError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(msg) => AdapterError::connection(
                msg.to_string(),
                "Check the connection settings and credentials",
            ),
            sqlx::Error::PoolTimedOut => AdapterError::pool_exhausted(0),
            sqlx::Error::PoolClosed => {
                AdapterError::connection("Connection pool is closed", "Rebuild the adapter")
            }
            sqlx::Error::Io(io_err) => AdapterError::connection(
                format!("I/O error: {}", io_err),
                "Check network connectivity and database server status",
            ),
            sqlx::Error::Tls(tls_err) => AdapterError::connection(
                format!("TLS error: {}", tls_err),
                "Verify the TLS trust policy and certificates",
            ),
            sqlx::Error::Protocol(msg) => AdapterError::connection(
                format!("Protocol error: {}", msg),
                "Check database server compatibility",
            ),
            // Engine rejections of application statements go through the
            // executor's wrapper, which builds a Statement error with both
            // texts populated. One reaching this impl came from an internal
            // round trip (session setup, pid probe) with no caller text.
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string());
                AdapterError::internal(match code {
                    Some(code) => format!("{} (SQLSTATE {})", db_err.message(), code),
                    None => db_err.message().to_string(),
                })
            }
            sqlx::Error::ColumnDecode { index, source } => {
                AdapterError::internal(format!("Failed to decode column {}: {}", index, source))
            }
            sqlx::Error::Decode(source) => {
                AdapterError::internal(format!("Decode error: {}", source))
            }
            sqlx::Error::WorkerCrashed => AdapterError::internal("Database worker crashed"),
            _ => AdapterError::internal(format!("Unknown database error: {}", err)),
        }
    }
}

/// Result type alias for adapter operations.
pub type AdapterResult<T> = Result<T, AdapterError>;
