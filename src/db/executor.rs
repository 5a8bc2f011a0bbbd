//! Statement execution.
//!
//! Runs an already-translated statement on any Postgres executor (a pooled
//! connection or a transaction's bound connection) and collects the native
//! result: decoded rows, column descriptors, and the engine's reported row
//! count. Engine rejections are wrapped with both the original and the
//! translated text attached.

use crate::db::rows::{ColumnMetadata, column_metadata, row_to_map};
use crate::error::{AdapterError, AdapterResult};
use crate::sql::statement::{QueryParam, Statement, StatementKind};
use futures_util::TryStreamExt;
use serde_json::Value as JsonValue;
use sqlx::Postgres;
use sqlx::postgres::{PgArguments, PgRow};
use tracing::debug;

/// Native execution output before legacy shaping.
#[derive(Debug)]
pub struct RawExecution {
    pub rows: Vec<serde_json::Map<String, JsonValue>>,
    pub columns: Vec<ColumnMetadata>,
    pub rows_affected: u64,
}

/// Bind a positional parameter to a Postgres query.
pub(crate) fn bind_param<'q>(
    query: sqlx::query::Query<'q, Postgres, PgArguments>,
    param: &'q QueryParam,
) -> sqlx::query::Query<'q, Postgres, PgArguments> {
    match param {
        QueryParam::Null => query.bind(None::<String>),
        QueryParam::Bool(v) => query.bind(*v),
        QueryParam::Int(v) => query.bind(*v),
        QueryParam::Float(v) => query.bind(*v),
        QueryParam::String(v) => query.bind(v.as_str()),
    }
}

/// Whether a translated statement produces a row stream.
///
/// Reads do; so does anything carrying a RETURNING clause (every translated
/// insert, after identifier injection). Plain writes report a row count only.
fn returns_rows(kind: &StatementKind, translated_sql: &str) -> bool {
    matches!(kind, StatementKind::Select)
        || translated_sql.to_ascii_uppercase().contains("RETURNING")
}

/// Execute a translated statement on the given executor.
///
/// `original_sql` is the pre-translation text, carried along purely for
/// error diagnostics.
pub async fn run_statement<'c, E>(
    executor: E,
    translated: &Statement,
    kind: &StatementKind,
    original_sql: &str,
) -> AdapterResult<RawExecution>
where
    E: sqlx::Executor<'c, Database = Postgres>,
{
    debug!(
        original = %original_sql,
        translated = %translated.sql,
        params = translated.params.len(),
        "Executing statement"
    );

    let mut query = sqlx::query(&translated.sql);
    for param in &translated.params {
        query = bind_param(query, param);
    }

    if returns_rows(kind, &translated.sql) {
        let rows: Vec<PgRow> = query
            .fetch(executor)
            .try_collect()
            .await
            .map_err(|e| wrap_statement_error(e, original_sql, &translated.sql))?;

        let columns = rows.first().map(column_metadata).unwrap_or_default();
        let row_maps: Vec<_> = rows.iter().map(row_to_map).collect();
        // node-postgres reports rowCount = rows returned for row-producing
        // statements, including INSERT ... RETURNING.
        let rows_affected = row_maps.len() as u64;

        Ok(RawExecution {
            rows: row_maps,
            columns,
            rows_affected,
        })
    } else {
        let result = query
            .execute(executor)
            .await
            .map_err(|e| wrap_statement_error(e, original_sql, &translated.sql))?;

        Ok(RawExecution {
            rows: Vec::new(),
            columns: Vec::new(),
            rows_affected: result.rows_affected(),
        })
    }
}

/// Attach statement texts to engine rejections; other failures convert
/// through the generic mapping.
fn wrap_statement_error(err: sqlx::Error, original: &str, translated: &str) -> AdapterError {
    match err {
        sqlx::Error::Database(db_err) => {
            let code = db_err.code().map(|c| c.to_string());
            AdapterError::statement(db_err.message(), code, original, translated)
        }
        other => AdapterError::from(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_returns_rows_for_select() {
        assert!(returns_rows(
            &StatementKind::Select,
            "SELECT * FROM vehiculos"
        ));
    }

    #[test]
    fn test_returns_rows_for_translated_insert() {
        let kind = StatementKind::Insert {
            table: Some("pagos".to_string()),
        };
        assert!(returns_rows(
            &kind,
            "INSERT INTO pagos (monto) VALUES ($1) RETURNING id_pago"
        ));
    }

    #[test]
    fn test_plain_update_reports_count_only() {
        assert!(!returns_rows(
            &StatementKind::Write,
            "UPDATE tarifas SET activa = FALSE WHERE id_tarifa = $1"
        ));
    }
}
