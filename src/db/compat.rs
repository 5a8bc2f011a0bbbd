//! Legacy result shaping.
//!
//! The application was written against the mysql2 client, whose results are
//! a `[rows, fields]` tuple with `insertId` / `affectedRows` / `changedRows`
//! attached. [`LegacyResult`] reproduces that contract as a struct; the
//! emulator only shapes, it never retries or mutates the statement.

use crate::db::rows::ColumnMetadata;
use crate::sql::statement::{Statement, StatementKind};
use crate::sql::tables::id_column_for;
use serde::Serialize;
use serde_json::Value as JsonValue;

/// Result shape the legacy call sites expect.
#[derive(Debug, Clone, Serialize)]
pub struct LegacyResult {
    /// Primary slot: row records in engine order.
    pub rows: Vec<serde_json::Map<String, JsonValue>>,
    /// Secondary slot: column descriptors.
    pub columns: Vec<ColumnMetadata>,
    /// Identifier of the inserted row. Absent means "no id returned",
    /// which callers must distinguish from an id of 0.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insert_id: Option<JsonValue>,
    pub affected_rows: u64,
    pub changed_rows: u64,
}

impl LegacyResult {
    /// Number of rows in the primary slot.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Insert id as an integer, when present and integral.
    pub fn insert_id_i64(&self) -> Option<i64> {
        self.insert_id.as_ref().and_then(JsonValue::as_i64)
    }
}

/// Shape a native execution result into the legacy tuple-with-metadata form.
///
/// `insert_id` is computed only for insert statements that returned at least
/// one row. The table map is the primary source of truth for which field
/// holds the identifier; the legacy name heuristic is kept as fallback for
/// tables outside the map.
pub fn emulate(
    rows: Vec<serde_json::Map<String, JsonValue>>,
    columns: Vec<ColumnMetadata>,
    rows_affected: u64,
    original: &Statement,
) -> LegacyResult {
    let insert_id = match original.kind() {
        StatementKind::Insert { table } => rows
            .first()
            .and_then(|row| extract_insert_id(row, table.as_deref())),
        _ => None,
    };

    LegacyResult {
        rows,
        columns,
        insert_id,
        affected_rows: rows_affected,
        changed_rows: rows_affected,
    }
}

fn extract_insert_id(
    row: &serde_json::Map<String, JsonValue>,
    table: Option<&str>,
) -> Option<JsonValue> {
    // Per-table contract first: unambiguous even when a row carries several
    // id-like columns (e.g. id_movimiento next to id_vehiculo).
    if let Some(table) = table {
        if let Some(value) = row.get(id_column_for(table)) {
            return Some(value.clone());
        }
    }

    // Legacy field-name heuristic, in decreasing specificity.
    if let Some(value) = row.get("id") {
        return Some(value.clone());
    }
    if let Some((_, value)) = row
        .iter()
        .find(|(name, _)| name.ends_with("_id") || name.starts_with("id_"))
    {
        return Some(value.clone());
    }
    row.iter()
        .find(|(name, _)| name.contains("id"))
        .map(|(_, value)| value.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(pairs: &[(&str, JsonValue)]) -> serde_json::Map<String, JsonValue> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn insert_stmt(table: &str) -> Statement {
        Statement::new(format!("INSERT INTO {} (x) VALUES (?)", table))
    }

    #[test]
    fn test_insert_id_from_table_map() {
        let rows = vec![row(&[
            ("id_vehiculo", json!(42)),
            ("placa", json!("ABC123")),
        ])];
        let result = emulate(rows, Vec::new(), 1, &insert_stmt("vehiculos"));
        assert_eq!(result.insert_id_i64(), Some(42));
        assert_eq!(result.affected_rows, 1);
        assert_eq!(result.changed_rows, 1);
    }

    #[test]
    fn test_insert_id_prefers_mapped_column_over_other_ids() {
        // A joined row with two id-like fields: the map disambiguates.
        let rows = vec![row(&[
            ("id_vehiculo", json!(7)),
            ("id_movimiento", json!(99)),
        ])];
        let result = emulate(rows, Vec::new(), 1, &insert_stmt("movimientos"));
        assert_eq!(result.insert_id_i64(), Some(99));
    }

    #[test]
    fn test_insert_id_heuristic_for_unknown_table() {
        let rows = vec![row(&[("reporte_id", json!(5))])];
        let result = emulate(rows, Vec::new(), 1, &insert_stmt("reportes"));
        assert_eq!(result.insert_id_i64(), Some(5));
    }

    #[test]
    fn test_insert_id_absent_when_no_id_like_field() {
        let rows = vec![row(&[("nombre", json!("x"))])];
        let result = emulate(rows, Vec::new(), 1, &insert_stmt("reportes"));
        assert!(result.insert_id.is_none());
    }

    #[test]
    fn test_insert_id_absent_without_rows() {
        let result = emulate(Vec::new(), Vec::new(), 1, &insert_stmt("vehiculos"));
        assert!(result.insert_id.is_none());
    }

    #[test]
    fn test_no_insert_id_for_select() {
        let rows = vec![row(&[("id_vehiculo", json!(1))])];
        let stmt = Statement::new("SELECT id_vehiculo FROM vehiculos");
        let result = emulate(rows, Vec::new(), 1, &stmt);
        assert!(result.insert_id.is_none());
    }

    #[test]
    fn test_affected_rows_follow_engine_count_not_row_count() {
        let stmt = Statement::new("UPDATE vehiculos SET activo = FALSE WHERE id_empresa = ?");
        let result = emulate(Vec::new(), Vec::new(), 12, &stmt);
        assert_eq!(result.affected_rows, 12);
        assert_eq!(result.changed_rows, 12);
        assert_eq!(result.row_count(), 0);
    }

    #[test]
    fn test_insert_id_zero_is_distinct_from_absent() {
        let rows = vec![row(&[("id_pago", json!(0))])];
        let result = emulate(rows, Vec::new(), 1, &insert_stmt("pagos"));
        assert_eq!(result.insert_id_i64(), Some(0));
        assert!(result.insert_id.is_some());
    }
}
