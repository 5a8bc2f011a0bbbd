//! Table-to-identifier mapping.
//!
//! The application schema predates surrogate-key naming conventions: each
//! table carries its own primary-key column name. This map is the single
//! source of truth both for RETURNING injection and for insert-id extraction.

/// Identifier column used when a table is not in the map.
pub const DEFAULT_ID_COLUMN: &str = "id";

/// Primary-key column for each known application table.
pub const TABLE_ID_COLUMNS: &[(&str, &str)] = &[
    ("empresas", "id_empresa"),
    ("usuarios", "id_usuario"),
    ("vehiculos", "id_vehiculo"),
    ("movimientos", "id_movimiento"),
    ("pagos", "id_pago"),
    ("tarifas", "id_tarifa"),
    ("turnos", "id_turno"),
    ("configuracion_empresa", "id_configuracion"),
    ("login_attempts", "id_intento"),
];

/// Look up the identifier column for a table, falling back to
/// [`DEFAULT_ID_COLUMN`] for unknown tables.
pub fn id_column_for(table: &str) -> &'static str {
    TABLE_ID_COLUMNS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(table))
        .map(|(_, id)| *id)
        .unwrap_or(DEFAULT_ID_COLUMN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_tables() {
        assert_eq!(id_column_for("vehiculos"), "id_vehiculo");
        assert_eq!(id_column_for("configuracion_empresa"), "id_configuracion");
        assert_eq!(id_column_for("login_attempts"), "id_intento");
    }

    #[test]
    fn test_unknown_table_falls_back() {
        assert_eq!(id_column_for("reportes"), DEFAULT_ID_COLUMN);
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(id_column_for("Vehiculos"), "id_vehiculo");
    }
}
