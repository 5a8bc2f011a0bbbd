//! MySQL-to-PostgreSQL dialect translation.
//!
//! Translation is an ordered pipeline of total rewrite rules over a
//! [`Statement`] value. It never fails: rules that cannot apply are no-ops,
//! and an INSERT whose table cannot be parsed degrades to the default
//! identifier column. The order is load-bearing:
//!
//! 1. placeholder renumbering (`?` -> `$n`)
//! 2. RETURNING injection for inserts
//! 3. `DATE_SUB(NOW(), INTERVAL n unit)` -> interval arithmetic
//! 4. `LIMIT offset,count` -> `LIMIT count OFFSET offset`
//! 5. double-quoted string literals -> single-quoted
//! 6. `TIMESTAMPDIFF(unit, a, b)` -> epoch extraction arithmetic
//! 7. remaining `CURRENT_TIMESTAMP` -> `NOW() AT TIME ZONE '<zone>'`
//!
//! Rule 6 must precede rule 7: its specialized as-of-now form matches the
//! raw `CURRENT_TIMESTAMP` token before rule 7 consumes it. Each rule only
//! fires on the legacy spelling, so running the pipeline on already-translated
//! text leaves it unchanged.

use crate::sql::statement::{Statement, StatementKind};
use crate::sql::tables::{DEFAULT_ID_COLUMN, id_column_for};
use crate::time::ARGENTINA_TIMEZONE;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::debug;

static RETURNING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bRETURNING\b").expect("valid returning regex"));

static DATE_SUB_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)DATE_SUB\(\s*NOW\(\)\s*,\s*INTERVAL\s+(\d+)\s+(MINUTE|HOUR|DAY)S?\s*\)")
        .expect("valid date_sub regex")
});

static LIMIT_OFFSET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bLIMIT\s+(\d+)\s*,\s*(\d+)").expect("valid limit regex"));

static TSDIFF_AS_OF_NOW_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)TIMESTAMPDIFF\(\s*MINUTE\s*,\s*([^,]+?)\s*,\s*CURRENT_TIMESTAMP\s*\)")
        .expect("valid timestampdiff-now regex")
});

static TSDIFF_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)TIMESTAMPDIFF\(\s*(MINUTE|HOUR|DAY|SECOND)\s*,\s*([^,]+?)\s*,\s*([^,()]+?)\s*\)")
        .expect("valid timestampdiff regex")
});

static CURRENT_TIMESTAMP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bCURRENT_TIMESTAMP\b").expect("valid current_timestamp regex"));

/// SQL expression for the current instant in the application's fixed zone.
fn now_in_zone() -> String {
    format!("NOW() AT TIME ZONE '{}'", ARGENTINA_TIMEZONE)
}

/// Translate a MySQL-convention statement into its PostgreSQL equivalent.
///
/// Pure and deterministic; the parameter list passes through untouched
/// (the target dialect binds the same scalars, just under `$n` names).
pub fn translate(stmt: &Statement) -> Statement {
    let kind = stmt.kind();

    let mut sql = renumber_placeholders(&stmt.sql);
    sql = inject_returning(sql, &kind);
    sql = DATE_SUB_RE
        .replace_all(&sql, |caps: &Captures| {
            let n = &caps[1];
            let unit = match caps[2].to_ascii_uppercase().as_str() {
                "MINUTE" => "minutes",
                "HOUR" => "hours",
                _ => "days",
            };
            format!("NOW() - INTERVAL '{} {}'", n, unit)
        })
        .into_owned();
    sql = LIMIT_OFFSET_RE
        .replace_all(&sql, "LIMIT $2 OFFSET $1")
        .into_owned();
    sql = normalize_string_literals(&sql);
    sql = rewrite_timestampdiff(&sql);
    sql = CURRENT_TIMESTAMP_RE
        .replace_all(&sql, now_in_zone().as_str())
        .into_owned();

    Statement::with_params(sql, stmt.params.clone())
}

/// Replace each positional `?` outside quoted regions with `$1..$k`,
/// left to right. Already-translated text contains no bare `?`, so the
/// rule cannot double-apply.
fn renumber_placeholders(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut next = 0usize;
    let mut in_single = false;
    let mut in_double = false;

    for c in sql.chars() {
        match c {
            '\'' if !in_double => {
                in_single = !in_single;
                out.push(c);
            }
            '"' if !in_single => {
                in_double = !in_double;
                out.push(c);
            }
            '?' if !in_single && !in_double => {
                next += 1;
                out.push('$');
                out.push_str(&next.to_string());
            }
            _ => out.push(c),
        }
    }
    out
}

/// Append `RETURNING <id column>` to inserts that do not already request
/// returned columns. Unknown or unparseable table names degrade to the
/// generic identifier column rather than erroring.
fn inject_returning(sql: String, kind: &StatementKind) -> String {
    let StatementKind::Insert { table } = kind else {
        return sql;
    };
    if RETURNING_RE.is_match(&sql) {
        return sql;
    }

    let id_column = match table {
        Some(t) => id_column_for(t),
        None => {
            debug!(sql = %sql, "Translation degraded: INSERT table not parseable, using default identifier");
            DEFAULT_ID_COLUMN
        }
    };

    let trimmed = sql.trim_end().trim_end_matches(';').trim_end();
    format!("{} RETURNING {}", trimmed, id_column)
}

static TSDIFF_DIVISORS: &[(&str, u32)] = &[("MINUTE", 60), ("HOUR", 3600), ("DAY", 86400)];

fn rewrite_timestampdiff(sql: &str) -> String {
    // The as-of-now form first: its right operand is the raw
    // CURRENT_TIMESTAMP token, evaluated in the fixed application zone so
    // the minute count does not depend on the session timezone.
    let sql = TSDIFF_AS_OF_NOW_RE.replace_all(sql, |caps: &Captures| {
        format!(
            "FLOOR(EXTRACT(EPOCH FROM ({} - {}))/60)",
            now_in_zone(),
            &caps[1]
        )
    });

    TSDIFF_RE
        .replace_all(&sql, |caps: &Captures| {
            let start = &caps[2];
            let end = &caps[3];
            let unit = caps[1].to_ascii_uppercase();
            match TSDIFF_DIVISORS.iter().find(|(u, _)| *u == unit) {
                Some((_, divisor)) => format!(
                    "FLOOR(EXTRACT(EPOCH FROM ({} - {}))/{})",
                    end, start, divisor
                ),
                // SECOND: epoch difference truncated, no divisor
                None => format!("FLOOR(EXTRACT(EPOCH FROM ({} - {})))", end, start),
            }
        })
        .into_owned()
}

/// Convert double-quoted string *literals* to single-quoted ones, leaving
/// double-quoted *identifiers* untouched.
///
/// A double-quoted region counts as a literal only when the preceding
/// significant token puts it in value position (comparison operator, opening
/// parenthesis, comma, or a value-introducing keyword). After FROM, JOIN,
/// AS, a dot, a boolean connective, or at statement start it is an
/// identifier: the operand right after AND/OR/NOT is almost always a column
/// reference, with the comparison operator between it and any literal.
fn normalize_string_literals(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut prev_token = String::new();
    // The AND that closes a BETWEEN range introduces the high operand, unlike
    // a bare boolean AND whose right side is a column reference.
    let mut between_pending = false;
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' => {
                // copy a single-quoted literal verbatim, honoring '' escapes
                out.push(c);
                while let Some(c2) = chars.next() {
                    out.push(c2);
                    if c2 == '\'' {
                        if chars.peek() == Some(&'\'') {
                            out.push(chars.next().expect("peeked"));
                        } else {
                            break;
                        }
                    }
                }
                prev_token = "'".to_string();
            }
            '"' => {
                let mut content = String::new();
                let mut closed = false;
                for c2 in chars.by_ref() {
                    if c2 == '"' {
                        closed = true;
                        break;
                    }
                    content.push(c2);
                }
                if closed && in_value_position(&prev_token) {
                    out.push('\'');
                    out.push_str(&content.replace('\'', "''"));
                    out.push('\'');
                    prev_token = "'".to_string();
                } else {
                    out.push('"');
                    out.push_str(&content);
                    if closed {
                        out.push('"');
                    }
                    prev_token = "\"".to_string();
                }
            }
            c if c.is_ascii_alphanumeric() || c == '_' || c == '$' => {
                let mut word = String::new();
                word.push(c);
                while let Some(&c2) = chars.peek() {
                    if c2.is_ascii_alphanumeric() || c2 == '_' || c2 == '$' {
                        word.push(c2);
                        chars.next();
                    } else {
                        break;
                    }
                }
                out.push_str(&word);
                let upper = word.to_ascii_uppercase();
                prev_token = if upper == "AND" && between_pending {
                    between_pending = false;
                    "BETWEEN_AND".to_string()
                } else {
                    if upper == "BETWEEN" {
                        between_pending = true;
                    }
                    upper
                };
            }
            c if c.is_whitespace() => out.push(c),
            _ => {
                out.push(c);
                prev_token = c.to_string();
            }
        }
    }
    out
}

fn in_value_position(prev_token: &str) -> bool {
    matches!(
        prev_token,
        "=" | "<"
            | ">"
            | "!"
            | "("
            | ","
            | "LIKE"
            | "IN"
            | "VALUES"
            | "THEN"
            | "ELSE"
            | "WHEN"
            | "BETWEEN"
            | "BETWEEN_AND"
    )
}

/// Count bare positional placeholders in legacy text (outside quotes).
pub fn placeholder_count(sql: &str) -> usize {
    let mut count = 0;
    let mut in_single = false;
    let mut in_double = false;
    for c in sql.chars() {
        match c {
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            '?' if !in_single && !in_double => count += 1,
            _ => {}
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::statement::QueryParam;

    fn t(sql: &str) -> String {
        translate(&Statement::new(sql)).sql
    }

    #[test]
    fn test_placeholder_renumbering_left_to_right() {
        let stmt = Statement::with_params(
            "SELECT * FROM vehiculos WHERE id_empresa = ? AND placa = ? AND activo = ?",
            vec![
                QueryParam::Int(1),
                QueryParam::from("ABC123"),
                QueryParam::Bool(true),
            ],
        );
        let out = translate(&stmt);
        assert_eq!(
            out.sql,
            "SELECT * FROM vehiculos WHERE id_empresa = $1 AND placa = $2 AND activo = $3"
        );
        assert_eq!(out.params, stmt.params);
    }

    #[test]
    fn test_placeholder_inside_literal_untouched() {
        let out = t("SELECT * FROM vehiculos WHERE placa = '?' AND tipo = ?");
        assert_eq!(
            out,
            "SELECT * FROM vehiculos WHERE placa = '?' AND tipo = $1"
        );
    }

    #[test]
    fn test_returning_injected_with_mapped_id_column() {
        let out = t("INSERT INTO vehiculos (id_empresa, placa) VALUES (?, ?)");
        assert_eq!(
            out,
            "INSERT INTO vehiculos (id_empresa, placa) VALUES ($1, $2) RETURNING id_vehiculo"
        );
    }

    #[test]
    fn test_returning_injection_skipped_when_present() {
        let sql = "INSERT INTO vehiculos (placa) VALUES (?) RETURNING id_vehiculo";
        let out = t(sql);
        assert_eq!(out.matches("RETURNING").count(), 1);
    }

    #[test]
    fn test_returning_unknown_table_uses_default() {
        let out = t("INSERT INTO reportes (nombre) VALUES (?)");
        assert!(out.ends_with("RETURNING id"));
    }

    #[test]
    fn test_returning_injected_before_trailing_semicolon() {
        let out = t("INSERT INTO pagos (monto) VALUES (?);");
        assert_eq!(out, "INSERT INTO pagos (monto) VALUES ($1) RETURNING id_pago");
    }

    #[test]
    fn test_date_sub_minutes() {
        let out = t("SELECT * FROM login_attempts WHERE fecha > DATE_SUB(NOW(), INTERVAL 15 MINUTE)");
        assert!(out.contains("NOW() - INTERVAL '15 minutes'"));
        assert!(!out.contains("DATE_SUB"));
    }

    #[test]
    fn test_date_sub_hours_and_days() {
        assert!(t("SELECT DATE_SUB(NOW(), INTERVAL 2 HOUR)").contains("NOW() - INTERVAL '2 hours'"));
        assert!(t("SELECT DATE_SUB(NOW(), INTERVAL 7 DAY)").contains("NOW() - INTERVAL '7 days'"));
    }

    #[test]
    fn test_limit_offset_transposition() {
        // MySQL LIMIT 10,5 means: skip 10, take 5
        let out = t("SELECT * FROM movimientos ORDER BY fecha_entrada DESC LIMIT 10,5");
        assert!(out.ends_with("LIMIT 5 OFFSET 10"));
    }

    #[test]
    fn test_limit_without_offset_untouched() {
        let out = t("SELECT activo FROM vehiculos LIMIT 1");
        assert!(out.ends_with("LIMIT 1"));
    }

    #[test]
    fn test_double_quoted_literal_normalized() {
        let out = t(r#"SELECT * FROM vehiculos WHERE tipo = "moto""#);
        assert!(out.ends_with("tipo = 'moto'"));
    }

    #[test]
    fn test_double_quoted_identifier_preserved() {
        let out = t(r#"SELECT "FechaEntrada" FROM movimientos"#);
        assert!(out.contains(r#""FechaEntrada""#));
    }

    #[test]
    fn test_quoted_literal_in_values_and_in_list() {
        let out = t(r#"INSERT INTO pagos (metodo) VALUES ("efectivo")"#);
        assert!(out.contains("('efectivo')"));

        let out = t(r#"SELECT * FROM vehiculos WHERE tipo IN ("auto", "moto")"#);
        assert!(out.contains("IN ('auto', 'moto')"));
    }

    #[test]
    fn test_quoted_identifier_after_boolean_connective_preserved() {
        let out = t(r#"SELECT * FROM vehiculos WHERE activo = TRUE AND "Tipo" = "moto""#);
        assert!(out.contains(r#"AND "Tipo" = 'moto'"#), "got: {out}");

        let out = t(r#"SELECT * FROM movimientos WHERE cerrado OR "Estado" = "activo""#);
        assert!(out.contains(r#"OR "Estado" = 'activo'"#), "got: {out}");
    }

    #[test]
    fn test_between_range_normalizes_both_operands() {
        let out =
            t(r#"SELECT * FROM pagos WHERE fecha BETWEEN "2024-01-01" AND "2024-01-31""#);
        assert!(
            out.ends_with("BETWEEN '2024-01-01' AND '2024-01-31'"),
            "got: {out}"
        );
    }

    #[test]
    fn test_quoted_literal_with_embedded_single_quote() {
        let out = t(r#"SELECT * FROM usuarios WHERE nombre = "O'Brien""#);
        assert!(out.ends_with("nombre = 'O''Brien'"));
    }

    #[test]
    fn test_timestampdiff_minute() {
        let out = t("SELECT TIMESTAMPDIFF(MINUTE, fecha_entrada, fecha_salida) FROM movimientos");
        assert!(out.contains("FLOOR(EXTRACT(EPOCH FROM (fecha_salida - fecha_entrada))/60)"));
    }

    #[test]
    fn test_timestampdiff_units() {
        assert!(t("SELECT TIMESTAMPDIFF(HOUR, a, b)").contains("/3600)"));
        assert!(t("SELECT TIMESTAMPDIFF(DAY, a, b)").contains("/86400)"));
        let secs = t("SELECT TIMESTAMPDIFF(SECOND, a, b)");
        assert!(secs.contains("FLOOR(EXTRACT(EPOCH FROM (b - a)))"));
        assert!(!secs.contains("))/"));
    }

    #[test]
    fn test_timestampdiff_as_of_now_pins_zone() {
        let out =
            t("SELECT TIMESTAMPDIFF(MINUTE, fecha_entrada, CURRENT_TIMESTAMP) FROM movimientos");
        assert!(out.contains(
            "FLOOR(EXTRACT(EPOCH FROM (NOW() AT TIME ZONE 'America/Argentina/Buenos_Aires' - fecha_entrada))/60)"
        ));
    }

    #[test]
    fn test_current_timestamp_rewritten() {
        let out = t("UPDATE tarifas SET fecha_vigencia_hasta = CURRENT_TIMESTAMP WHERE id_tarifa = ?");
        assert!(out.contains("NOW() AT TIME ZONE 'America/Argentina/Buenos_Aires'"));
        assert!(!out.contains("CURRENT_TIMESTAMP"));
    }

    #[test]
    fn test_pipeline_stable_on_translated_text() {
        let first = translate(&Statement::new(
            "INSERT INTO tarifas (nombre, fecha_vigencia_desde) VALUES (?, CURRENT_TIMESTAMP)",
        ));
        let second = translate(&first);
        assert_eq!(first.sql, second.sql);
    }

    #[test]
    fn test_placeholder_count() {
        assert_eq!(placeholder_count("SELECT ?"), 1);
        assert_eq!(placeholder_count("SELECT '?' WHERE a = ? AND b = ?"), 2);
        assert_eq!(placeholder_count("SELECT 1"), 0);
    }

    #[test]
    fn test_combined_insert_from_tarifas_route() {
        // Shape taken from the tariff-versioning call site.
        let stmt = Statement::with_params(
            "INSERT INTO tarifas (id_empresa, nombre, precio_hora, fecha_vigencia_desde, activa) \
             VALUES (?, ?, ?, CURRENT_TIMESTAMP, TRUE)",
            vec![
                QueryParam::Int(3),
                QueryParam::from("diurna"),
                QueryParam::Float(1500.0),
            ],
        );
        let out = translate(&stmt).sql;
        assert!(out.contains("VALUES ($1, $2, $3,"));
        assert!(out.contains("NOW() AT TIME ZONE 'America/Argentina/Buenos_Aires'"));
        assert!(out.ends_with("RETURNING id_tarifa"));
    }
}
