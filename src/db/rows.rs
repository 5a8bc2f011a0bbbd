//! Row decoding into the legacy record shape.
//!
//! Type conversion uses a two-phase approach: [`TypeCategory`] classifies
//! the column type, then a decoder extracts the value into `serde_json`.
//! DECIMAL/NUMERIC columns are preserved as strings so monetary amounts
//! (tariff prices, payment totals) never pass through binary floats.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::postgres::{PgRow, PgTypeInfo, PgValueRef};
use sqlx::{Column, Decode, Row, Type, TypeInfo};

/// Logical category for column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    Integer,
    Float,
    Decimal,
    Boolean,
    Binary,
    Json,
    Uuid,
    Text,
}

/// Classify a PostgreSQL type name into a logical category.
pub fn categorize_type(type_name: &str) -> TypeCategory {
    let lower = type_name.to_lowercase();

    if lower.contains("numeric") || lower.contains("decimal") {
        return TypeCategory::Decimal;
    }
    if lower.contains("int") || lower.contains("serial") {
        return TypeCategory::Integer;
    }
    if lower == "bool" || lower == "boolean" {
        return TypeCategory::Boolean;
    }
    if lower.contains("float") || lower == "real" || lower == "float4" || lower == "float8" {
        return TypeCategory::Float;
    }
    if lower == "json" || lower == "jsonb" {
        return TypeCategory::Json;
    }
    if lower == "uuid" {
        return TypeCategory::Uuid;
    }
    if lower == "bytea" {
        return TypeCategory::Binary;
    }
    // varchar, text, char, date, time, timestamp, interval, ...
    TypeCategory::Text
}

/// Wrapper type for raw NUMERIC values as strings, preserving the exact
/// database representation.
#[derive(Debug)]
pub struct RawDecimal(pub String);

impl Type<sqlx::Postgres> for RawDecimal {
    fn type_info() -> PgTypeInfo {
        <String as Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &PgTypeInfo) -> bool {
        let name = ty.name().to_lowercase();
        name.contains("numeric") || name.contains("decimal")
    }
}

impl<'r> Decode<'r, sqlx::Postgres> for RawDecimal {
    fn decode(value: PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as Decode<sqlx::Postgres>>::decode(value)?;
        Ok(RawDecimal(s.to_string()))
    }
}

/// Column descriptor in the legacy result's secondary slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnMetadata {
    pub name: String,
    /// PostgreSQL type name (e.g. "int8", "varchar", "timestamptz")
    pub type_name: String,
    pub nullable: bool,
}

impl ColumnMetadata {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>, nullable: bool) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            nullable,
        }
    }
}

/// Decode a row into an ordered field-name -> value map.
pub fn row_to_map(row: &PgRow) -> serde_json::Map<String, JsonValue> {
    row.columns()
        .iter()
        .enumerate()
        .map(|(idx, col)| {
            let category = categorize_type(col.type_info().name());
            (col.name().to_string(), decode_column(row, idx, category))
        })
        .collect()
}

/// Column descriptors for a row.
pub fn column_metadata(row: &PgRow) -> Vec<ColumnMetadata> {
    row.columns()
        .iter()
        .map(|col| {
            ColumnMetadata::new(
                col.name(),
                col.type_info().name(),
                !col.type_info().is_null(),
            )
        })
        .collect()
}

fn decode_column(row: &PgRow, idx: usize, category: TypeCategory) -> JsonValue {
    match category {
        TypeCategory::Decimal => decode_decimal(row, idx),
        TypeCategory::Integer => decode_integer(row, idx),
        TypeCategory::Boolean => decode_boolean(row, idx),
        TypeCategory::Float => decode_float(row, idx),
        TypeCategory::Binary => decode_binary(row, idx),
        TypeCategory::Json => decode_json(row, idx),
        TypeCategory::Uuid | TypeCategory::Text => decode_text(row, idx),
    }
}

fn decode_decimal(row: &PgRow, idx: usize) -> JsonValue {
    match row.try_get::<Option<RawDecimal>, _>(idx) {
        Ok(Some(v)) => JsonValue::String(v.0),
        Ok(None) => JsonValue::Null,
        Err(e) => {
            tracing::error!("Failed to decode NUMERIC: {:?}", e);
            JsonValue::Null
        }
    }
}

fn decode_integer(row: &PgRow, idx: usize) -> JsonValue {
    if let Ok(None) = row.try_get::<Option<i64>, _>(idx) {
        return JsonValue::Null;
    }
    if let Ok(Some(v)) = row.try_get::<Option<i16>, _>(idx) {
        return JsonValue::Number(v.into());
    }
    if let Ok(Some(v)) = row.try_get::<Option<i32>, _>(idx) {
        return JsonValue::Number(v.into());
    }
    if let Ok(Some(v)) = row.try_get::<Option<i64>, _>(idx) {
        return JsonValue::Number(v.into());
    }
    JsonValue::Null
}

fn decode_boolean(row: &PgRow, idx: usize) -> JsonValue {
    row.try_get::<Option<bool>, _>(idx)
        .ok()
        .flatten()
        .map(JsonValue::Bool)
        .unwrap_or(JsonValue::Null)
}

fn decode_float(row: &PgRow, idx: usize) -> JsonValue {
    if let Ok(Some(v)) = row.try_get::<Option<f64>, _>(idx) {
        return serde_json::Number::from_f64(v)
            .map(JsonValue::Number)
            .unwrap_or_else(|| JsonValue::String(v.to_string()));
    }
    if let Ok(Some(v)) = row.try_get::<Option<f32>, _>(idx) {
        return serde_json::Number::from_f64(v as f64)
            .map(JsonValue::Number)
            .unwrap_or_else(|| JsonValue::String(v.to_string()));
    }
    JsonValue::Null
}

fn decode_binary(row: &PgRow, idx: usize) -> JsonValue {
    row.try_get::<Option<Vec<u8>>, _>(idx)
        .ok()
        .flatten()
        .map(|v| JsonValue::String(STANDARD.encode(v)))
        .unwrap_or(JsonValue::Null)
}

fn decode_json(row: &PgRow, idx: usize) -> JsonValue {
    row.try_get::<Option<serde_json::Value>, _>(idx)
        .ok()
        .flatten()
        .unwrap_or(JsonValue::Null)
}

fn decode_text(row: &PgRow, idx: usize) -> JsonValue {
    row.try_get::<Option<String>, _>(idx)
        .ok()
        .flatten()
        .map(JsonValue::String)
        .unwrap_or(JsonValue::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorize_integer() {
        assert_eq!(categorize_type("INT4"), TypeCategory::Integer);
        assert_eq!(categorize_type("int8"), TypeCategory::Integer);
        assert_eq!(categorize_type("serial"), TypeCategory::Integer);
    }

    #[test]
    fn test_categorize_decimal_wins_over_text() {
        assert_eq!(categorize_type("NUMERIC"), TypeCategory::Decimal);
        assert_eq!(categorize_type("numeric(10,2)"), TypeCategory::Decimal);
    }

    #[test]
    fn test_categorize_timestamp_is_text() {
        assert_eq!(categorize_type("timestamptz"), TypeCategory::Text);
        assert_eq!(categorize_type("timestamp"), TypeCategory::Text);
        assert_eq!(categorize_type("varchar"), TypeCategory::Text);
    }

    #[test]
    fn test_categorize_misc() {
        assert_eq!(categorize_type("bool"), TypeCategory::Boolean);
        assert_eq!(categorize_type("float8"), TypeCategory::Float);
        assert_eq!(categorize_type("jsonb"), TypeCategory::Json);
        assert_eq!(categorize_type("bytea"), TypeCategory::Binary);
        assert_eq!(categorize_type("uuid"), TypeCategory::Uuid);
    }
}
