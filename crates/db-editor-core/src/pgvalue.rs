//! Type-directed conversion between `serde_json::Value` and PostgreSQL
//! wire types, driven by the normalized `DataType` the extractor already
//! recorded for each column — mirrors the extractor's own type-matching
//! style in `schema::postgres`.

use base64::Engine;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{Postgres, Row};
use uuid::Uuid;

use crate::error::{DbEditorError, Result};
use crate::schema::types::DataType;

const ISO_DATE: &str = "%Y-%m-%d";

fn decode_err(column: &str, source: sqlx::Error) -> DbEditorError {
    DbEditorError::DriverError {
        operation: format!("decode column '{}'", column),
        source,
    }
}

/// Decode a single column of a fetched row into a JSON scalar, per its
/// normalized data type. Bytes become base64 strings, dates/timestamps
/// become ISO-8601, everything else maps to its natural JSON shape.
pub fn decode_column(row: &PgRow, column: &str, data_type: &DataType) -> Result<Value> {
    macro_rules! scalar {
        ($t:ty) => {{
            let v: Option<$t> = row.try_get(column).map_err(|e| decode_err(column, e))?;
            v.map(|v| serde_json::to_value(v).unwrap_or(Value::Null)).unwrap_or(Value::Null)
        }};
    }

    Ok(match data_type {
        DataType::SmallInt => scalar!(i16),
        DataType::Integer => scalar!(i32),
        DataType::BigInt => scalar!(i64),
        DataType::Float => scalar!(f32),
        DataType::Double | DataType::Numeric => scalar!(f64),
        DataType::Boolean => scalar!(bool),
        DataType::Uuid => scalar!(Uuid),
        DataType::Json | DataType::Jsonb => scalar!(Value),
        DataType::Date => {
            let v: Option<NaiveDate> = row.try_get(column).map_err(|e| decode_err(column, e))?;
            v.map(|d| Value::String(d.format(ISO_DATE).to_string())).unwrap_or(Value::Null)
        }
        DataType::Timestamp => {
            let v: Option<NaiveDateTime> = row.try_get(column).map_err(|e| decode_err(column, e))?;
            v.map(|d| Value::String(d.and_utc().to_rfc3339())).unwrap_or(Value::Null)
        }
        DataType::TimestampTz => {
            let v: Option<DateTime<Utc>> = row.try_get(column).map_err(|e| decode_err(column, e))?;
            v.map(|d| Value::String(d.to_rfc3339())).unwrap_or(Value::Null)
        }
        DataType::Binary => {
            let v: Option<Vec<u8>> = row.try_get(column).map_err(|e| decode_err(column, e))?;
            v.map(|bytes| Value::String(base64::engine::general_purpose::STANDARD.encode(bytes)))
                .unwrap_or(Value::Null)
        }
        DataType::Array(inner) => decode_array(row, column, inner)?,
        // VarChar, Text, Char, Enum, Unknown: the database renders these as text.
        _ => scalar!(String),
    })
}

fn decode_array(row: &PgRow, column: &str, inner: &DataType) -> Result<Value> {
    macro_rules! array {
        ($t:ty) => {{
            let v: Option<Vec<$t>> = row.try_get(column).map_err(|e| decode_err(column, e))?;
            v.map(|items| Value::Array(items.into_iter().map(|v| serde_json::to_value(v).unwrap_or(Value::Null)).collect()))
                .unwrap_or(Value::Null)
        }};
    }

    Ok(match inner {
        DataType::SmallInt => array!(i16),
        DataType::Integer => array!(i32),
        DataType::BigInt => array!(i64),
        DataType::Float => array!(f32),
        DataType::Double | DataType::Numeric => array!(f64),
        DataType::Boolean => array!(bool),
        DataType::Uuid => array!(Uuid),
        _ => array!(String),
    })
}

/// Bind a JSON value as the next positional parameter, coercing it to the
/// wire type the destination column expects.
pub fn bind_value<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &'q Value,
    data_type: &DataType,
) -> Query<'q, Postgres, PgArguments> {
    match data_type {
        DataType::SmallInt => query.bind(value.as_i64().map(|v| v as i16)),
        DataType::Integer => query.bind(value.as_i64().map(|v| v as i32)),
        DataType::BigInt => query.bind(value.as_i64()),
        DataType::Float => query.bind(value.as_f64().map(|v| v as f32)),
        DataType::Double | DataType::Numeric => query.bind(value.as_f64()),
        DataType::Boolean => query.bind(value.as_bool()),
        DataType::Uuid => query.bind(value.as_str().and_then(|s| Uuid::parse_str(s).ok())),
        DataType::Json | DataType::Jsonb => query.bind(value.clone()),
        DataType::Date => query.bind(value.as_str().and_then(|s| NaiveDate::parse_from_str(s, ISO_DATE).ok())),
        DataType::Timestamp => query.bind(value.as_str().and_then(parse_naive_instant)),
        DataType::TimestampTz => query.bind(value.as_str().and_then(parse_utc_instant)),
        DataType::Binary => {
            query.bind(value.as_str().and_then(|s| base64::engine::general_purpose::STANDARD.decode(s).ok()))
        }
        DataType::Array(inner) => bind_array(query, value, inner),
        _ => query.bind(value.as_str().map(|s| s.to_string())),
    }
}

fn bind_array<'q>(query: Query<'q, Postgres, PgArguments>, value: &'q Value, inner: &DataType) -> Query<'q, Postgres, PgArguments> {
    let items = value.as_array();
    match inner {
        DataType::SmallInt => query.bind(items.map(|a| a.iter().filter_map(|v| v.as_i64().map(|n| n as i16)).collect::<Vec<_>>())),
        DataType::Integer => query.bind(items.map(|a| a.iter().filter_map(|v| v.as_i64().map(|n| n as i32)).collect::<Vec<_>>())),
        DataType::BigInt => query.bind(items.map(|a| a.iter().filter_map(|v| v.as_i64()).collect::<Vec<_>>())),
        DataType::Boolean => query.bind(items.map(|a| a.iter().filter_map(|v| v.as_bool()).collect::<Vec<_>>())),
        _ => query.bind(items.map(|a| a.iter().map(|v| v.as_str().unwrap_or_default().to_string()).collect::<Vec<_>>())),
    }
}

fn parse_naive_instant(s: &str) -> Option<NaiveDateTime> {
    DateTime::parse_from_rfc3339(s).ok().map(|d| d.naive_utc()).or_else(|| {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").ok()
    })
}

fn parse_utc_instant(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s).ok().map(|d| d.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rfc3339_with_offset_as_utc_instant() {
        let parsed = parse_utc_instant("2024-01-01T00:00:00+00:00").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2024-01-01T00:00:00+00:00");
    }

    #[test]
    fn parses_rfc3339_z_suffix() {
        assert!(parse_utc_instant("2024-06-15T12:30:00Z").is_some());
    }

    #[test]
    fn rejects_non_instant_strings() {
        assert!(parse_utc_instant("not a date").is_none());
    }
}
