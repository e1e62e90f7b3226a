//! Conversion of PostgreSQL rows into driver-neutral cells.
//!
//! Ad-hoc queries can return any column type, so [`PgCell`] accepts every
//! type and maps it to the closest JSON value. Types without a dedicated
//! mapping fall back to their text form when it is valid UTF-8, and to
//! `null` otherwise.

use std::error::Error;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use givemedata_core::RowSet;
use postgres_types::{FromSql, Kind, Type};
use rust_decimal::Decimal;
use serde_json::{Number, Value};
use tokio_postgres::{Column, Row};

use crate::error::{PgError, PgResult};

type FromSqlError = Box<dyn Error + Sync + Send>;

/// A single cell of any PostgreSQL type.
#[derive(Debug, Clone, PartialEq)]
pub struct PgCell(pub Value);

impl<'a> FromSql<'a> for PgCell {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, FromSqlError> {
        cell_from_sql(ty, raw).map(PgCell)
    }

    fn from_sql_null(_: &Type) -> Result<Self, FromSqlError> {
        Ok(PgCell(Value::Null))
    }

    fn accepts(_: &Type) -> bool {
        true
    }
}

fn float(v: f64) -> Value {
    Number::from_f64(v).map_or(Value::Null, Value::Number)
}

fn cell_from_sql(ty: &Type, raw: &[u8]) -> Result<Value, FromSqlError> {
    match ty.kind() {
        Kind::Domain(inner) => return cell_from_sql(inner, raw),
        Kind::Array(_) => {
            let items = Vec::<PgCell>::from_sql(ty, raw)?;
            return Ok(Value::Array(items.into_iter().map(|c| c.0).collect()));
        }
        _ => {}
    }

    let value = match *ty {
        Type::BOOL => Value::Bool(bool::from_sql(ty, raw)?),
        Type::INT2 => i16::from_sql(ty, raw)?.into(),
        Type::INT4 => i32::from_sql(ty, raw)?.into(),
        Type::INT8 => i64::from_sql(ty, raw)?.into(),
        Type::OID => u32::from_sql(ty, raw)?.into(),
        Type::FLOAT4 => float(f64::from(f32::from_sql(ty, raw)?)),
        Type::FLOAT8 => float(f64::from_sql(ty, raw)?),
        Type::NUMERIC => Value::String(Decimal::from_sql(ty, raw)?.to_string()),
        Type::JSON | Type::JSONB => Value::from_sql(ty, raw)?,
        Type::UUID => Value::String(uuid::Uuid::from_sql(ty, raw)?.to_string()),
        Type::DATE => Value::String(NaiveDate::from_sql(ty, raw)?.to_string()),
        Type::TIME => Value::String(NaiveTime::from_sql(ty, raw)?.to_string()),
        Type::TIMESTAMP => Value::String(NaiveDateTime::from_sql(ty, raw)?.to_string()),
        Type::TIMESTAMPTZ => Value::String(DateTime::<Utc>::from_sql(ty, raw)?.to_rfc3339()),
        Type::BYTEA => Value::String(hex(&Vec::<u8>::from_sql(ty, raw)?)),
        _ => match std::str::from_utf8(raw) {
            Ok(text) => Value::String(text.to_string()),
            Err(_) => Value::Null,
        },
    };
    Ok(value)
}

fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(2 + bytes.len() * 2);
    out.push_str("\\x");
    for b in bytes {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

/// Convert rows into a [`RowSet`] using `columns` for the header.
///
/// The header comes from the statement rather than the first row so that an
/// empty result still reports its columns.
pub fn to_rowset(columns: &[Column], rows: &[Row]) -> PgResult<RowSet> {
    let names: Vec<String> = columns.iter().map(|c| c.name().to_string()).collect();

    let cells = rows
        .iter()
        .map(|row| {
            (0..row.len())
                .map(|idx| {
                    row.try_get::<_, PgCell>(idx)
                        .map(|cell| cell.0)
                        .map_err(|e| PgError::Conversion {
                            column: names.get(idx).cloned().unwrap_or_default(),
                            message: e.to_string(),
                        })
                })
                .collect::<PgResult<Vec<Value>>>()
        })
        .collect::<PgResult<Vec<_>>>()?;

    Ok(RowSet::new(names, cells))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_scalar_cells() {
        assert_eq!(cell_from_sql(&Type::BOOL, &[1]).unwrap(), json!(true));
        assert_eq!(cell_from_sql(&Type::INT4, &42i32.to_be_bytes()).unwrap(), json!(42));
        assert_eq!(cell_from_sql(&Type::INT8, &(-7i64).to_be_bytes()).unwrap(), json!(-7));
        assert_eq!(cell_from_sql(&Type::FLOAT8, &1.5f64.to_be_bytes()).unwrap(), json!(1.5));
        assert_eq!(cell_from_sql(&Type::TEXT, b"hello").unwrap(), json!("hello"));
    }

    #[test]
    fn test_non_finite_float_is_null() {
        assert_eq!(
            cell_from_sql(&Type::FLOAT8, &f64::NAN.to_be_bytes()).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn test_unknown_type_falls_back_to_text() {
        assert_eq!(cell_from_sql(&Type::INET, b"not-binary").unwrap(), json!("not-binary"));
        assert_eq!(cell_from_sql(&Type::INET, &[0xff, 0xfe]).unwrap(), Value::Null);
    }

    #[test]
    fn test_bytea_hex() {
        assert_eq!(
            cell_from_sql(&Type::BYTEA, &[0xde, 0xad, 0x01]).unwrap(),
            json!("\\xdead01")
        );
    }

    #[test]
    fn test_null_cell() {
        assert_eq!(PgCell::from_sql_null(&Type::INT4).unwrap(), PgCell(Value::Null));
        assert!(<PgCell as FromSql>::accepts(&Type::INET));
    }
}
