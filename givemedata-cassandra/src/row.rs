//! Conversion of CQL values into driver-neutral cells.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime};
use scylla::frame::response::result::{CqlValue, Row};
use serde_json::{Map, Number, Value};

/// Days offset of the Unix epoch in the CQL `date` encoding.
const CQL_DATE_EPOCH: i64 = 1 << 31;

/// Convert an optional CQL value (a null cell is `None`) to JSON.
pub fn cell_to_json(value: Option<&CqlValue>) -> Value {
    value.map_or(Value::Null, cql_to_json)
}

/// Convert a CQL value to the closest JSON value.
pub fn cql_to_json(value: &CqlValue) -> Value {
    match value {
        CqlValue::Empty => Value::Null,
        CqlValue::Boolean(v) => Value::Bool(*v),
        CqlValue::TinyInt(v) => (*v).into(),
        CqlValue::SmallInt(v) => (*v).into(),
        CqlValue::Int(v) => (*v).into(),
        CqlValue::BigInt(v) => (*v).into(),
        CqlValue::Counter(v) => v.0.into(),
        CqlValue::Float(v) => float(f64::from(*v)),
        CqlValue::Double(v) => float(*v),
        CqlValue::Text(v) | CqlValue::Ascii(v) => Value::String(v.clone()),
        CqlValue::Blob(v) => Value::String(blob_literal(v)),
        CqlValue::Uuid(v) => Value::String(v.to_string()),
        CqlValue::Timeuuid(v) => Value::String(uuid::Uuid::from(*v).to_string()),
        CqlValue::Inet(v) => Value::String(v.to_string()),
        CqlValue::Timestamp(ts) => DateTime::from_timestamp_millis(ts.0)
            .map_or(Value::Null, |dt| Value::String(dt.to_rfc3339())),
        CqlValue::Date(d) => NaiveDate::from_ymd_opt(1970, 1, 1)
            .and_then(|epoch| {
                epoch.checked_add_signed(Duration::days(i64::from(d.0) - CQL_DATE_EPOCH))
            })
            .map_or(Value::Null, |date| Value::String(date.to_string())),
        CqlValue::Time(t) => {
            let secs = u32::try_from(t.0 / 1_000_000_000).ok();
            let nanos = u32::try_from(t.0 % 1_000_000_000).ok();
            secs.zip(nanos)
                .and_then(|(s, n)| NaiveTime::from_num_seconds_from_midnight_opt(s, n))
                .map_or(Value::Null, |time| Value::String(time.to_string()))
        }
        CqlValue::Duration(v) => {
            Value::String(format!("{}mo{}d{}ns", v.months, v.days, v.nanoseconds))
        }
        CqlValue::List(items) | CqlValue::Set(items) => {
            Value::Array(items.iter().map(cql_to_json).collect())
        }
        CqlValue::Tuple(items) => {
            Value::Array(items.iter().map(|item| cell_to_json(item.as_ref())).collect())
        }
        CqlValue::Map(entries) => Value::Object(
            entries
                .iter()
                .map(|(k, v)| (map_key(k), cql_to_json(v)))
                .collect::<Map<String, Value>>(),
        ),
        CqlValue::UserDefinedType { fields, .. } => Value::Object(
            fields
                .iter()
                .map(|(name, v)| (name.clone(), cell_to_json(v.as_ref())))
                .collect(),
        ),
        other => Value::String(format!("{other:?}")),
    }
}

/// Convert every cell of a row.
pub fn row_to_json(row: &Row) -> Vec<Value> {
    row.columns.iter().map(|c| cell_to_json(c.as_ref())).collect()
}

fn float(v: f64) -> Value {
    Number::from_f64(v).map_or(Value::Null, Value::Number)
}

fn map_key(key: &CqlValue) -> String {
    match cql_to_json(key) {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

fn blob_literal(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(2 + bytes.len() * 2);
    out.push_str("0x");
    for b in bytes {
        out.push_str(&format!("{b:02x}"));
    }
    out
}
