//! Conversion between SQLite values and `Value`

#![allow(clippy::result_large_err)]

use crate::errors::{from_rusqlite, Result};
use datamapper_core::{RawRow, Value};
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::Row;

/// Convert a bound parameter into its SQLite representation
pub fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Integer(i) => SqlValue::Integer(*i),
        Value::Real(r) => SqlValue::Real(*r),
        Value::Text(s) => SqlValue::Text(s.clone()),
        Value::Blob(b) => SqlValue::Blob(b.clone()),
    }
}

/// Convert one column of a fetched row
///
/// Text that is not valid UTF-8 is decoded lossily.
pub fn from_value_ref(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(r) => Value::Real(r),
        ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Blob(b.to_vec()),
    }
}

/// Read a whole row keyed by column name
pub fn read_row(row: &Row<'_>, columns: &[String]) -> Result<RawRow> {
    columns
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let value = row.get_ref(i).map_err(from_rusqlite)?;
            Ok((name.clone(), from_value_ref(value)))
        })
        .collect()
}
