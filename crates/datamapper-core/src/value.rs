//! Scalar values exchanged between rows and domain objects
//!
//! `Value` mirrors the storage classes of a relational row (null, integer,
//! real, text, blob). Domain objects convert their typed fields to and from
//! `Value` through the accessors registered in their `Schema`.

use crate::errors::{DataMapperError, ExError};
use base64::Engine;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Property name -> value mapping (the object side)
pub type PropertyMap = BTreeMap<String, Value>;

/// Column name -> value mapping (the row side)
pub type RawRow = BTreeMap<String, Value>;

/// A single scalar value; `Null` is the absence value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Name of the storage class, used in type mismatch errors
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Integer(_) => "integer",
            Value::Real(_) => "real",
            Value::Text(_) => "text",
            Value::Blob(_) => "blob",
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Render the value for log fields and error messages
    pub fn display(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Integer(i) => i.to_string(),
            Value::Real(r) => r.to_string(),
            Value::Text(s) => s.clone(),
            Value::Blob(b) => format!("<{} bytes>", b.len()),
        }
    }

    fn mismatch(&self, expected: &'static str) -> ExError {
        DataMapperError::TypeMismatch {
            expected,
            actual: self.type_name(),
        }
        .into()
    }
}

// Blobs have no JSON counterpart; they serialize as base64 text.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Real(r) => serializer.serialize_f64(*r),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Blob(b) => {
                serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(b))
            }
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v.into())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Integer(if v { 1 } else { 0 })
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Blob(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Conversion from a `Value` into a typed field
///
/// Implemented for the scalar field types; `Option<T>` accepts `Null` as `None`.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, ExError>;
}

impl FromValue for i64 {
    fn from_value(value: Value) -> Result<Self, ExError> {
        match value {
            Value::Integer(i) => Ok(i),
            other => Err(other.mismatch("integer")),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, ExError> {
        match value {
            Value::Integer(i) => Ok(i != 0),
            other => Err(other.mismatch("boolean")),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, ExError> {
        match value {
            Value::Real(r) => Ok(r),
            Value::Integer(i) => Ok(i as f64),
            other => Err(other.mismatch("real")),
        }
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, ExError> {
        match value {
            Value::Text(s) => Ok(s),
            other => Err(other.mismatch("text")),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: Value) -> Result<Self, ExError> {
        match value {
            Value::Blob(b) => Ok(b),
            other => Err(other.mismatch("blob")),
        }
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, ExError> {
        Ok(value)
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, ExError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl Value {
    /// Convert into a typed field value
    ///
    /// ```
    /// use datamapper_core::Value;
    ///
    /// let name: String = Value::from("Ada").extract().unwrap();
    /// assert_eq!(name, "Ada");
    /// ```
    pub fn extract<T: FromValue>(self) -> Result<T, ExError> {
        T::from_value(self)
    }
}
