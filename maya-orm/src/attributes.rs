//! # Attribute Container
//!
//! Per-record property bag. Declared columns and columns that only exist in a
//! result set live side by side; reading an attribute that was never set
//! yields [`Value::Null`] rather than an error.
//!
//! Casts describe how a column moves between its in-memory form and its
//! storage form:
//!
//! | cast       | in memory             | storage                  |
//! |------------|-----------------------|--------------------------|
//! | `int`      | `Value::Int`          | integer                  |
//! | `float`    | `Value::Float`        | double                   |
//! | `bool`     | `Value::Bool`         | `0` / `1`                |
//! | `string`   | `Value::Text`         | text                     |
//! | `json`     | `Value::Json`         | JSON text                |
//! | `datetime` | `Value::DateTime`     | `YYYY-MM-DD HH:MM:SS`    |

use std::collections::HashMap;
use std::str::FromStr;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::{Error, Value, temporal};

// ============================================================================
// Cast
// ============================================================================

/// Declared encode/decode transform for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cast {
    Int,
    Float,
    Bool,
    String,
    Json,
    DateTime,
}

impl FromStr for Cast {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "int" | "integer" => Ok(Cast::Int),
            "float" | "double" | "real" => Ok(Cast::Float),
            "bool" | "boolean" => Ok(Cast::Bool),
            "string" | "text" => Ok(Cast::String),
            "json" | "array" | "object" => Ok(Cast::Json),
            "datetime" | "timestamp" => Ok(Cast::DateTime),
            other => Err(Error::Conversion(format!("Unknown cast `{}`", other))),
        }
    }
}

impl Cast {
    /// Moves a caller-supplied value into its in-memory form.
    ///
    /// `Null` always passes through untouched.
    pub fn coerce(self, value: Value) -> Result<Value, Error> {
        if value.is_null() {
            return Ok(value);
        }

        let coerced = match (self, value) {
            (Cast::Int, v) => Value::Int(v.as_i64().ok_or_else(|| cast_error(self, &v))?),
            (Cast::Float, v) => Value::Float(v.as_f64().ok_or_else(|| cast_error(self, &v))?),
            (Cast::Bool, v) => Value::Bool(<bool as crate::FromValue>::from_value(&v)?),
            (Cast::String, Value::Text(s)) => Value::Text(s),
            (Cast::String, v) => Value::Text(v.to_string()),
            (Cast::Json, Value::Text(s)) => Value::Json(serde_json::from_str(&s)?),
            (Cast::Json, Value::Json(j)) => Value::Json(j),
            (Cast::Json, v) => Value::Json(<serde_json::Value as crate::FromValue>::from_value(&v)?),
            (Cast::DateTime, Value::Text(s)) => Value::DateTime(temporal::parse_datetime(&s)?),
            (Cast::DateTime, v @ Value::DateTime(_)) => v,
            (Cast::DateTime, v) => return Err(cast_error(self, &v)),
        };

        Ok(coerced)
    }

    /// Storage form bound to a placeholder.
    pub fn encode(self, value: &Value) -> Result<Value, Error> {
        let coerced = self.coerce(value.clone())?;

        Ok(match coerced {
            Value::Bool(b) => Value::Int(b as i64),
            Value::Json(j) => Value::Text(serde_json::to_string(&j)?),
            Value::DateTime(dt) => Value::Text(temporal::format_datetime(&dt)),
            other => other,
        })
    }

    /// In-memory form of a value read back from a row.
    pub fn decode(self, value: Value) -> Result<Value, Error> {
        self.coerce(value)
    }
}

fn cast_error(cast: Cast, value: &Value) -> Error {
    Error::Conversion(format!("Cannot cast {} value `{}` to {:?}", value.kind(), value, cast))
}

// ============================================================================
// Attributes
// ============================================================================

/// Mapping from column name to value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    values: HashMap<String, Value>,
}

static NULL: Value = Value::Null;

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads an attribute; absent columns read as `Null`.
    pub fn get(&self, name: &str) -> &Value {
        self.values.get(name).unwrap_or(&NULL)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.values.remove(name)
    }

    /// Whether the attribute holds a non-null value.
    pub fn is_set(&self, name: &str) -> bool {
        !self.get(name).is_null()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    /// Copy of the container without the `hidden` columns.
    pub fn visible(&self, hidden: &[&str]) -> Attributes {
        let values = self
            .values
            .iter()
            .filter(|(k, _)| !hidden.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Attributes { values }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let values = iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        Attributes { values }
    }
}

impl Serialize for Attributes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut keys: Vec<&String> = self.values.keys().collect();
        keys.sort();

        let mut map = serializer.serialize_map(Some(keys.len()))?;
        for key in keys {
            map.serialize_entry(key, &self.values[key])?;
        }
        map.end()
    }
}

// ============================================================================
// Tests
// ============================================================================
