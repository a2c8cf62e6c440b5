//! # Value Binding Module
//!
//! Moves [`Value`]s in and out of sqlx's `Any` driver.
//!
//! - [`ValueBinder`] binds values to `AnyArguments` positionally, in the same
//!   order as the `?` placeholders of the finalized statement.
//! - [`decode_row`] reads an `AnyRow` into an [`Attributes`] container,
//!   trying each supported type in turn since `Any` erases the native one.

use sqlx::any::{AnyArguments, AnyRow};
use sqlx::{Arguments, Column, Row};

use crate::{Attributes, Error, Value, temporal};

// ============================================================================
// Value Binding Trait
// ============================================================================

/// Extension trait for binding [`Value`]s to `AnyArguments`.
pub trait ValueBinder {
    /// Binds one value to the next placeholder.
    fn bind_value(&mut self, value: &Value) -> Result<(), Error>;

    /// Binds every value in order.
    fn bind_all(&mut self, values: &[Value]) -> Result<(), Error> {
        for value in values {
            self.bind_value(value)?;
        }
        Ok(())
    }
}

impl ValueBinder for AnyArguments<'_> {
    fn bind_value(&mut self, value: &Value) -> Result<(), Error> {
        let bound = match value {
            Value::Null => self.add(Option::<String>::None),
            Value::Bool(v) => self.add(*v),
            Value::Int(v) => self.add(*v),
            Value::Float(v) => self.add(*v),
            Value::Text(v) => self.add(v.clone()),
            Value::Json(v) => self.add(serde_json::to_string(v)?),
            Value::DateTime(v) => self.add(temporal::format_datetime(v)),
        };

        bound.map_err(|e| Error::Conversion(format!("Failed to bind {} value: {}", value.kind(), e)))
    }
}

// ============================================================================
// Row Decoding
// ============================================================================

/// Reads every column of `row` into an attribute container.
pub fn decode_row(row: &AnyRow) -> Result<Attributes, Error> {
    let mut attrs = Attributes::new();
    for (idx, column) in row.columns().iter().enumerate() {
        attrs.set(column.name(), decode_column(row, idx)?);
    }
    Ok(attrs)
}

macro_rules! try_decode {
    ($row:expr, $idx:expr, $t:ty, $wrap:expr) => {
        if let Ok(value) = $row.try_get::<Option<$t>, _>($idx) {
            return Ok(value.map_or(Value::Null, $wrap));
        }
    };
}

fn decode_column(row: &AnyRow, idx: usize) -> Result<Value, Error> {
    try_decode!(row, idx, i64, Value::Int);
    try_decode!(row, idx, i32, |v| Value::Int(v as i64));
    try_decode!(row, idx, i16, |v| Value::Int(v as i64));
    try_decode!(row, idx, f64, Value::Float);
    try_decode!(row, idx, f32, |v| Value::Float(v as f64));
    try_decode!(row, idx, bool, Value::Bool);
    try_decode!(row, idx, String, Value::Text);
    try_decode!(row, idx, Vec<u8>, |v: Vec<u8>| Value::Text(String::from_utf8_lossy(&v).into_owned()));

    let name = row.columns().get(idx).map(|c| c.name().to_string()).unwrap_or_default();
    Err(Error::Conversion(format!("Unsupported column type for `{}`", name)))
}
