//! # Type Mapping Module
//!
//! Infers the `Cast` of a column from the Rust type of its field.
//!
//! ## Supported Type Mappings
//!
//! ### Primitive Types
//! - `i8`..`i64`, `u8`..`u32` → `Cast::Int`
//! - `f32`, `f64` → `Cast::Float`
//! - `bool` → `Cast::Bool`
//! - `String` → `Cast::String`
//!
//! ### Date/Time Types (chrono)
//! - `DateTime<Utc>`, `NaiveDateTime` → `Cast::DateTime`
//! - `NaiveDate` → `Cast::String` (stored as `YYYY-MM-DD`)
//!
//! ### Other Types
//! - `Uuid` → `Cast::String`
//! - `serde_json::Value` / `JsonValue` → `Cast::Json`
//!
//! ### Nullable Types
//! - `Option<T>` → cast of `T`
//!
//! Anything else gets no cast; its values are stored as given.

use syn::{GenericArgument, PathArguments, Type};

/// Maps a field type to a `Cast` variant name.
pub fn rust_type_to_cast(ty: &Type) -> Option<&'static str> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    let type_name = segment.ident.to_string();

    if type_name == "Option"
        && let PathArguments::AngleBracketed(args) = &segment.arguments
        && let Some(GenericArgument::Type(inner)) = args.args.first()
    {
        return rust_type_to_cast(inner);
    }

    let from_serde_json = type_path.path.segments.iter().any(|s| s.ident == "serde_json");

    match type_name.as_str() {
        "i8" | "i16" | "i32" | "i64" | "u8" | "u16" | "u32" => Some("Int"),
        "f32" | "f64" => Some("Float"),
        "bool" => Some("Bool"),
        "String" | "Uuid" | "NaiveDate" => Some("String"),
        "DateTime" | "NaiveDateTime" => Some("DateTime"),
        "JsonValue" => Some("Json"),
        "Value" if from_serde_json => Some("Json"),
        _ => None,
    }
}

/// Maps a `cast = "..."` attribute value to a `Cast` variant name.
pub fn cast_from_name(name: &str) -> Option<&'static str> {
    match name.to_ascii_lowercase().as_str() {
        "int" | "integer" => Some("Int"),
        "float" | "double" | "real" => Some("Float"),
        "bool" | "boolean" => Some("Bool"),
        "string" | "text" => Some("String"),
        "json" | "array" | "object" => Some("Json"),
        "datetime" | "timestamp" => Some("DateTime"),
        _ => None,
    }
}
