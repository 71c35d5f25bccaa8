//! Helpers for building and reading CBOR map values.
//!
//! Message encoders construct [`Value`] maps field by field; decoders read
//! them back through the `require_*`/`optional_*` accessors, which turn a
//! missing or mistyped field into a [`CodecError`] instead of a panic.

use crate::error::{CodecError, CodecResult};
use ciborium::value::Value;

/// Builds a CBOR text value.
#[must_use]
pub fn text(s: impl Into<String>) -> Value {
    Value::Text(s.into())
}

/// Builds a CBOR unsigned integer value.
#[must_use]
pub fn uint(n: u64) -> Value {
    Value::Integer(n.into())
}

/// Builds a CBOR byte-string value.
#[must_use]
pub fn bytes(b: impl Into<Vec<u8>>) -> Value {
    Value::Bytes(b.into())
}

/// Builds a CBOR map from `(name, value)` pairs.
#[must_use]
pub fn map<I>(pairs: I) -> Value
where
    I: IntoIterator<Item = (&'static str, Value)>,
{
    Value::Map(
        pairs
            .into_iter()
            .map(|(k, v)| (Value::Text(k.to_string()), v))
            .collect(),
    )
}

/// Interprets a value as a map, returning its entries.
///
/// # Errors
///
/// Returns `InvalidStructure` if the value is not a CBOR map.
pub fn entries(value: &Value) -> CodecResult<&[(Value, Value)]> {
    match value {
        Value::Map(pairs) => Ok(pairs),
        _ => Err(CodecError::invalid_structure("expected map")),
    }
}

/// Looks up a field by name in map entries.
#[must_use]
pub fn field<'a>(entries: &'a [(Value, Value)], name: &str) -> Option<&'a Value> {
    entries
        .iter()
        .find(|(k, _)| matches!(k, Value::Text(t) if t == name))
        .map(|(_, v)| v)
}

/// Reads a required unsigned integer field.
///
/// # Errors
///
/// Returns `MissingField` if absent, `InvalidStructure` if not an integer,
/// or `IntegerOverflow` if negative or too large for `u64`.
pub fn require_u64(entries: &[(Value, Value)], name: &str) -> CodecResult<u64> {
    match field(entries, name) {
        Some(Value::Integer(i)) => u64::try_from(*i).map_err(|_| CodecError::IntegerOverflow),
        Some(_) => Err(CodecError::invalid_structure(format!(
            "field {name} is not an integer"
        ))),
        None => Err(CodecError::missing_field(name)),
    }
}

/// Reads a required unsigned 32-bit integer field.
///
/// # Errors
///
/// Same contract as [`require_u64`], narrowed to `u32`.
pub fn require_u32(entries: &[(Value, Value)], name: &str) -> CodecResult<u32> {
    u32::try_from(require_u64(entries, name)?).map_err(|_| CodecError::IntegerOverflow)
}

/// Reads a required text field.
///
/// # Errors
///
/// Returns `MissingField` if absent or `InvalidStructure` if not text.
pub fn require_text(entries: &[(Value, Value)], name: &str) -> CodecResult<String> {
    match field(entries, name) {
        Some(Value::Text(t)) => Ok(t.clone()),
        Some(_) => Err(CodecError::invalid_structure(format!(
            "field {name} is not text"
        ))),
        None => Err(CodecError::missing_field(name)),
    }
}

/// Reads a required byte-string field.
///
/// # Errors
///
/// Returns `MissingField` if absent or `InvalidStructure` if not bytes.
pub fn require_bytes(entries: &[(Value, Value)], name: &str) -> CodecResult<Vec<u8>> {
    match field(entries, name) {
        Some(Value::Bytes(b)) => Ok(b.clone()),
        Some(_) => Err(CodecError::invalid_structure(format!(
            "field {name} is not bytes"
        ))),
        None => Err(CodecError::missing_field(name)),
    }
}

/// Reads a required nested value field (map or array).
///
/// # Errors
///
/// Returns `MissingField` if absent.
pub fn require_field<'a>(entries: &'a [(Value, Value)], name: &str) -> CodecResult<&'a Value> {
    field(entries, name).ok_or_else(|| CodecError::missing_field(name))
}

/// Reads an optional text field; `Null` and absence both read as `None`.
///
/// # Errors
///
/// Returns `InvalidStructure` if present but neither text nor null.
pub fn optional_text(entries: &[(Value, Value)], name: &str) -> CodecResult<Option<String>> {
    match field(entries, name) {
        Some(Value::Text(t)) => Ok(Some(t.clone())),
        Some(Value::Null) | None => Ok(None),
        Some(_) => Err(CodecError::invalid_structure(format!(
            "field {name} is not text"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Value {
        map([
            ("height", uint(7)),
            ("step", text("propose")),
            ("data", bytes(vec![1, 2, 3])),
        ])
    }

    #[test]
    fn field_lookup() {
        let value = sample();
        let entries = entries(&value).unwrap();
        assert!(field(entries, "height").is_some());
        assert!(field(entries, "missing").is_none());
    }

    #[test]
    fn typed_accessors() {
        let value = sample();
        let e = entries(&value).unwrap();
        assert_eq!(require_u64(e, "height").unwrap(), 7);
        assert_eq!(require_text(e, "step").unwrap(), "propose");
        assert_eq!(require_bytes(e, "data").unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn missing_field_error() {
        let value = sample();
        let e = entries(&value).unwrap();
        assert!(matches!(
            require_u64(e, "round"),
            Err(CodecError::MissingField { .. })
        ));
    }

    #[test]
    fn type_mismatch_error() {
        let value = sample();
        let e = entries(&value).unwrap();
        assert!(matches!(
            require_u64(e, "step"),
            Err(CodecError::InvalidStructure { .. })
        ));
    }

    #[test]
    fn negative_integer_overflows_u64() {
        let value = Value::Map(vec![(Value::Text("n".into()), Value::Integer((-1).into()))]);
        let e = entries(&value).unwrap();
        assert!(matches!(
            require_u64(e, "n"),
            Err(CodecError::IntegerOverflow)
        ));
    }

    #[test]
    fn optional_text_absent_and_null() {
        let value = map([("peer", Value::Null)]);
        let e = entries(&value).unwrap();
        assert_eq!(optional_text(e, "peer").unwrap(), None);
        assert_eq!(optional_text(e, "absent").unwrap(), None);
    }
}
