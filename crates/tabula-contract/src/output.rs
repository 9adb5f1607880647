//! Values returned by methods and projected by models.

use crate::ModelValue;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use tabula_core::Phrase;
use uuid::Uuid;

/// Public projection of a model: field name to value, in output order.
pub type PublicData = IndexMap<String, OutputValue>;

/// An untyped output value, checked by the serializer against a
/// [`FieldDeclaration`](crate::FieldDeclaration).
#[derive(Debug, Clone)]
pub enum OutputValue {
    /// Absent value.
    Null,
    /// Boolean.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Float.
    Float(f64),
    /// Text.
    String(String),
    /// UUID.
    Uuid(Uuid),
    /// Point in time, emitted as unix seconds.
    Timestamp(DateTime<Utc>),
    /// Multi-locale text.
    Phrase(Phrase),
    /// Nested model.
    Model(ModelValue),
    /// Positional list.
    List(Vec<OutputValue>),
    /// Associative map.
    Map(IndexMap<String, OutputValue>),
    /// Pass-through JSON.
    Json(serde_json::Value),
}

impl OutputValue {
    /// Returns `true` for [`OutputValue::Null`] and JSON null.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null | Self::Json(serde_json::Value::Null))
    }

    /// Short name of the runtime variant, for diagnostics.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Uuid(_) => "uuid",
            Self::Timestamp(_) => "timestamp",
            Self::Phrase(_) => "phrase",
            Self::Model(_) => "object",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Json(_) => "json",
        }
    }

    /// A short rendering of the value, for violation messages.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Null => "null".to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::String(s) => format!("\"{s}\""),
            Self::Uuid(u) => u.to_string(),
            Self::Timestamp(t) => t.to_rfc3339(),
            Self::Phrase(_) => "phrase".to_string(),
            Self::Model(m) => format!("{} model", m.name()),
            Self::List(items) => format!("list of {}", items.len()),
            Self::Map(items) => format!("map of {}", items.len()),
            Self::Json(v) => v.to_string(),
        }
    }

    /// Returns `true` if a model appears anywhere inside this value.
    #[must_use]
    pub fn contains_model(&self) -> bool {
        match self {
            Self::Model(_) => true,
            Self::List(items) => items.iter().any(Self::contains_model),
            Self::Map(items) => items.values().any(Self::contains_model),
            _ => false,
        }
    }
}

impl From<bool> for OutputValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for OutputValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for OutputValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u32> for OutputValue {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u64> for OutputValue {
    fn from(value: u64) -> Self {
        Self::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<f64> for OutputValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<String> for OutputValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for OutputValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<&String> for OutputValue {
    fn from(value: &String) -> Self {
        Self::String(value.clone())
    }
}

impl From<Uuid> for OutputValue {
    fn from(value: Uuid) -> Self {
        Self::Uuid(value)
    }
}

impl From<DateTime<Utc>> for OutputValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

impl From<Phrase> for OutputValue {
    fn from(value: Phrase) -> Self {
        Self::Phrase(value)
    }
}

impl From<ModelValue> for OutputValue {
    fn from(value: ModelValue) -> Self {
        Self::Model(value)
    }
}

impl From<serde_json::Value> for OutputValue {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

impl From<IndexMap<String, OutputValue>> for OutputValue {
    fn from(value: IndexMap<String, OutputValue>) -> Self {
        Self::Map(value)
    }
}

impl<T: Into<OutputValue>> From<Option<T>> for OutputValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<OutputValue>> From<Vec<T>> for OutputValue {
    fn from(value: Vec<T>) -> Self {
        Self::List(value.into_iter().map(Into::into).collect())
    }
}

/// Builds [`PublicData`] from `key => value` pairs, converting each value
/// with [`OutputValue::from`].
///
/// ```
/// use tabula_contract::{public_data, OutputValue};
///
/// let data = public_data! { "id" => 5_i64, "title" => "Dune", "year" => None::<i64> };
/// assert!(matches!(data["id"], OutputValue::Int(5)));
/// assert!(data["year"].is_null());
/// ```
#[macro_export]
macro_rules! public_data {
    ($($key:expr => $value:expr),* $(,)?) => {{
        let mut data = $crate::PublicData::new();
        $(
            data.insert(::std::string::String::from($key), $crate::OutputValue::from($value));
        )*
        data
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_conversion() {
        assert!(OutputValue::from(None::<String>).is_null());
        assert!(matches!(OutputValue::from(Some(3_i64)), OutputValue::Int(3)));
    }

    #[test]
    fn test_vec_conversion() {
        let list = OutputValue::from(vec!["a", "b"]);
        match list {
            OutputValue::List(items) => assert_eq!(items.len(), 2),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_json_null_is_null() {
        assert!(OutputValue::Json(serde_json::Value::Null).is_null());
        assert!(!OutputValue::Json(serde_json::json!([])).is_null());
    }

    #[test]
    fn test_describe() {
        assert_eq!(OutputValue::from("x").describe(), "\"x\"");
        assert_eq!(OutputValue::Int(4).describe(), "4");
        assert_eq!(OutputValue::from(vec![1_i64, 2]).describe(), "list of 2");
    }

    #[test]
    fn test_macro_keeps_order() {
        let data = public_data! { "b" => 1_i64, "a" => 2_i64 };
        assert_eq!(data.keys().map(String::as_str).collect::<Vec<_>>(), vec!["b", "a"]);
    }
}
