//! The parameter and field type taxonomies.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Type of a method input parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterType {
    /// Trimmed text.
    String,
    /// 64-bit signed integer.
    #[serde(rename = "int")]
    Integer,
    /// 64-bit float.
    Float,
    /// Boolean.
    #[serde(rename = "bool")]
    Boolean,
    /// Multi-locale text.
    Phrase,
    /// Date and time, normalized to UTC.
    DateTime,
    /// Calendar date.
    Date,
    /// Hyphenated UUID.
    Uuid,
    /// List of values of a child type.
    Array,
    /// One value of an enum domain.
    Enum,
}

impl ParameterType {
    /// Returns `false` only for [`ParameterType::Array`].
    #[must_use]
    pub const fn is_scalar(self) -> bool {
        !matches!(self, Self::Array)
    }

    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "int",
            Self::Float => "float",
            Self::Boolean => "bool",
            Self::Phrase => "phrase",
            Self::DateTime => "date_time",
            Self::Date => "date",
            Self::Uuid => "uuid",
            Self::Array => "array",
            Self::Enum => "enum",
        }
    }
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type of a model field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// Text.
    String,
    /// 64-bit signed integer.
    #[serde(rename = "int")]
    Integer,
    /// 64-bit float.
    Float,
    /// Boolean.
    #[serde(rename = "bool")]
    Boolean,
    /// UUID, emitted in canonical form.
    Uuid,
    /// A nested model.
    Object,
    /// Unix seconds.
    Timestamp,
    /// Multi-locale text.
    Phrase,
    /// List or index map.
    Array,
}

impl FieldType {
    /// Returns `false` for [`FieldType::Array`] and [`FieldType::Object`].
    #[must_use]
    pub const fn is_scalar(self) -> bool {
        !matches!(self, Self::Array | Self::Object)
    }

    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "int",
            Self::Float => "float",
            Self::Boolean => "bool",
            Self::Uuid => "uuid",
            Self::Object => "object",
            Self::Timestamp => "timestamp",
            Self::Phrase => "phrase",
            Self::Array => "array",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type of a model's index accessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexType {
    /// Integer keys.
    #[serde(rename = "int")]
    Integer,
    /// String keys.
    #[serde(rename = "string")]
    String,
}

impl IndexType {
    /// The field type an index of this kind is emitted as.
    #[must_use]
    pub const fn field_type(self) -> FieldType {
        match self {
            Self::Integer => FieldType::Integer,
            Self::String => FieldType::String,
        }
    }
}

impl fmt::Display for IndexType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_type().as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_wire_names() {
        assert_eq!(serde_json::to_string(&ParameterType::Integer).unwrap(), "\"int\"");
        assert_eq!(serde_json::to_string(&ParameterType::DateTime).unwrap(), "\"date_time\"");
        assert_eq!(serde_json::to_string(&ParameterType::Boolean).unwrap(), "\"bool\"");
        let parsed: ParameterType = serde_json::from_str("\"enum\"").unwrap();
        assert_eq!(parsed, ParameterType::Enum);
    }

    #[test]
    fn test_scalar_split() {
        assert!(ParameterType::Enum.is_scalar());
        assert!(!ParameterType::Array.is_scalar());
        assert!(FieldType::Timestamp.is_scalar());
        assert!(!FieldType::Object.is_scalar());
        assert!(!FieldType::Array.is_scalar());
    }

    #[test]
    fn test_display_matches_wire() {
        assert_eq!(FieldType::Timestamp.to_string(), "timestamp");
        assert_eq!(IndexType::Integer.to_string(), "int");
        assert_eq!(IndexType::String.field_type(), FieldType::String);
    }
}
