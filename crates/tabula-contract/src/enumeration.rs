//! Enum domains for `enum` parameters.

use crate::ParameterType;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use tabula_core::Locale;

/// One value of an enum domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum EnumValue {
    /// Integer-backed value.
    Int(i64),
    /// String-backed value.
    Str(String),
}

impl EnumValue {
    /// Returns the string payload, if string-backed.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            Self::Int(_) => None,
        }
    }

    /// Returns the integer payload, if integer-backed.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Str(_) => None,
        }
    }

    /// Converts to a JSON value.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Int(i) => Value::from(*i),
            Self::Str(s) => Value::from(s.as_str()),
        }
    }
}

impl fmt::Display for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for EnumValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<i64> for EnumValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

/// The backing values of an [`EnumDomain`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum EnumValues {
    /// String-backed domain.
    Strings(Vec<String>),
    /// Integer-backed domain.
    Integers(Vec<i64>),
}

/// A closed set of allowed values, named for documentation.
///
/// # Example
///
/// ```
/// use tabula_contract::{EnumDomain, EnumValue, ParameterType};
///
/// let domain = EnumDomain::strings("Locale", ["ru", "en"]);
/// assert_eq!(domain.child_type(), ParameterType::String);
/// assert_eq!(domain.match_json(&serde_json::json!("en")), Some(EnumValue::from("en")));
/// assert_eq!(domain.match_json(&serde_json::json!("de")), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDomain {
    name: String,
    values: EnumValues,
}

impl EnumDomain {
    /// Creates a string-backed domain.
    #[must_use]
    pub fn strings<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            values: EnumValues::Strings(values.into_iter().map(Into::into).collect()),
        }
    }

    /// Creates an integer-backed domain.
    #[must_use]
    pub fn integers(name: impl Into<String>, values: impl IntoIterator<Item = i64>) -> Self {
        Self {
            name: name.into(),
            values: EnumValues::Integers(values.into_iter().collect()),
        }
    }

    /// The domain of a Rust enum implementing [`ApiEnum`].
    #[must_use]
    pub fn of<E: ApiEnum>() -> Self {
        E::domain()
    }

    /// Returns the domain name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the backing values.
    #[must_use]
    pub const fn values(&self) -> &EnumValues {
        &self.values
    }

    /// Number of values in the domain.
    #[must_use]
    pub fn len(&self) -> usize {
        match &self.values {
            EnumValues::Strings(v) => v.len(),
            EnumValues::Integers(v) => v.len(),
        }
    }

    /// Returns `true` for a domain with no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `string` or `int`, depending on the backing values.
    #[must_use]
    pub const fn child_type(&self) -> ParameterType {
        match self.values {
            EnumValues::Strings(_) => ParameterType::String,
            EnumValues::Integers(_) => ParameterType::Integer,
        }
    }

    /// Returns `true` if `value` belongs to the domain.
    #[must_use]
    pub fn contains(&self, value: &EnumValue) -> bool {
        match (&self.values, value) {
            (EnumValues::Strings(values), EnumValue::Str(s)) => values.iter().any(|v| v == s),
            (EnumValues::Integers(values), EnumValue::Int(i)) => values.contains(i),
            _ => false,
        }
    }

    /// Matches a raw wire value against the domain.
    ///
    /// String domains match strings exactly and integers by their decimal
    /// text. Integer domains match integers and canonical integer strings.
    #[must_use]
    pub fn match_json(&self, raw: &Value) -> Option<EnumValue> {
        let candidate = match (&self.values, raw) {
            (EnumValues::Strings(_), Value::String(s)) => EnumValue::Str(s.trim().to_string()),
            (EnumValues::Strings(_), Value::Number(n)) => EnumValue::Str(n.to_string()),
            (EnumValues::Integers(_), Value::Number(n)) => EnumValue::Int(n.as_i64()?),
            (EnumValues::Integers(_), Value::String(s)) => {
                let s = s.trim();
                let parsed: i64 = s.parse().ok()?;
                if parsed.to_string() != s {
                    return None;
                }
                EnumValue::Int(parsed)
            }
            _ => return None,
        };
        self.contains(&candidate).then_some(candidate)
    }
}

impl Serialize for EnumDomain {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("EnumDomain", 3)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("type", &self.child_type())?;
        state.serialize_field("values", &self.values)?;
        state.end()
    }
}

/// A Rust enum usable as an `enum` parameter.
///
/// ```
/// use tabula_contract::{ApiEnum, EnumDomain, EnumValue};
///
/// #[derive(Debug, PartialEq)]
/// enum Shelf { Fiction, Poetry }
///
/// impl ApiEnum for Shelf {
///     fn domain() -> EnumDomain {
///         EnumDomain::strings("Shelf", ["fiction", "poetry"])
///     }
///
///     fn from_value(value: &EnumValue) -> Option<Self> {
///         match value.as_str()? {
///             "fiction" => Some(Self::Fiction),
///             "poetry" => Some(Self::Poetry),
///             _ => None,
///         }
///     }
/// }
///
/// assert_eq!(Shelf::from_value(&EnumValue::from("poetry")), Some(Shelf::Poetry));
/// ```
pub trait ApiEnum: Sized {
    /// The allowed values.
    fn domain() -> EnumDomain;

    /// Maps a domain value back to the Rust variant.
    fn from_value(value: &EnumValue) -> Option<Self>;
}

impl ApiEnum for Locale {
    fn domain() -> EnumDomain {
        EnumDomain::strings("Locale", Locale::ALL.map(Locale::code))
    }

    fn from_value(value: &EnumValue) -> Option<Self> {
        Locale::from_code(value.as_str()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_domain_matching() {
        let domain = EnumDomain::strings("Color", ["red", "green"]);
        assert_eq!(domain.match_json(&json!("red")), Some(EnumValue::from("red")));
        assert_eq!(domain.match_json(&json!(" green ")), Some(EnumValue::from("green")));
        assert_eq!(domain.match_json(&json!("RED")), None);
        assert_eq!(domain.match_json(&json!(true)), None);
    }

    #[test]
    fn test_numeric_text_in_string_domain() {
        let domain = EnumDomain::strings("Level", ["1", "2"]);
        assert_eq!(domain.match_json(&json!(2)), Some(EnumValue::from("2")));
    }

    #[test]
    fn test_integer_domain_matching() {
        let domain = EnumDomain::integers("Rating", [1, 2, 3]);
        assert_eq!(domain.child_type(), ParameterType::Integer);
        assert_eq!(domain.match_json(&json!(2)), Some(EnumValue::Int(2)));
        assert_eq!(domain.match_json(&json!("3")), Some(EnumValue::Int(3)));
        assert_eq!(domain.match_json(&json!("03")), None);
        assert_eq!(domain.match_json(&json!(4)), None);
        assert_eq!(domain.match_json(&json!(2.5)), None);
    }

    #[test]
    fn test_locale_domain() {
        let domain = EnumDomain::of::<Locale>();
        assert_eq!(domain.len(), 5);
        assert_eq!(Locale::from_value(&EnumValue::from("uz")), Some(Locale::Uz));
        assert_eq!(Locale::from_value(&EnumValue::Int(1)), None);
    }

    #[test]
    fn test_domain_serialization() {
        let domain = EnumDomain::integers("Rating", [1, 2]);
        assert_eq!(
            serde_json::to_value(&domain).unwrap(),
            json!({"name": "Rating", "type": "int", "values": [1, 2]})
        );
    }
}
