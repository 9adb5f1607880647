//! Method parameter declarations.

use crate::{DeclarationError, DeclarationResult, EnumDomain, ParameterType};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use tabula_core::ErrorCode;

/// Declared parameters of a method, in declaration order.
pub type ParameterSet = IndexMap<String, ParameterDeclaration>;

/// Whether a parameter must be present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Requirement {
    /// The parameter must be present; the code is raised when it is not.
    Required(ErrorCode),
    /// The parameter may be absent.
    Optional,
}

impl Requirement {
    /// Returns `true` for [`Requirement::Required`].
    #[must_use]
    pub const fn is_required(self) -> bool {
        matches!(self, Self::Required(_))
    }

    /// The code raised when a required parameter is absent.
    #[must_use]
    pub const fn error_code(self) -> Option<ErrorCode> {
        match self {
            Self::Required(code) => Some(code),
            Self::Optional => None,
        }
    }
}

/// Declaration of a single method parameter.
///
/// Declarations are immutable once built. Bounds setters are only accepted
/// for the matching type: calling [`ParameterDeclaration::min_length`] on an
/// integer parameter is a programming error and panics.
///
/// # Example
///
/// ```
/// use tabula_contract::{ParameterDeclaration, ParameterType, Requirement};
///
/// let year = ParameterDeclaration::integer(Requirement::Optional)
///     .description("Publication year")
///     .int_min(1450);
/// assert_eq!(year.kind(), ParameterType::Integer);
/// assert!(!year.is_required());
///
/// let ids = ParameterDeclaration::array(ParameterType::Uuid, Requirement::Required(3020));
/// assert_eq!(ids.child_type(), Some(ParameterType::Uuid));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterDeclaration {
    #[serde(rename = "type")]
    kind: ParameterType,
    #[serde(skip_serializing_if = "Option::is_none")]
    child_type: Option<ParameterType>,
    #[serde(skip)]
    requirement: Requirement,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(rename = "default", skip_serializing_if = "Option::is_none")]
    default_value: Option<Value>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    number_positive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    int_min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    int_max: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    string_min_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    string_max_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    float_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    float_max: Option<f64>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    enum_domain: Option<EnumDomain>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    deprecated: bool,
}

impl ParameterDeclaration {
    /// Checked constructor.
    ///
    /// # Errors
    ///
    /// Returns a [`DeclarationError`] when the type, child type and enum
    /// domain do not fit together.
    pub fn try_new(
        kind: ParameterType,
        child_type: Option<ParameterType>,
        enum_domain: Option<EnumDomain>,
        requirement: Requirement,
    ) -> DeclarationResult<Self> {
        let child_type = match kind {
            ParameterType::Array => match child_type {
                None => return Err(DeclarationError::MissingChildType),
                Some(ParameterType::Array) => return Err(DeclarationError::NestedArray),
                Some(ParameterType::Enum) => {
                    let domain = enum_domain.as_ref().ok_or(DeclarationError::MissingEnumDomain)?;
                    check_domain(domain)?;
                    Some(ParameterType::Enum)
                }
                Some(child) => {
                    if enum_domain.is_some() {
                        return Err(DeclarationError::UnexpectedEnumDomain { kind: child });
                    }
                    Some(child)
                }
            },
            ParameterType::Enum => {
                let domain = enum_domain.as_ref().ok_or(DeclarationError::MissingEnumDomain)?;
                check_domain(domain)?;
                let expected = domain.child_type();
                match child_type {
                    Some(child) if child != expected => {
                        return Err(DeclarationError::unexpected_child(child))
                    }
                    _ => Some(expected),
                }
            }
            scalar => {
                if child_type.is_some() {
                    return Err(DeclarationError::unexpected_child(scalar));
                }
                if enum_domain.is_some() {
                    return Err(DeclarationError::UnexpectedEnumDomain { kind: scalar });
                }
                None
            }
        };

        Ok(Self {
            kind,
            child_type,
            requirement,
            description: None,
            default_value: None,
            number_positive: false,
            int_min: None,
            int_max: None,
            string_min_length: None,
            string_max_length: None,
            float_min: None,
            float_max: None,
            enum_domain,
            deprecated: false,
        })
    }

    fn build(
        kind: ParameterType,
        child_type: Option<ParameterType>,
        enum_domain: Option<EnumDomain>,
        requirement: Requirement,
    ) -> Self {
        match Self::try_new(kind, child_type, enum_domain, requirement) {
            Ok(declaration) => declaration,
            Err(err) => panic!("invalid parameter declaration: {err}"),
        }
    }

    /// A plain scalar parameter. Panics for `array` and `enum`.
    #[must_use]
    pub fn scalar(kind: ParameterType, requirement: Requirement) -> Self {
        Self::build(kind, None, None, requirement)
    }

    /// A string parameter.
    #[must_use]
    pub fn string(requirement: Requirement) -> Self {
        Self::scalar(ParameterType::String, requirement)
    }

    /// An integer parameter.
    #[must_use]
    pub fn integer(requirement: Requirement) -> Self {
        Self::scalar(ParameterType::Integer, requirement)
    }

    /// A float parameter.
    #[must_use]
    pub fn float(requirement: Requirement) -> Self {
        Self::scalar(ParameterType::Float, requirement)
    }

    /// A boolean parameter.
    #[must_use]
    pub fn boolean(requirement: Requirement) -> Self {
        Self::scalar(ParameterType::Boolean, requirement)
    }

    /// A UUID parameter.
    #[must_use]
    pub fn uuid(requirement: Requirement) -> Self {
        Self::scalar(ParameterType::Uuid, requirement)
    }

    /// A phrase parameter.
    #[must_use]
    pub fn phrase(requirement: Requirement) -> Self {
        Self::scalar(ParameterType::Phrase, requirement)
    }

    /// A date-time parameter.
    #[must_use]
    pub fn date_time(requirement: Requirement) -> Self {
        Self::scalar(ParameterType::DateTime, requirement)
    }

    /// A date parameter.
    #[must_use]
    pub fn date(requirement: Requirement) -> Self {
        Self::scalar(ParameterType::Date, requirement)
    }

    /// An enum parameter over `domain`.
    #[must_use]
    pub fn enumeration(domain: EnumDomain, requirement: Requirement) -> Self {
        Self::build(ParameterType::Enum, None, Some(domain), requirement)
    }

    /// An array of `child`. Use [`Self::array_of_enum`] for enum children.
    #[must_use]
    pub fn array(child: ParameterType, requirement: Requirement) -> Self {
        Self::build(ParameterType::Array, Some(child), None, requirement)
    }

    /// An array of values from `domain`.
    #[must_use]
    pub fn array_of_enum(domain: EnumDomain, requirement: Requirement) -> Self {
        Self::build(
            ParameterType::Array,
            Some(ParameterType::Enum),
            Some(domain),
            requirement,
        )
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the value typed getters fall back to when the input is absent.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Requires a strictly positive number.
    #[must_use]
    pub fn positive(mut self) -> Self {
        self.assert_kind(&[ParameterType::Integer, ParameterType::Float], "positive");
        self.number_positive = true;
        self
    }

    /// Sets the inclusive integer minimum.
    #[must_use]
    pub fn int_min(mut self, min: i64) -> Self {
        self.assert_kind(&[ParameterType::Integer], "int_min");
        self.int_min = Some(min);
        self
    }

    /// Sets the inclusive integer maximum.
    #[must_use]
    pub fn int_max(mut self, max: i64) -> Self {
        self.assert_kind(&[ParameterType::Integer], "int_max");
        self.int_max = Some(max);
        self
    }

    /// Sets the minimum length in characters.
    #[must_use]
    pub fn min_length(mut self, min: usize) -> Self {
        self.assert_kind(&[ParameterType::String], "min_length");
        self.string_min_length = Some(min);
        self
    }

    /// Sets the maximum length in characters.
    #[must_use]
    pub fn max_length(mut self, max: usize) -> Self {
        self.assert_kind(&[ParameterType::String], "max_length");
        self.string_max_length = Some(max);
        self
    }

    /// Sets the inclusive float minimum.
    #[must_use]
    pub fn float_min(mut self, min: f64) -> Self {
        self.assert_kind(&[ParameterType::Float], "float_min");
        self.float_min = Some(min);
        self
    }

    /// Sets the inclusive float maximum.
    #[must_use]
    pub fn float_max(mut self, max: f64) -> Self {
        self.assert_kind(&[ParameterType::Float], "float_max");
        self.float_max = Some(max);
        self
    }

    /// Marks the parameter deprecated in documentation.
    #[must_use]
    pub const fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    fn assert_kind(&self, allowed: &[ParameterType], setter: &str) {
        assert!(
            allowed.contains(&self.kind),
            "contract misuse: {setter} is not applicable to {} parameters",
            self.kind
        );
    }

    /// Returns the declared type.
    #[must_use]
    pub const fn kind(&self) -> ParameterType {
        self.kind
    }

    /// Returns the child type of arrays and enums.
    #[must_use]
    pub const fn child_type(&self) -> Option<ParameterType> {
        self.child_type
    }

    /// Returns the requirement.
    #[must_use]
    pub const fn requirement(&self) -> Requirement {
        self.requirement
    }

    /// Returns `true` if the parameter must be present.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.requirement.is_required()
    }

    /// Returns the description.
    #[must_use]
    pub fn description_text(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the declared default.
    #[must_use]
    pub const fn default(&self) -> Option<&Value> {
        self.default_value.as_ref()
    }

    /// Returns `true` when only positive numbers are accepted.
    #[must_use]
    pub const fn is_positive(&self) -> bool {
        self.number_positive
    }

    /// Effective inclusive integer minimum, taking `positive` into account.
    #[must_use]
    pub fn effective_int_min(&self) -> Option<i64> {
        match (self.int_min, self.number_positive) {
            (Some(min), true) => Some(min.max(1)),
            (None, true) => Some(1),
            (min, false) => min,
        }
    }

    /// Returns the inclusive integer maximum.
    #[must_use]
    pub const fn int_max_value(&self) -> Option<i64> {
        self.int_max
    }

    /// Returns the string length bounds.
    #[must_use]
    pub const fn length_bounds(&self) -> (Option<usize>, Option<usize>) {
        (self.string_min_length, self.string_max_length)
    }

    /// Returns the float bounds.
    #[must_use]
    pub const fn float_bounds(&self) -> (Option<f64>, Option<f64>) {
        (self.float_min, self.float_max)
    }

    /// Returns the enum domain of enums and arrays of enums.
    #[must_use]
    pub const fn enum_domain(&self) -> Option<&EnumDomain> {
        self.enum_domain.as_ref()
    }

    /// Returns `true` if marked deprecated.
    #[must_use]
    pub const fn is_deprecated(&self) -> bool {
        self.deprecated
    }

    /// Returns `true` if `kind` (and `child`, for arrays) match the declaration.
    #[must_use]
    pub fn is_of(&self, kind: ParameterType, child: Option<ParameterType>) -> bool {
        self.kind == kind && (kind != ParameterType::Array || self.child_type == child)
    }
}

fn check_domain(domain: &EnumDomain) -> DeclarationResult<()> {
    if domain.is_empty() {
        return Err(DeclarationError::EmptyEnumDomain {
            name: domain.name().to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_array_requires_child() {
        let err = ParameterDeclaration::try_new(
            ParameterType::Array,
            None,
            None,
            Requirement::Optional,
        )
        .unwrap_err();
        assert_eq!(err, DeclarationError::MissingChildType);
    }

    #[test]
    fn test_nested_array_denied() {
        let err = ParameterDeclaration::try_new(
            ParameterType::Array,
            Some(ParameterType::Array),
            None,
            Requirement::Optional,
        )
        .unwrap_err();
        assert_eq!(err, DeclarationError::NestedArray);
    }

    #[test]
    fn test_scalar_rejects_child() {
        let err = ParameterDeclaration::try_new(
            ParameterType::String,
            Some(ParameterType::Integer),
            None,
            Requirement::Optional,
        )
        .unwrap_err();
        assert_eq!(err, DeclarationError::unexpected_child(ParameterType::String));
    }

    #[test]
    fn test_enum_child_follows_domain() {
        let param = ParameterDeclaration::enumeration(
            EnumDomain::integers("Rating", [1, 2]),
            Requirement::Optional,
        );
        assert_eq!(param.child_type(), Some(ParameterType::Integer));

        let err = ParameterDeclaration::try_new(
            ParameterType::Enum,
            None,
            None,
            Requirement::Optional,
        )
        .unwrap_err();
        assert_eq!(err, DeclarationError::MissingEnumDomain);
    }

    #[test]
    fn test_array_of_enum_carries_domain() {
        let param = ParameterDeclaration::array_of_enum(
            EnumDomain::strings("Color", ["red"]),
            Requirement::Required(3100),
        );
        assert_eq!(param.child_type(), Some(ParameterType::Enum));
        assert_eq!(param.enum_domain().map(EnumDomain::name), Some("Color"));
        assert_eq!(param.requirement().error_code(), Some(3100));
    }

    #[test]
    #[should_panic(expected = "invalid parameter declaration")]
    fn test_scalar_constructor_panics_on_array() {
        let _ = ParameterDeclaration::scalar(ParameterType::Array, Requirement::Optional);
    }

    #[test]
    #[should_panic(expected = "contract misuse: min_length")]
    fn test_bounds_setter_checks_type() {
        let _ = ParameterDeclaration::integer(Requirement::Optional).min_length(3);
    }

    #[test]
    fn test_effective_int_min() {
        let plain = ParameterDeclaration::integer(Requirement::Optional);
        assert_eq!(plain.effective_int_min(), None);
        assert_eq!(plain.clone().positive().effective_int_min(), Some(1));
        assert_eq!(plain.clone().int_min(-5).positive().effective_int_min(), Some(1));
        assert_eq!(plain.int_min(10).positive().effective_int_min(), Some(10));
    }

    #[test]
    fn test_serialization_omits_empty() {
        let param = ParameterDeclaration::string(Requirement::Required(3002))
            .description("Title")
            .max_length(200);
        assert_eq!(
            serde_json::to_value(&param).unwrap(),
            json!({"type": "string", "description": "Title", "string_max_length": 200})
        );
    }
}
