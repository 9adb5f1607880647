//! Input coercion.
//!
//! [`TypedInput`] turns a loosely-typed JSON object into typed values, one
//! declared parameter at a time. Keys that are not declared are ignored.
//! Failures are collected into a single [`ApiError`] chain: every new error
//! becomes the current one and the previous error becomes its cause.

use crate::selection::{self, SelectionSpec, SelectionState, SortDirection};
use crate::{ApiEnum, EnumValue, ParameterDeclaration, ParameterSet, ParameterType};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::Arc;
use tabula_core::codes::{self, ErrorCode};
use tabula_core::{ApiError, Locale, Phrase};
use uuid::Uuid;

/// A coerced parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    /// Integer.
    Int(i64),
    /// Finite float.
    Float(f64),
    /// Boolean.
    Bool(bool),
    /// Trimmed, non-empty text.
    String(String),
    /// UUID.
    Uuid(Uuid),
    /// Multi-locale text.
    Phrase(Phrase),
    /// UTC date and time.
    DateTime(DateTime<Utc>),
    /// Calendar date.
    Date(NaiveDate),
    /// Member of an enum domain.
    Enum(EnumValue),
    /// Elements of an array parameter.
    List(Vec<TypedValue>),
}

impl TypedValue {
    /// Returns the integer payload.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the float payload.
    #[must_use]
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns the boolean payload.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the string payload.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the UUID payload.
    #[must_use]
    pub const fn as_uuid(&self) -> Option<Uuid> {
        match self {
            Self::Uuid(u) => Some(*u),
            _ => None,
        }
    }

    /// Returns the phrase payload.
    #[must_use]
    pub const fn as_phrase(&self) -> Option<&Phrase> {
        match self {
            Self::Phrase(p) => Some(p),
            _ => None,
        }
    }

    /// Returns the date-time payload.
    #[must_use]
    pub const fn as_date_time(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::DateTime(d) => Some(*d),
            _ => None,
        }
    }

    /// Returns the date payload.
    #[must_use]
    pub const fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Returns the enum payload.
    #[must_use]
    pub const fn as_enum(&self) -> Option<&EnumValue> {
        match self {
            Self::Enum(e) => Some(e),
            _ => None,
        }
    }

    /// Returns the elements of a list.
    #[must_use]
    pub fn as_list(&self) -> Option<&[TypedValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// The canonical wire form of this value.
    ///
    /// Coercing the wire form again yields the same value.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Int(i) => Value::from(*i),
            Self::Float(f) => Value::from(*f),
            Self::Bool(b) => Value::from(*b),
            Self::String(s) => Value::from(s.as_str()),
            Self::Uuid(u) => Value::from(u.to_string()),
            Self::Phrase(p) => p.to_json(),
            Self::DateTime(d) if (1..=9999).contains(&d.year()) => Value::from(d.to_rfc3339()),
            Self::DateTime(d) => Value::from(d.timestamp()),
            Self::Date(d) => Value::from(d.format("%Y-%m-%d").to_string()),
            Self::Enum(e) => e.to_json(),
            Self::List(items) => Value::Array(items.iter().map(Self::to_json).collect()),
        }
    }
}

/// Coerced method input.
///
/// Built once per request from the method's declared parameters. Holds
/// either the typed values or the contract error describing what was wrong.
///
/// Getters are checked against the declaration: asking for a parameter that
/// is not declared, or with the wrong type, is a programming error and
/// panics with a `contract misuse` message.
#[derive(Debug)]
pub struct TypedInput {
    parameters: Arc<ParameterSet>,
    values: BTreeMap<String, TypedValue>,
    selection: Option<SelectionSpec>,
    locale: Locale,
    error: Option<ApiError>,
}

impl TypedInput {
    /// Coerces `raw` against `parameters`.
    pub fn new(
        parameters: impl Into<Arc<ParameterSet>>,
        raw: &Map<String, Value>,
        locale: Locale,
        selection: Option<&SelectionSpec>,
    ) -> Self {
        let mut input = Self {
            parameters: parameters.into(),
            values: BTreeMap::new(),
            selection: selection.cloned(),
            locale,
            error: None,
        };

        let parameters = Arc::clone(&input.parameters);
        for (name, raw_value) in raw {
            let Some(declaration) = parameters.get(name) else {
                continue;
            };
            match coerce(declaration, raw_value, locale) {
                Coercion::Value(value) => {
                    input.values.insert(name.clone(), value);
                }
                Coercion::Absent => {}
                Coercion::Rejected(rejection) => {
                    input.raise(rejection.into_error(name));
                }
            }
        }

        for (name, declaration) in parameters.iter() {
            if let Some(code) = declaration.requirement().error_code() {
                if !input.values.contains_key(name) {
                    input.raise(ApiError::with_field(code, name.as_str()));
                }
            }
        }

        input
    }

    fn raise(&mut self, error: ApiError) {
        tracing::trace!(
            code = error.code(),
            field = error.input_field().unwrap_or_default(),
            "input rejected"
        );
        self.error = Some(match self.error.take() {
            Some(previous) => error.with_previous(previous),
            None => error,
        });
    }

    /// Adds a contract error for a declared parameter, chaining the current
    /// error as its cause.
    ///
    /// Methods use this for checks the declaration cannot express.
    pub fn add_error(&mut self, code: ErrorCode, field: &str) {
        assert!(
            self.parameters.contains_key(field),
            "contract misuse: error {code} raised for undeclared parameter {field}"
        );
        self.raise(ApiError::with_field(code, field));
    }

    /// The current contract error, if coercion failed.
    #[must_use]
    pub const fn error(&self) -> Option<&ApiError> {
        self.error.as_ref()
    }

    /// Returns the input, or the contract error if coercion failed.
    pub fn into_result(mut self) -> Result<Self, ApiError> {
        match self.error.take() {
            Some(error) => Err(error),
            None => Ok(self),
        }
    }

    /// Returns the request locale.
    #[must_use]
    pub const fn locale(&self) -> Locale {
        self.locale
    }

    /// Returns the declared parameters.
    #[must_use]
    pub fn parameters(&self) -> &ParameterSet {
        &self.parameters
    }

    /// Returns the coerced values, sorted by name.
    #[must_use]
    pub const fn values(&self) -> &BTreeMap<String, TypedValue> {
        &self.values
    }

    /// Returns `true` if `name` was supplied and coerced.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    fn declaration(
        &self,
        name: &str,
        kind: ParameterType,
        child: Option<ParameterType>,
        getter: &str,
    ) -> &ParameterDeclaration {
        let Some(declaration) = self.parameters.get(name) else {
            panic!("contract misuse: {getter}(\"{name}\") on an undeclared parameter");
        };
        assert!(
            declaration.is_of(kind, child),
            "contract misuse: {getter}(\"{name}\") on a {}{} parameter",
            declaration.kind(),
            declaration
                .child_type()
                .map(|c| format!(" of {c}"))
                .unwrap_or_default(),
        );
        declaration
    }

    fn lookup(
        &self,
        name: &str,
        kind: ParameterType,
        child: Option<ParameterType>,
        getter: &str,
    ) -> Option<Cow<'_, TypedValue>> {
        let declaration = self.declaration(name, kind, child, getter);
        if let Some(value) = self.values.get(name) {
            return Some(Cow::Borrowed(value));
        }
        match coerce(declaration, declaration.default()?, self.locale) {
            Coercion::Value(value) => Some(Cow::Owned(value)),
            Coercion::Absent | Coercion::Rejected(_) => None,
        }
    }

    fn required(
        &self,
        name: &str,
        kind: ParameterType,
        child: Option<ParameterType>,
        getter: &str,
    ) -> &TypedValue {
        let declaration = self.declaration(name, kind, child, getter);
        assert!(
            declaration.is_required(),
            "contract misuse: {getter}(\"{name}\") on an optional parameter"
        );
        match self.values.get(name) {
            Some(value) => value,
            None => panic!("contract misuse: {getter}(\"{name}\") on input that failed validation"),
        }
    }

    /// Optional integer.
    #[must_use]
    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.lookup(name, ParameterType::Integer, None, "get_int")?
            .as_int()
    }

    /// Required integer.
    #[must_use]
    pub fn require_int(&self, name: &str) -> i64 {
        variant(name, self.required(name, ParameterType::Integer, None, "require_int").as_int())
    }

    /// Optional float.
    #[must_use]
    pub fn get_float(&self, name: &str) -> Option<f64> {
        self.lookup(name, ParameterType::Float, None, "get_float")?
            .as_float()
    }

    /// Required float.
    #[must_use]
    pub fn require_float(&self, name: &str) -> f64 {
        variant(name, self.required(name, ParameterType::Float, None, "require_float").as_float())
    }

    /// Optional string.
    #[must_use]
    pub fn get_string(&self, name: &str) -> Option<String> {
        self.lookup(name, ParameterType::String, None, "get_string")?
            .as_str()
            .map(str::to_string)
    }

    /// Required string.
    #[must_use]
    pub fn require_string(&self, name: &str) -> &str {
        variant(name, self.required(name, ParameterType::String, None, "require_string").as_str())
    }

    /// Optional UUID.
    #[must_use]
    pub fn get_uuid(&self, name: &str) -> Option<Uuid> {
        self.lookup(name, ParameterType::Uuid, None, "get_uuid")?
            .as_uuid()
    }

    /// Required UUID.
    #[must_use]
    pub fn require_uuid(&self, name: &str) -> Uuid {
        variant(name, self.required(name, ParameterType::Uuid, None, "require_uuid").as_uuid())
    }

    /// Optional boolean.
    #[must_use]
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.lookup(name, ParameterType::Boolean, None, "get_bool")?
            .as_bool()
    }

    /// Required boolean.
    #[must_use]
    pub fn require_bool(&self, name: &str) -> bool {
        variant(name, self.required(name, ParameterType::Boolean, None, "require_bool").as_bool())
    }

    /// Optional phrase.
    #[must_use]
    pub fn get_phrase(&self, name: &str) -> Option<Phrase> {
        self.lookup(name, ParameterType::Phrase, None, "get_phrase")?
            .as_phrase()
            .cloned()
    }

    /// Required phrase.
    #[must_use]
    pub fn require_phrase(&self, name: &str) -> &Phrase {
        variant(name, self.required(name, ParameterType::Phrase, None, "require_phrase").as_phrase())
    }

    /// Optional date-time.
    #[must_use]
    pub fn get_date_time(&self, name: &str) -> Option<DateTime<Utc>> {
        self.lookup(name, ParameterType::DateTime, None, "get_date_time")?
            .as_date_time()
    }

    /// Required date-time.
    #[must_use]
    pub fn require_date_time(&self, name: &str) -> DateTime<Utc> {
        variant(
            name,
            self.required(name, ParameterType::DateTime, None, "require_date_time")
                .as_date_time(),
        )
    }

    /// Optional date.
    #[must_use]
    pub fn get_date(&self, name: &str) -> Option<NaiveDate> {
        self.lookup(name, ParameterType::Date, None, "get_date")?
            .as_date()
    }

    /// Required date.
    #[must_use]
    pub fn require_date(&self, name: &str) -> NaiveDate {
        variant(name, self.required(name, ParameterType::Date, None, "require_date").as_date())
    }

    fn assert_domain<E: ApiEnum>(&self, name: &str, getter: &str) {
        let expected = E::domain();
        let declared = self
            .parameters
            .get(name)
            .and_then(ParameterDeclaration::enum_domain)
            .map(|d| d.name().to_string());
        assert!(
            declared.as_deref() == Some(expected.name()),
            "contract misuse: {getter}(\"{name}\") expects enum {}, declared {}",
            expected.name(),
            declared.unwrap_or_else(|| "none".to_string()),
        );
    }

    /// Optional enum member.
    #[must_use]
    pub fn get_enum<E: ApiEnum>(&self, name: &str) -> Option<E> {
        let value = self.lookup(name, ParameterType::Enum, None, "get_enum")?;
        self.assert_domain::<E>(name, "get_enum");
        E::from_value(value.as_enum()?)
    }

    /// Required enum member.
    #[must_use]
    pub fn require_enum<E: ApiEnum>(&self, name: &str) -> E {
        let value = self.required(name, ParameterType::Enum, None, "require_enum");
        self.assert_domain::<E>(name, "require_enum");
        variant(name, value.as_enum().and_then(E::from_value))
    }

    fn list(&self, name: &str, child: ParameterType, getter: &str) -> Option<Vec<TypedValue>> {
        let value = self.lookup(name, ParameterType::Array, Some(child), getter)?;
        value.as_list().map(<[TypedValue]>::to_vec)
    }

    fn required_list(&self, name: &str, child: ParameterType, getter: &str) -> &[TypedValue] {
        variant(
            name,
            self.required(name, ParameterType::Array, Some(child), getter)
                .as_list(),
        )
    }

    /// Optional list of integers.
    #[must_use]
    pub fn get_array_of_int(&self, name: &str) -> Option<Vec<i64>> {
        let items = self.list(name, ParameterType::Integer, "get_array_of_int")?;
        Some(items.iter().filter_map(TypedValue::as_int).collect())
    }

    /// Required list of integers.
    #[must_use]
    pub fn require_array_of_int(&self, name: &str) -> Vec<i64> {
        self.required_list(name, ParameterType::Integer, "require_array_of_int")
            .iter()
            .filter_map(TypedValue::as_int)
            .collect()
    }

    /// Optional list of strings.
    #[must_use]
    pub fn get_array_of_string(&self, name: &str) -> Option<Vec<String>> {
        let items = self.list(name, ParameterType::String, "get_array_of_string")?;
        Some(
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
        )
    }

    /// Required list of strings.
    #[must_use]
    pub fn require_array_of_string(&self, name: &str) -> Vec<String> {
        self.required_list(name, ParameterType::String, "require_array_of_string")
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect()
    }

    /// Optional list of UUIDs.
    #[must_use]
    pub fn get_array_of_uuid(&self, name: &str) -> Option<Vec<Uuid>> {
        let items = self.list(name, ParameterType::Uuid, "get_array_of_uuid")?;
        Some(items.iter().filter_map(TypedValue::as_uuid).collect())
    }

    /// Required list of UUIDs.
    #[must_use]
    pub fn require_array_of_uuid(&self, name: &str) -> Vec<Uuid> {
        self.required_list(name, ParameterType::Uuid, "require_array_of_uuid")
            .iter()
            .filter_map(TypedValue::as_uuid)
            .collect()
    }

    /// Optional list of enum members.
    #[must_use]
    pub fn get_array_of_enum<E: ApiEnum>(&self, name: &str) -> Option<Vec<E>> {
        let items = self.list(name, ParameterType::Enum, "get_array_of_enum")?;
        self.assert_domain::<E>(name, "get_array_of_enum");
        Some(
            items
                .iter()
                .filter_map(|v| v.as_enum().and_then(E::from_value))
                .collect(),
        )
    }

    /// Required list of enum members.
    #[must_use]
    pub fn require_array_of_enum<E: ApiEnum>(&self, name: &str) -> Vec<E> {
        let items = self.required_list(name, ParameterType::Enum, "require_array_of_enum");
        self.assert_domain::<E>(name, "require_array_of_enum");
        items
            .iter()
            .filter_map(|v| v.as_enum().and_then(E::from_value))
            .collect()
    }

    /// Resolves pagination and sorting once the method knows how many rows
    /// match.
    ///
    /// A missing, non-positive or too large `limit` becomes `limit_max`.
    /// Unknown sort aliases and directions fall back to the defaults.
    #[must_use]
    pub fn require_selection_data(&self, total_amount: u64) -> SelectionState {
        let Some(spec) = self.selection.as_ref() else {
            panic!("contract misuse: require_selection_data on a method without selection");
        };
        let mut state = SelectionState::new(spec, total_amount);

        let limit = self
            .values
            .get(selection::LIMIT)
            .and_then(TypedValue::as_int)
            .and_then(|l| u32::try_from(l).ok())
            .filter(|&l| l >= 1 && l <= spec.limit_max());
        if let Some(limit) = limit {
            state.apply_limit(limit);
        }

        let sort = self
            .values
            .get(selection::SORT_BY)
            .and_then(TypedValue::as_str)
            .and_then(|alias| spec.column(alias).map(|column| (alias, column)));
        let (alias, column) = sort.unwrap_or_else(|| {
            let alias = spec.default_sort_by();
            (alias, spec.column(alias).unwrap_or(alias))
        });
        let direction = self
            .values
            .get(selection::SORT_DIRECTION)
            .and_then(TypedValue::as_str)
            .and_then(SortDirection::parse)
            .unwrap_or_else(|| spec.default_sort_direction());
        state.set_sort(alias.to_string(), column.to_string(), direction);

        let page = self
            .values
            .get(selection::PAGE)
            .and_then(TypedValue::as_int)
            .and_then(|p| u64::try_from(p).ok())
            .unwrap_or(1);
        state.set_page(page);
        state
    }
}

fn variant<T>(name: &str, value: Option<T>) -> T {
    match value {
        Some(value) => value,
        None => panic!("contract misuse: parameter {name} holds a value of another type"),
    }
}

enum Coercion {
    Value(TypedValue),
    Absent,
    Rejected(Rejection),
}

struct Rejection {
    code: ErrorCode,
    vars: Vec<(&'static str, String)>,
}

impl Rejection {
    const fn code(code: ErrorCode) -> Self {
        Self {
            code,
            vars: Vec::new(),
        }
    }

    fn var(mut self, name: &'static str, value: impl ToString) -> Self {
        self.vars.push((name, value.to_string()));
        self
    }

    fn into_error(self, field: &str) -> ApiError {
        self.vars
            .into_iter()
            .fold(ApiError::with_field(self.code, field), |err, (name, value)| {
                err.with_var(name, value)
            })
    }
}

fn is_blank(raw: &Value) -> bool {
    match raw {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn coerce(declaration: &ParameterDeclaration, raw: &Value, locale: Locale) -> Coercion {
    if is_blank(raw) {
        return Coercion::Absent;
    }
    match declaration.kind() {
        ParameterType::Integer => coerce_integer(declaration, raw),
        ParameterType::Float => coerce_float(declaration, raw),
        ParameterType::Boolean => parse_bool(raw).map_or(Coercion::Absent, |b| {
            Coercion::Value(TypedValue::Bool(b))
        }),
        ParameterType::String => coerce_string(declaration, raw),
        ParameterType::Uuid => parse_uuid(raw).map_or(
            Coercion::Rejected(Rejection::code(codes::INVALID_UUID)),
            |u| Coercion::Value(TypedValue::Uuid(u)),
        ),
        ParameterType::Phrase => parse_phrase(raw, locale).map_or(Coercion::Absent, |p| {
            Coercion::Value(TypedValue::Phrase(p))
        }),
        ParameterType::DateTime => parse_date_time(raw).map_or(
            Coercion::Rejected(Rejection::code(codes::INVALID_DATE_TIME)),
            |d| Coercion::Value(TypedValue::DateTime(d)),
        ),
        ParameterType::Date => parse_date(raw).map_or(
            Coercion::Rejected(Rejection::code(codes::INVALID_DATE)),
            |d| Coercion::Value(TypedValue::Date(d)),
        ),
        ParameterType::Enum => declaration
            .enum_domain()
            .and_then(|domain| domain.match_json(raw))
            .map_or(
                Coercion::Rejected(Rejection::code(codes::INVALID_ENUM_VALUE)),
                |e| Coercion::Value(TypedValue::Enum(e)),
            ),
        ParameterType::Array => coerce_array(declaration, raw, locale),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn parse_int(raw: &Value) -> Option<i64> {
    const LIMIT: f64 = 9_007_199_254_740_992.0;
    match raw {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() <= LIMIT)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.parse::<i64>().ok().filter(|i| i.to_string() == *s),
        _ => None,
    }
}

fn coerce_integer(declaration: &ParameterDeclaration, raw: &Value) -> Coercion {
    let Some(value) = parse_int(raw) else {
        return Coercion::Rejected(Rejection::code(codes::INVALID_INTEGER));
    };
    if let Some(min) = declaration.effective_int_min() {
        if value < min {
            return Coercion::Rejected(Rejection::code(codes::INTEGER_TOO_SMALL).var("min", min));
        }
    }
    if let Some(max) = declaration.int_max_value() {
        if value > max {
            return Coercion::Rejected(Rejection::code(codes::INTEGER_TOO_LARGE).var("max", max));
        }
    }
    Coercion::Value(TypedValue::Int(value))
}

fn parse_float(raw: &Value) -> Option<f64> {
    match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|f| f.is_finite())
}

fn coerce_float(declaration: &ParameterDeclaration, raw: &Value) -> Coercion {
    let Some(value) = parse_float(raw) else {
        return Coercion::Rejected(Rejection::code(codes::INVALID_FLOAT));
    };
    if declaration.is_positive() && value <= 0.0 {
        return Coercion::Rejected(Rejection::code(codes::FLOAT_TOO_SMALL).var("min", 0));
    }
    let (min, max) = declaration.float_bounds();
    if let Some(min) = min.filter(|&min| value < min) {
        return Coercion::Rejected(Rejection::code(codes::FLOAT_TOO_SMALL).var("min", min));
    }
    if let Some(max) = max.filter(|&max| value > max) {
        return Coercion::Rejected(Rejection::code(codes::FLOAT_TOO_LARGE).var("max", max));
    }
    Coercion::Value(TypedValue::Float(value))
}

fn parse_bool(raw: &Value) -> Option<bool> {
    match raw {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" => Some(true),
            "0" | "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn parse_string(raw: &Value) -> Option<String> {
    match raw {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn coerce_string(declaration: &ParameterDeclaration, raw: &Value) -> Coercion {
    let Some(value) = parse_string(raw) else {
        return Coercion::Absent;
    };
    let length = value.chars().count();
    let (min, max) = declaration.length_bounds();
    if let Some(min) = min.filter(|&min| length < min) {
        return Coercion::Rejected(Rejection::code(codes::STRING_TOO_SHORT).var("min", min));
    }
    if let Some(max) = max.filter(|&max| length > max) {
        return Coercion::Rejected(Rejection::code(codes::STRING_TOO_LONG).var("max", max));
    }
    Coercion::Value(TypedValue::String(value))
}

fn parse_uuid(raw: &Value) -> Option<Uuid> {
    let text = raw.as_str()?.trim();
    if text.len() != 36 {
        return None;
    }
    Uuid::parse_str(text).ok()
}

fn parse_phrase(raw: &Value, locale: Locale) -> Option<Phrase> {
    match raw {
        Value::Object(map) => Phrase::new(
            map.iter()
                .filter_map(|(code, value)| {
                    let locale = Locale::from_code(code)?;
                    let text = value.as_str()?.trim();
                    (!text.is_empty()).then(|| (locale, text.to_string()))
                })
                .collect(),
        ),
        Value::String(s) => {
            let text = s.trim();
            (!text.is_empty()).then(|| Phrase::make(locale, text))
        }
        _ => None,
    }
}

fn parse_date_time(raw: &Value) -> Option<DateTime<Utc>> {
    match raw {
        Value::Number(n) => DateTime::from_timestamp(n.as_i64()?, 0),
        Value::String(s) => {
            let text = s.trim();
            if let Some(seconds) = parse_int(&Value::from(text)) {
                return DateTime::from_timestamp(seconds, 0);
            }
            DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|d| d.with_timezone(&Utc))
        }
        _ => None,
    }
}

fn parse_date(raw: &Value) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.as_str()?.trim(), "%Y-%m-%d").ok()
}

const fn splits_on_commas(child: ParameterType) -> bool {
    matches!(
        child,
        ParameterType::Integer
            | ParameterType::Uuid
            | ParameterType::String
            | ParameterType::Float
            | ParameterType::Enum
    )
}

fn coerce_array(declaration: &ParameterDeclaration, raw: &Value, locale: Locale) -> Coercion {
    let Some(child) = declaration.child_type() else {
        return Coercion::Absent;
    };
    let elements: Vec<Value> = match raw {
        Value::Array(items) => items.clone(),
        Value::Object(map) => map.values().cloned().collect(),
        Value::String(s) if splits_on_commas(child) => s
            .split(',')
            .map(str::trim)
            .map(Value::from)
            .collect(),
        scalar => vec![scalar.clone()],
    };

    let mut items = Vec::with_capacity(elements.len());
    for element in &elements {
        let item = match child {
            ParameterType::Integer => parse_int(element).map(TypedValue::Int),
            ParameterType::Float => parse_float(element).map(TypedValue::Float),
            ParameterType::Boolean => parse_bool(element).map(TypedValue::Bool),
            ParameterType::String => parse_string(element).map(TypedValue::String),
            ParameterType::Phrase => parse_phrase(element, locale).map(TypedValue::Phrase),
            ParameterType::Uuid => match parse_uuid(element) {
                Some(u) => Some(TypedValue::Uuid(u)),
                None => return Coercion::Rejected(Rejection::code(codes::INVALID_UUID_IN_ARRAY)),
            },
            ParameterType::Enum => {
                match declaration.enum_domain().and_then(|d| d.match_json(element)) {
                    Some(e) => Some(TypedValue::Enum(e)),
                    None => {
                        return Coercion::Rejected(Rejection::code(codes::INVALID_ENUM_VALUE))
                    }
                }
            }
            ParameterType::DateTime => match parse_date_time(element) {
                Some(d) => Some(TypedValue::DateTime(d)),
                None => return Coercion::Rejected(Rejection::code(codes::INVALID_DATE_TIME)),
            },
            ParameterType::Date => match parse_date(element) {
                Some(d) => Some(TypedValue::Date(d)),
                None => return Coercion::Rejected(Rejection::code(codes::INVALID_DATE)),
            },
            ParameterType::Array => None,
        };
        match item {
            Some(item) => items.push(item),
            None => return Coercion::Absent,
        }
    }

    if items.is_empty() {
        Coercion::Absent
    } else {
        Coercion::Value(TypedValue::List(items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EnumDomain, Requirement};
    use serde_json::json;

    fn input(parameters: ParameterSet, raw: Value) -> TypedInput {
        TypedInput::new(parameters, raw.as_object().unwrap(), Locale::En, None)
    }

    fn one(name: &str, declaration: ParameterDeclaration, raw: Value) -> TypedInput {
        input(ParameterSet::from([(name.to_string(), declaration)]), raw)
    }

    fn codes_of(input: &TypedInput) -> Vec<(ErrorCode, Option<String>)> {
        input
            .error()
            .map(|e| {
                e.chain()
                    .filter_map(|link| link.api())
                    .map(|e| (e.code(), e.input_field().map(str::to_string)))
                    .collect()
            })
            .unwrap_or_default()
    }

    #[test]
    fn test_null_required_string_raises_its_code() {
        let input = one(
            "title",
            ParameterDeclaration::string(Requirement::Required(3002)),
            json!({"title": null}),
        );
        assert_eq!(codes_of(&input), vec![(3002, Some("title".to_string()))]);
    }

    #[test]
    fn test_blank_string_is_absent() {
        let input = one(
            "title",
            ParameterDeclaration::string(Requirement::Required(3002)),
            json!({"title": "   "}),
        );
        assert_eq!(codes_of(&input), vec![(3002, Some("title".to_string()))]);
    }

    #[test]
    fn test_errors_chain_latest_first() {
        let params = ParameterSet::from([
            (
                "title".to_string(),
                ParameterDeclaration::string(Requirement::Required(3002)),
            ),
            (
                "author".to_string(),
                ParameterDeclaration::string(Requirement::Required(3003)),
            ),
        ]);
        let input = input(params, json!({}));
        assert_eq!(
            codes_of(&input),
            vec![
                (3003, Some("author".to_string())),
                (3002, Some("title".to_string())),
            ]
        );
        assert!(input.into_result().is_err());
    }

    #[test]
    fn test_integer_coercion() {
        let decl = ParameterDeclaration::integer(Requirement::Optional);
        assert_eq!(one("n", decl.clone(), json!({"n": "2020"})).get_int("n"), Some(2020));
        assert_eq!(one("n", decl.clone(), json!({"n": 7})).get_int("n"), Some(7));
        assert_eq!(one("n", decl.clone(), json!({"n": 7.0})).get_int("n"), Some(7));

        for bad in [json!("07"), json!("7a"), json!(7.5), json!(true), json!(" 7")] {
            let input = one("n", decl.clone(), json!({ "n": bad }));
            assert_eq!(codes_of(&input), vec![(codes::INVALID_INTEGER, Some("n".to_string()))]);
        }
    }

    #[test]
    fn test_invalid_required_value_raises_required_over_format_error() {
        let input = one(
            "id",
            ParameterDeclaration::integer(Requirement::Required(3001)),
            json!({"id": "abc"}),
        );
        assert_eq!(
            codes_of(&input),
            vec![
                (3001, Some("id".to_string())),
                (codes::INVALID_INTEGER, Some("id".to_string())),
            ]
        );

        let uuid = one(
            "owner",
            ParameterDeclaration::uuid(Requirement::Required(3010)),
            json!({"owner": "not-a-uuid"}),
        );
        assert_eq!(
            codes_of(&uuid),
            vec![
                (3010, Some("owner".to_string())),
                (codes::INVALID_UUID, Some("owner".to_string())),
            ]
        );
    }

    #[test]
    fn test_integer_bounds() {
        let decl = ParameterDeclaration::integer(Requirement::Optional)
            .int_min(10)
            .int_max(20);
        let low = one("n", decl.clone(), json!({"n": 5}));
        assert_eq!(low.error().map(ApiError::code), Some(codes::INTEGER_TOO_SMALL));
        assert_eq!(low.error().unwrap().vars().get("min").map(String::as_str), Some("10"));
        let high = one("n", decl.clone(), json!({"n": 25}));
        assert_eq!(high.error().map(ApiError::code), Some(codes::INTEGER_TOO_LARGE));
        assert_eq!(one("n", decl, json!({"n": 15})).get_int("n"), Some(15));

        let positive = ParameterDeclaration::integer(Requirement::Optional).positive();
        let zero = one("n", positive, json!({"n": 0}));
        assert_eq!(zero.error().map(ApiError::code), Some(codes::INTEGER_TOO_SMALL));
    }

    #[test]
    fn test_float_coercion_and_bounds() {
        let decl = ParameterDeclaration::float(Requirement::Optional)
            .float_min(0.5)
            .float_max(2.0);
        assert_eq!(one("f", decl.clone(), json!({"f": "1.5"})).get_float("f"), Some(1.5));
        assert_eq!(one("f", decl.clone(), json!({"f": 1})).get_float("f"), Some(1.0));
        let small = one("f", decl.clone(), json!({"f": 0.1}));
        assert_eq!(small.error().map(ApiError::code), Some(codes::FLOAT_TOO_SMALL));
        let large = one("f", decl.clone(), json!({"f": 3}));
        assert_eq!(large.error().map(ApiError::code), Some(codes::FLOAT_TOO_LARGE));
        let nan = one("f", decl, json!({"f": "NaN"}));
        assert_eq!(nan.error().map(ApiError::code), Some(codes::INVALID_FLOAT));
    }

    #[test]
    fn test_bool_unparseable_is_absent() {
        let decl = ParameterDeclaration::boolean(Requirement::Optional);
        assert_eq!(one("b", decl.clone(), json!({"b": "TRUE"})).get_bool("b"), Some(true));
        assert_eq!(one("b", decl.clone(), json!({"b": "0"})).get_bool("b"), Some(false));
        assert_eq!(one("b", decl.clone(), json!({"b": 1})).get_bool("b"), Some(true));
        let maybe = one("b", decl, json!({"b": "maybe"}));
        assert!(maybe.error().is_none());
        assert_eq!(maybe.get_bool("b"), None);

        let required = one(
            "b",
            ParameterDeclaration::boolean(Requirement::Required(3050)),
            json!({"b": "yes"}),
        );
        assert_eq!(required.error().map(ApiError::code), Some(3050));
    }

    #[test]
    fn test_string_length_counts_characters() {
        let decl = ParameterDeclaration::string(Requirement::Optional)
            .min_length(2)
            .max_length(3);
        assert_eq!(
            one("s", decl.clone(), json!({"s": "жук"})).get_string("s").as_deref(),
            Some("жук")
        );
        let short = one("s", decl.clone(), json!({"s": "a"}));
        assert_eq!(short.error().map(ApiError::code), Some(codes::STRING_TOO_SHORT));
        let long = one("s", decl, json!({"s": "abcd"}));
        assert_eq!(long.error().map(ApiError::code), Some(codes::STRING_TOO_LONG));
    }

    #[test]
    fn test_number_stringified() {
        let input = one(
            "s",
            ParameterDeclaration::string(Requirement::Optional),
            json!({"s": 42}),
        );
        assert_eq!(input.get_string("s").as_deref(), Some("42"));
    }

    #[test]
    fn test_uuid_boundary() {
        let decl = ParameterDeclaration::uuid(Requirement::Optional);
        let valid = one(
            "u",
            decl.clone(),
            json!({"u": "67E55044-10B1-426F-9247-BB680E5FE0C8"}),
        );
        assert_eq!(
            valid.get_uuid("u").map(|u| u.to_string()).as_deref(),
            Some("67e55044-10b1-426f-9247-bb680e5fe0c8")
        );
        for bad in ["67e5504410b1426f9247bb680e5fe0c8", "not-a-uuid", "67e55044-10b1-426f-9247"] {
            let input = one("u", decl.clone(), json!({ "u": bad }));
            assert_eq!(input.error().map(ApiError::code), Some(codes::INVALID_UUID));
        }
    }

    #[test]
    fn test_phrase_coercion() {
        let decl = ParameterDeclaration::phrase(Requirement::Optional);
        let input = one(
            "p",
            decl.clone(),
            json!({"p": {"en": " Hello ", "de": "Hallo", "ru": ""}}),
        );
        let phrase = input.get_phrase("p").unwrap();
        assert_eq!(phrase.get(Locale::En), Some("Hello"));
        assert_eq!(phrase.locales().count(), 1);

        let single = one("p", decl.clone(), json!({"p": "Hi"}));
        assert_eq!(single.get_phrase("p").unwrap().get(Locale::En), Some("Hi"));

        let empty = one("p", decl, json!({"p": {"de": "Hallo"}}));
        assert!(empty.get_phrase("p").is_none());
    }

    #[test]
    fn test_date_time_and_date() {
        let dt = ParameterDeclaration::date_time(Requirement::Optional);
        let input = one("at", dt.clone(), json!({"at": "2024-03-01T12:00:00+03:00"}));
        assert_eq!(input.get_date_time("at").unwrap().timestamp(), 1_709_283_600);
        let unix = one("at", dt.clone(), json!({"at": "1709283600"}));
        assert_eq!(unix.get_date_time("at").unwrap().timestamp(), 1_709_283_600);
        let bad = one("at", dt, json!({"at": "yesterday"}));
        assert_eq!(bad.error().map(ApiError::code), Some(codes::INVALID_DATE_TIME));

        let date = ParameterDeclaration::date(Requirement::Optional);
        let input = one("on", date.clone(), json!({"on": "2024-02-29"}));
        assert_eq!(input.get_date("on").unwrap().to_string(), "2024-02-29");
        let bad = one("on", date, json!({"on": "2023-02-29"}));
        assert_eq!(bad.error().map(ApiError::code), Some(codes::INVALID_DATE));
    }

    #[test]
    fn test_enum_scalar() {
        let decl = ParameterDeclaration::enumeration(
            EnumDomain::of::<Locale>(),
            Requirement::Optional,
        );
        let input = one("lang", decl.clone(), json!({"lang": "kk"}));
        assert_eq!(input.get_enum::<Locale>("lang"), Some(Locale::Kk));
        let bad = one("lang", decl, json!({"lang": "fr"}));
        assert_eq!(
            codes_of(&bad),
            vec![(codes::INVALID_ENUM_VALUE, Some("lang".to_string()))]
        );
    }

    #[test]
    fn test_array_shapes() {
        let decl = ParameterDeclaration::array(ParameterType::Integer, Requirement::Optional);
        assert_eq!(
            one("ids", decl.clone(), json!({"ids": "1, 2,3"})).get_array_of_int("ids"),
            Some(vec![1, 2, 3])
        );
        assert_eq!(
            one("ids", decl.clone(), json!({"ids": [4, "5"]})).get_array_of_int("ids"),
            Some(vec![4, 5])
        );
        assert_eq!(
            one("ids", decl.clone(), json!({"ids": 9})).get_array_of_int("ids"),
            Some(vec![9])
        );
        let abandoned = one("ids", decl, json!({"ids": [1, "x", 3]}));
        assert!(abandoned.error().is_none());
        assert_eq!(abandoned.get_array_of_int("ids"), None);
    }

    #[test]
    fn test_empty_element_abandons_array() {
        let ints = ParameterDeclaration::array(ParameterType::Integer, Requirement::Optional);
        let input = one("ids", ints.clone(), json!({"ids": "1,,2"}));
        assert!(input.error().is_none());
        assert_eq!(input.get_array_of_int("ids"), None);
        assert_eq!(one("ids", ints, json!({"ids": "1,2,"})).get_array_of_int("ids"), None);

        let strings = ParameterDeclaration::array(ParameterType::String, Requirement::Required(3040));
        let input = one("tags", strings, json!({"tags": ["a", null]}));
        assert_eq!(codes_of(&input), vec![(3040, Some("tags".to_string()))]);

        let uuids = ParameterDeclaration::array(ParameterType::Uuid, Requirement::Optional);
        let input = one(
            "ids",
            uuids,
            json!({"ids": "a,,67e55044-10b1-426f-9247-bb680e5fe0c8"}),
        );
        assert_eq!(
            codes_of(&input),
            vec![(codes::INVALID_UUID_IN_ARRAY, Some("ids".to_string()))]
        );
    }

    #[test]
    fn test_array_of_uuid_rejects_bad_element() {
        let decl = ParameterDeclaration::array(ParameterType::Uuid, Requirement::Optional);
        let input = one(
            "ids",
            decl,
            json!({"ids": ["67e55044-10b1-426f-9247-bb680e5fe0c8", "nope"]}),
        );
        assert_eq!(
            codes_of(&input),
            vec![(codes::INVALID_UUID_IN_ARRAY, Some("ids".to_string()))]
        );
    }

    #[test]
    fn test_array_of_enum_rejects_bad_element() {
        let decl = ParameterDeclaration::array_of_enum(
            EnumDomain::of::<Locale>(),
            Requirement::Optional,
        );
        let good = one("langs", decl.clone(), json!({"langs": "ru,en"}));
        assert_eq!(
            good.get_array_of_enum::<Locale>("langs"),
            Some(vec![Locale::Ru, Locale::En])
        );
        let bad = one("langs", decl, json!({"langs": ["ru", "fr"]}));
        assert_eq!(
            codes_of(&bad),
            vec![(codes::INVALID_ENUM_VALUE, Some("langs".to_string()))]
        );
    }

    #[test]
    fn test_array_of_string_rejects_nested() {
        let decl = ParameterDeclaration::array(ParameterType::String, Requirement::Optional);
        let input = one("tags", decl, json!({"tags": ["a", ["b"]]}));
        assert!(input.error().is_none());
        assert_eq!(input.get_array_of_string("tags"), None);
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let input = one(
            "a",
            ParameterDeclaration::integer(Requirement::Optional),
            json!({"a": 1, "zzz": "x"}),
        );
        assert_eq!(input.values().len(), 1);
        assert!(!input.has("zzz"));
    }

    #[test]
    fn test_default_used_when_absent() {
        let decl = ParameterDeclaration::integer(Requirement::Optional).default_value(25);
        let input = one("n", decl, json!({}));
        assert!(!input.has("n"));
        assert_eq!(input.get_int("n"), Some(25));
    }

    #[test]
    #[should_panic(expected = "contract misuse: get_string(\"n\") on a int parameter")]
    fn test_getter_type_mismatch_panics() {
        let input = one(
            "n",
            ParameterDeclaration::integer(Requirement::Optional),
            json!({"n": 1}),
        );
        let _ = input.get_string("n");
    }

    #[test]
    #[should_panic(expected = "undeclared parameter")]
    fn test_getter_undeclared_panics() {
        let input = one(
            "n",
            ParameterDeclaration::integer(Requirement::Optional),
            json!({}),
        );
        let _ = input.get_int("m");
    }

    #[test]
    #[should_panic(expected = "on an optional parameter")]
    fn test_require_on_optional_panics() {
        let input = one(
            "n",
            ParameterDeclaration::integer(Requirement::Optional),
            json!({"n": 1}),
        );
        let _ = input.require_int("n");
    }

    #[test]
    fn test_add_error_chains() {
        let mut input = one(
            "isbn",
            ParameterDeclaration::string(Requirement::Optional),
            json!({"isbn": "123"}),
        );
        input.add_error(3005, "isbn");
        assert_eq!(codes_of(&input), vec![(3005, Some("isbn".to_string()))]);
    }

    fn paged(raw: Value, limit_max: u32) -> TypedInput {
        let spec = SelectionSpec::new("id", SortDirection::Desc)
            .with_aliased_variant("year", "year_published")
            .with_limit_max(limit_max);
        TypedInput::new(
            spec.parameters(),
            raw.as_object().unwrap(),
            Locale::En,
            Some(&spec),
        )
    }

    #[test]
    fn test_selection_limit_clamps_to_max() {
        let state = paged(json!({"limit": 1000}), 30).require_selection_data(500);
        assert_eq!(state.limit(), 30);
        let state = paged(json!({"limit": 0}), 30).require_selection_data(500);
        assert_eq!(state.limit(), 30);
        let state = paged(json!({"limit": "10"}), 30).require_selection_data(500);
        assert_eq!(state.limit(), 10);
    }

    #[test]
    fn test_selection_page_with_no_rows() {
        let state = paged(json!({"page": 5}), 30).require_selection_data(0);
        assert_eq!(state.page(), 1);
        assert_eq!(state.offset(), 0);
    }

    #[test]
    fn test_selection_sort_resolution() {
        let state = paged(json!({"sort_by": "year", "sort_direction": "asc"}), 30)
            .require_selection_data(10);
        assert_eq!(state.sort_by(), "year");
        assert_eq!(state.sort_column(), "year_published");
        assert_eq!(state.sort_direction(), SortDirection::Asc);

        let state = paged(json!({"sort_by": "nope", "sort_direction": "sideways"}), 30)
            .require_selection_data(10);
        assert_eq!(state.sort_by(), "id");
        assert_eq!(state.sort_direction(), SortDirection::Desc);
    }

    #[test]
    #[should_panic(expected = "method without selection")]
    fn test_selection_without_spec_panics() {
        let input = one(
            "n",
            ParameterDeclaration::integer(Requirement::Optional),
            json!({}),
        );
        let _ = input.require_selection_data(1);
    }
}
