//! Error types for the contract layer.
//!
//! Three kinds of failure can end a request:
//!
//! | Kind | Type | HTTP status | Shown to caller |
//! |------|------|-------------|-----------------|
//! | Contract error | [`ApiError`] | 400 | yes, as `errors[]` entries |
//! | Contract violation | [`ContractViolation`] | 503 | no, diagnostics only |
//! | Unexpected failure | [`anyhow::Error`] | 503 | no, diagnostics only |
//!
//! [`Failure`] unifies them so method code can use `?` on any of the three.

use crate::codes::{self, ErrorCode};
use crate::descriptions::DescriptionTable;
use crate::{Locale, Phrase};
use http::StatusCode;
use indexmap::IndexMap;
use std::fmt;
use thiserror::Error;

/// Result type alias for method and pipeline code.
pub type ApiResult<T> = Result<T, Failure>;

/// A recognized, described failure with a stable integer code.
///
/// Contract errors form a chain: each error may wrap a previous [`Failure`]
/// as its cause. The dispatcher walks that chain to build the `errors[]`
/// array of the response envelope.
///
/// # Example
///
/// ```
/// use tabula_core::ApiError;
///
/// let missing = ApiError::with_field(3002, "title");
/// let err = ApiError::with_field(3003, "author").with_previous(missing);
///
/// let codes: Vec<u32> = err.chain().filter_map(|link| link.api().map(ApiError::code)).collect();
/// assert_eq!(codes, vec![3003, 3002]);
/// ```
#[derive(Debug)]
pub struct ApiError {
    code: ErrorCode,
    input_field: Option<String>,
    vars: IndexMap<String, String>,
    previous: Option<Box<Failure>>,
}

impl ApiError {
    /// Creates an error carrying only a code.
    #[must_use]
    pub fn only_code(code: ErrorCode) -> Self {
        Self {
            code,
            input_field: None,
            vars: IndexMap::new(),
            previous: None,
        }
    }

    /// Creates an error attributed to an input field.
    #[must_use]
    pub fn with_field(code: ErrorCode, input_field: impl Into<String>) -> Self {
        Self {
            input_field: Some(input_field.into()),
            ..Self::only_code(code)
        }
    }

    /// Creates the generic internal error wrapping `cause`.
    #[must_use]
    pub fn internal(cause: impl Into<Failure>) -> Self {
        Self::only_code(codes::INTERNAL_SERVER_ERROR).with_previous(cause)
    }

    /// Adds a `{name}` substitution for the description template.
    #[must_use]
    pub fn with_var(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.vars.insert(name.into(), value.to_string());
        self
    }

    /// Chains `previous` as the cause of this error.
    #[must_use]
    pub fn with_previous(mut self, previous: impl Into<Failure>) -> Self {
        self.previous = Some(Box::new(previous.into()));
        self
    }

    /// Returns the error code.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        self.code
    }

    /// Returns the offending input field, if any.
    #[must_use]
    pub fn input_field(&self) -> Option<&str> {
        self.input_field.as_deref()
    }

    /// Returns the template variables.
    #[must_use]
    pub const fn vars(&self) -> &IndexMap<String, String> {
        &self.vars
    }

    /// Returns the chained cause, if any.
    #[must_use]
    pub fn previous(&self) -> Option<&Failure> {
        self.previous.as_deref()
    }

    /// Contract errors are always reported as `400 Bad Request`.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    /// Iterates over this error and its causes, outermost first.
    ///
    /// Iteration stops after the first link that is not an [`ApiError`]; such
    /// failures carry their own `source()` chain for diagnostics.
    #[must_use]
    pub fn chain(&self) -> Chain<'_> {
        Chain {
            next: Some(ChainLink::Api(self)),
        }
    }

    /// Renders the localized description with `{var}` substitution.
    ///
    /// Unknown codes get a generic description that names the code.
    #[must_use]
    pub fn description(&self, table: &dyn DescriptionTable) -> Phrase {
        let template = table.describe(self.code).unwrap_or_else(|| {
            Phrase::make(Locale::Ru, format!("Неизвестная ошибка {}", self.code))
                .with_value(Locale::En, format!("Unknown error {}", self.code))
        });
        if self.vars.is_empty() {
            return template;
        }
        template.map_values(|text| {
            self.vars.iter().fold(text.to_string(), |acc, (name, value)| {
                acc.replace(&format!("{{{name}}}"), value)
            })
        })
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.input_field {
            Some(field) => write!(f, "API error {} on field {field}", self.code),
            None => write!(f, "API error {}", self.code),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.previous
            .as_deref()
            .map(|f| f as &(dyn std::error::Error + 'static))
    }
}

/// One link of an [`ApiError`] cause chain.
#[derive(Debug, Clone, Copy)]
pub enum ChainLink<'a> {
    /// A contract error, serialized into `errors[]`.
    Api(&'a ApiError),
    /// Anything else, recorded as a diagnostic throwable.
    Throwable(&'a Failure),
}

impl<'a> ChainLink<'a> {
    /// Returns the contract error for [`ChainLink::Api`] links.
    #[must_use]
    pub const fn api(self) -> Option<&'a ApiError> {
        match self {
            Self::Api(e) => Some(e),
            Self::Throwable(_) => None,
        }
    }
}

/// Iterator returned by [`ApiError::chain`].
#[derive(Debug)]
pub struct Chain<'a> {
    next: Option<ChainLink<'a>>,
}

impl<'a> Iterator for Chain<'a> {
    type Item = ChainLink<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        if let ChainLink::Api(err) = current {
            self.next = err.previous().map(|failure| match failure {
                Failure::Api(api) => ChainLink::Api(api),
                other => ChainLink::Throwable(other),
            });
        }
        Some(current)
    }
}

/// A method or model produced a value that disagrees with its own declaration.
///
/// These are programming errors. They never reach the caller as structured
/// errors; the response degrades to code 1001 and the detail is recorded as a
/// diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractViolation {
    /// A value has the wrong runtime type.
    #[error("{model} model field {field} must be {expected} (current value: {actual})")]
    IncorrectFieldValue {
        /// Owning model (or method) name.
        model: String,
        /// Field name.
        field: String,
        /// Declared type.
        expected: String,
        /// Debug rendering of the offending value.
        actual: String,
    },

    /// A declared field is absent from public data.
    #[error("{model} model field {field} is declared but missing from public data")]
    MissingField {
        /// Owning model name.
        model: String,
        /// Field name.
        field: String,
    },

    /// Public data contains a field that is not declared.
    #[error("{model} model field {field} is not declared")]
    UndeclaredField {
        /// Owning model name.
        model: String,
        /// Field name.
        field: String,
    },

    /// A non-nullable field holds null.
    #[error("{model} model field {field} must not be null")]
    NullNotAllowed {
        /// Owning model name.
        model: String,
        /// Field name.
        field: String,
    },

    /// An array field holds a keyed map.
    #[error("{model} model field {field} must be disassociative")]
    AssociativeArray {
        /// Owning model name.
        model: String,
        /// Field name.
        field: String,
    },

    /// An object field holds a different model than declared.
    #[error("{model} model field {field} must be {expected} model (current model: {actual})")]
    ModelMismatch {
        /// Owning model name.
        model: String,
        /// Field name.
        field: String,
        /// Declared model name.
        expected: String,
        /// Runtime model name.
        actual: String,
    },

    /// An indexed array element has a missing, mistyped or duplicate index.
    #[error("{model} model field {field} has an invalid index: {reason}")]
    IndexMismatch {
        /// Owning model name.
        model: String,
        /// Field name.
        field: String,
        /// What went wrong.
        reason: String,
    },

    /// A method returned nothing although its result is not nullable.
    #[error("method {method} returns null")]
    UnexpectedNull {
        /// Method name.
        method: String,
    },

    /// A void method returned a value.
    #[error("method {method} must return null")]
    UnexpectedResult {
        /// Method name.
        method: String,
    },
}

impl ContractViolation {
    /// Creates an [`IncorrectFieldValue`](Self::IncorrectFieldValue) violation.
    #[must_use]
    pub fn incorrect_value(
        model: impl Into<String>,
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::IncorrectFieldValue {
            model: model.into(),
            field: field.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Creates a [`MissingField`](Self::MissingField) violation.
    #[must_use]
    pub fn missing_field(model: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingField {
            model: model.into(),
            field: field.into(),
        }
    }

    /// Creates an [`UndeclaredField`](Self::UndeclaredField) violation.
    #[must_use]
    pub fn undeclared_field(model: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UndeclaredField {
            model: model.into(),
            field: field.into(),
        }
    }

    /// Creates a [`NullNotAllowed`](Self::NullNotAllowed) violation.
    #[must_use]
    pub fn null_not_allowed(model: impl Into<String>, field: impl Into<String>) -> Self {
        Self::NullNotAllowed {
            model: model.into(),
            field: field.into(),
        }
    }

    /// Creates an [`AssociativeArray`](Self::AssociativeArray) violation.
    #[must_use]
    pub fn associative_array(model: impl Into<String>, field: impl Into<String>) -> Self {
        Self::AssociativeArray {
            model: model.into(),
            field: field.into(),
        }
    }

    /// Creates a [`ModelMismatch`](Self::ModelMismatch) violation.
    #[must_use]
    pub fn model_mismatch(
        model: impl Into<String>,
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::ModelMismatch {
            model: model.into(),
            field: field.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Creates an [`IndexMismatch`](Self::IndexMismatch) violation.
    #[must_use]
    pub fn index_mismatch(
        model: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::IndexMismatch {
            model: model.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Any failure a method invocation can end with.
#[derive(Debug, Error)]
pub enum Failure {
    /// A described contract error.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A declaration was not honoured by its author.
    #[error(transparent)]
    Violation(#[from] ContractViolation),

    /// Anything else (store failures, collaborator bugs).
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl Failure {
    /// Short class name used in diagnostics.
    #[must_use]
    pub const fn class(&self) -> &'static str {
        match self {
            Self::Api(_) => "ApiError",
            Self::Violation(_) => "ContractViolation",
            Self::Unexpected(_) => "UnexpectedFailure",
        }
    }

    /// Returns `true` for described contract errors.
    #[must_use]
    pub const fn is_api(&self) -> bool {
        matches!(self, Self::Api(_))
    }

    /// `400` for contract errors, `503` for everything else.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Api(_) => StatusCode::BAD_REQUEST,
            Self::Violation(_) | Self::Unexpected(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Converts into a contract error, wrapping non-contract failures as 1001.
    #[must_use]
    pub fn into_api_error(self) -> ApiError {
        match self {
            Self::Api(err) => err,
            other => ApiError::internal(other),
        }
    }

    /// Messages of this failure and its `source()` chain.
    #[must_use]
    pub fn trace(&self) -> Vec<String> {
        let mut trace = Vec::new();
        let mut current: Option<&(dyn std::error::Error + 'static)> = Some(self);
        while let Some(err) = current {
            trace.push(err.to_string());
            current = err.source();
        }
        trace
    }
}
