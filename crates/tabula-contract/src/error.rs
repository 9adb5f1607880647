//! Declaration errors.

use crate::{FieldType, IndexType, ParameterType};
use thiserror::Error;

/// Result type alias for checked declaration constructors.
pub type DeclarationResult<T> = Result<T, DeclarationError>;

/// A parameter or field declaration breaks one of its construction rules.
///
/// The convenience constructors panic with this error's message; the
/// `try_new` constructors return it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeclarationError {
    /// An array parameter has no child type.
    #[error("array parameter requires a child type")]
    MissingChildType,

    /// A non-array, non-enum parameter was given a child type.
    #[error("{kind} parameter must not have a child type")]
    UnexpectedChildType {
        /// The declared type.
        kind: ParameterType,
    },

    /// Arrays of arrays are not supported.
    #[error("array of arrays is not supported")]
    NestedArray,

    /// An enum parameter (or array of enums) has no domain.
    #[error("enum parameter requires an enum domain")]
    MissingEnumDomain,

    /// An enum domain was given to a type that cannot use it.
    #[error("{kind} parameter must not have an enum domain")]
    UnexpectedEnumDomain {
        /// The declared type.
        kind: ParameterType,
    },

    /// An enum domain has no variants.
    #[error("enum domain {name} has no values")]
    EmptyEnumDomain {
        /// Domain name.
        name: String,
    },

    /// An object field has no model.
    #[error("object field requires a model")]
    MissingModel,

    /// A model was given to a field that cannot hold one.
    #[error("{kind} field must not reference a model")]
    UnexpectedModel {
        /// The declared type.
        kind: FieldType,
    },

    /// Array fields are never nullable.
    #[error("array field cannot be nullable")]
    NullableArray,

    /// Array fields with an `object` child need the child model.
    #[error("array of objects requires a child model")]
    MissingChildModel,

    /// Only arrays may declare child types.
    #[error("{kind} field must not declare array children")]
    UnexpectedArrayChild {
        /// The declared type.
        kind: FieldType,
    },

    /// Index types are only meaningful for arrays of objects.
    #[error("index type is only allowed for arrays of objects")]
    IndexWithoutObjects,

    /// The model's index accessor has a different type, or none.
    #[error("model {model} has no {index} index")]
    IndexNotDeclared {
        /// Model name.
        model: String,
        /// The requested index type.
        index: IndexType,
    },
}

impl DeclarationError {
    /// Creates an [`DeclarationError::UnexpectedChildType`] error.
    #[must_use]
    pub const fn unexpected_child(kind: ParameterType) -> Self {
        Self::UnexpectedChildType { kind }
    }

    /// Creates an [`DeclarationError::IndexNotDeclared`] error.
    #[must_use]
    pub fn index_not_declared(model: impl Into<String>, index: IndexType) -> Self {
        Self::IndexNotDeclared {
            model: model.into(),
            index,
        }
    }
}
