//! Model field declarations.

use crate::{DeclarationError, DeclarationResult, FieldType, IndexType, ModelRef};
use indexmap::IndexMap;
use serde::Serialize;

/// Declared fields of a model, in output order.
pub type FieldSet = IndexMap<&'static str, FieldDeclaration>;

/// Declaration of one model field, or of a method result.
///
/// # Example
///
/// ```
/// use tabula_contract::{FieldDeclaration, FieldType};
///
/// let year = FieldDeclaration::integer(true).with_description("Publication year");
/// assert!(year.is_nullable());
///
/// let tags = FieldDeclaration::array_of_scalar(FieldType::String);
/// assert_eq!(tags.array_child_type(), Some(FieldType::String));
/// assert!(!tags.is_map());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDeclaration {
    #[serde(rename = "type")]
    kind: FieldType,
    nullable: bool,
    #[serde(rename = "model", skip_serializing_if = "Option::is_none")]
    model: Option<ModelRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    array_child_type: Option<FieldType>,
    #[serde(rename = "array_child_model", skip_serializing_if = "Option::is_none")]
    array_child_model: Option<ModelRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    array_child_index_type: Option<IndexType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl FieldDeclaration {
    /// Checked constructor.
    ///
    /// # Errors
    ///
    /// Returns a [`DeclarationError`] when the combination is not allowed:
    /// objects need a model, arrays are never nullable and never nest, and
    /// an index type needs an array of objects whose model declares an index
    /// of exactly that type.
    pub fn try_new(
        kind: FieldType,
        nullable: bool,
        model: Option<ModelRef>,
        array_child_type: Option<FieldType>,
        array_child_model: Option<ModelRef>,
        array_child_index_type: Option<IndexType>,
    ) -> DeclarationResult<Self> {
        match kind {
            FieldType::Object => {
                if model.is_none() {
                    return Err(DeclarationError::MissingModel);
                }
            }
            _ if model.is_some() => return Err(DeclarationError::UnexpectedModel { kind }),
            _ => {}
        }

        if kind == FieldType::Array {
            if nullable {
                return Err(DeclarationError::NullableArray);
            }
            match array_child_type {
                Some(FieldType::Array) => return Err(DeclarationError::NestedArray),
                Some(FieldType::Object) => {
                    let child = array_child_model.ok_or(DeclarationError::MissingChildModel)?;
                    if let Some(index) = array_child_index_type {
                        if child.index_type() != Some(index) {
                            return Err(DeclarationError::index_not_declared(child.name(), index));
                        }
                    }
                }
                Some(_) | None => {
                    if array_child_model.is_some() {
                        return Err(DeclarationError::UnexpectedModel { kind });
                    }
                    if array_child_index_type.is_some() {
                        return Err(DeclarationError::IndexWithoutObjects);
                    }
                }
            }
        } else if array_child_type.is_some()
            || array_child_model.is_some()
            || array_child_index_type.is_some()
        {
            return Err(DeclarationError::UnexpectedArrayChild { kind });
        }

        Ok(Self {
            kind,
            nullable,
            model,
            array_child_type,
            array_child_model,
            array_child_index_type,
            description: None,
        })
    }

    fn build(
        kind: FieldType,
        nullable: bool,
        model: Option<ModelRef>,
        child: Option<FieldType>,
        child_model: Option<ModelRef>,
        index: Option<IndexType>,
    ) -> Self {
        match Self::try_new(kind, nullable, model, child, child_model, index) {
            Ok(field) => field,
            Err(err) => panic!("invalid field declaration: {err}"),
        }
    }

    /// A scalar field. Panics for `object` and `array`.
    #[must_use]
    pub fn scalar(kind: FieldType, nullable: bool) -> Self {
        assert!(
            kind.is_scalar(),
            "invalid field declaration: {kind} is not a scalar type"
        );
        Self::build(kind, nullable, None, None, None, None)
    }

    /// A string field.
    #[must_use]
    pub fn string(nullable: bool) -> Self {
        Self::scalar(FieldType::String, nullable)
    }

    /// An integer field.
    #[must_use]
    pub fn integer(nullable: bool) -> Self {
        Self::scalar(FieldType::Integer, nullable)
    }

    /// A float field.
    #[must_use]
    pub fn float(nullable: bool) -> Self {
        Self::scalar(FieldType::Float, nullable)
    }

    /// A boolean field.
    #[must_use]
    pub fn boolean(nullable: bool) -> Self {
        Self::scalar(FieldType::Boolean, nullable)
    }

    /// A UUID field.
    #[must_use]
    pub fn uuid(nullable: bool) -> Self {
        Self::scalar(FieldType::Uuid, nullable)
    }

    /// A unix-seconds timestamp field.
    #[must_use]
    pub fn timestamp(nullable: bool) -> Self {
        Self::scalar(FieldType::Timestamp, nullable)
    }

    /// A phrase field.
    #[must_use]
    pub fn phrase(nullable: bool) -> Self {
        Self::scalar(FieldType::Phrase, nullable)
    }

    /// A nested model.
    #[must_use]
    pub fn object(model: ModelRef, nullable: bool) -> Self {
        Self::build(FieldType::Object, nullable, Some(model), None, None, None)
    }

    /// An untyped array, emitted as-is.
    #[must_use]
    pub fn array() -> Self {
        Self::build(FieldType::Array, false, None, None, None, None)
    }

    /// A list of scalars. Panics for non-scalar children.
    #[must_use]
    pub fn array_of_scalar(child: FieldType) -> Self {
        assert!(
            child.is_scalar(),
            "invalid field declaration: array child {child} is not a scalar type"
        );
        Self::build(FieldType::Array, false, None, Some(child), None, None)
    }

    /// A list of models, or an index map when `index` is given.
    #[must_use]
    pub fn array_of_objects(model: ModelRef, index: Option<IndexType>) -> Self {
        Self::build(
            FieldType::Array,
            false,
            None,
            Some(FieldType::Object),
            Some(model),
            index,
        )
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns the declared type.
    #[must_use]
    pub const fn kind(&self) -> FieldType {
        self.kind
    }

    /// Returns `true` if null is allowed.
    #[must_use]
    pub const fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Returns the model of `object` fields.
    #[must_use]
    pub const fn model(&self) -> Option<ModelRef> {
        self.model
    }

    /// Returns the element type of arrays.
    #[must_use]
    pub const fn array_child_type(&self) -> Option<FieldType> {
        self.array_child_type
    }

    /// Returns the element model of arrays of objects.
    #[must_use]
    pub const fn array_child_model(&self) -> Option<ModelRef> {
        self.array_child_model
    }

    /// Returns the index type of index maps.
    #[must_use]
    pub const fn array_child_index_type(&self) -> Option<IndexType> {
        self.array_child_index_type
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns `true` for arrays emitted as index-keyed maps.
    #[must_use]
    pub const fn is_map(&self) -> bool {
        self.array_child_index_type.is_some()
    }

    /// Models referenced directly by this field.
    pub fn referenced_models(&self) -> impl Iterator<Item = ModelRef> {
        self.model.into_iter().chain(self.array_child_model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ModelContract;
    use serde_json::json;

    struct Shelf;

    impl ModelContract for Shelf {
        const NAME: &'static str = "Shelf";
        const INDEX: Option<IndexType> = Some(IndexType::Integer);

        fn fields() -> FieldSet {
            FieldSet::from([("id", FieldDeclaration::integer(false))])
        }
    }

    struct Note;

    impl ModelContract for Note {
        const NAME: &'static str = "Note";

        fn fields() -> FieldSet {
            FieldSet::new()
        }
    }

    #[test]
    fn test_object_requires_model() {
        let err = FieldDeclaration::try_new(FieldType::Object, false, None, None, None, None)
            .unwrap_err();
        assert_eq!(err, DeclarationError::MissingModel);
    }

    #[test]
    fn test_scalar_rejects_model() {
        let err = FieldDeclaration::try_new(
            FieldType::String,
            false,
            Some(Shelf::model_ref()),
            None,
            None,
            None,
        )
        .unwrap_err();
        assert_eq!(
            err,
            DeclarationError::UnexpectedModel {
                kind: FieldType::String
            }
        );
    }

    #[test]
    fn test_array_never_nullable() {
        let err =
            FieldDeclaration::try_new(FieldType::Array, true, None, None, None, None).unwrap_err();
        assert_eq!(err, DeclarationError::NullableArray);
    }

    #[test]
    fn test_nested_array_denied() {
        let err = FieldDeclaration::try_new(
            FieldType::Array,
            false,
            None,
            Some(FieldType::Array),
            None,
            None,
        )
        .unwrap_err();
        assert_eq!(err, DeclarationError::NestedArray);
    }

    #[test]
    fn test_array_of_objects_requires_model() {
        let err = FieldDeclaration::try_new(
            FieldType::Array,
            false,
            None,
            Some(FieldType::Object),
            None,
            None,
        )
        .unwrap_err();
        assert_eq!(err, DeclarationError::MissingChildModel);
    }

    #[test]
    fn test_index_must_match_model() {
        let map = FieldDeclaration::array_of_objects(Shelf::model_ref(), Some(IndexType::Integer));
        assert!(map.is_map());

        let err = FieldDeclaration::try_new(
            FieldType::Array,
            false,
            None,
            Some(FieldType::Object),
            Some(Shelf::model_ref()),
            Some(IndexType::String),
        )
        .unwrap_err();
        assert_eq!(err, DeclarationError::index_not_declared("Shelf", IndexType::String));

        let err = FieldDeclaration::try_new(
            FieldType::Array,
            false,
            None,
            Some(FieldType::Object),
            Some(Note::model_ref()),
            Some(IndexType::Integer),
        )
        .unwrap_err();
        assert_eq!(err, DeclarationError::index_not_declared("Note", IndexType::Integer));
    }

    #[test]
    fn test_index_only_for_objects() {
        let err = FieldDeclaration::try_new(
            FieldType::Array,
            false,
            None,
            Some(FieldType::Integer),
            None,
            Some(IndexType::Integer),
        )
        .unwrap_err();
        assert_eq!(err, DeclarationError::IndexWithoutObjects);
    }

    #[test]
    #[should_panic(expected = "is not a scalar type")]
    fn test_array_of_scalar_rejects_object() {
        let _ = FieldDeclaration::array_of_scalar(FieldType::Object);
    }

    #[test]
    fn test_untyped_array() {
        let any = FieldDeclaration::array();
        assert_eq!(any.array_child_type(), None);
        assert!(!any.is_nullable());
        assert_eq!(any.referenced_models().count(), 0);
    }

    #[test]
    fn test_serialization() {
        let field = FieldDeclaration::array_of_objects(Shelf::model_ref(), None);
        assert_eq!(
            serde_json::to_value(&field).unwrap(),
            json!({
                "type": "array",
                "nullable": false,
                "array_child_type": "object",
                "array_child_model": "Shelf"
            })
        );
    }
}
