//! Model contracts and runtime model values.
//!
//! A model type has two sides. The static side, [`ModelContract`], names the
//! model and declares its fields. The runtime side, [`ImmutableModel`] or
//! [`MutableModel`], projects an instance into [`PublicData`]. A
//! [`ModelValue`] pairs an instance with its [`ModelRef`] so the serializer
//! can check one against the other.

use crate::{FieldSet, IndexType, PublicData};
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;
use tabula_core::Session;

/// Static declaration of a model.
///
/// # Example
///
/// ```
/// use tabula_contract::prelude::*;
///
/// struct Author { id: i64, name: String }
///
/// impl ModelContract for Author {
///     const NAME: &'static str = "Author";
///     const INDEX: Option<IndexType> = Some(IndexType::Integer);
///
///     fn fields() -> FieldSet {
///         FieldSet::from([
///             ("id", FieldDeclaration::integer(false)),
///             ("name", FieldDeclaration::string(false)),
///         ])
///     }
/// }
///
/// impl ImmutableModel for Author {
///     fn public_data(&self) -> PublicData {
///         public_data! { "id" => self.id, "name" => self.name.as_str() }
///     }
///
///     fn index(&self) -> Option<IndexValue> {
///         Some(IndexValue::Int(self.id))
///     }
/// }
///
/// let value = ModelValue::immutable(Author { id: 1, name: "Ada".into() });
/// assert_eq!(value.name(), "Author");
/// assert_eq!(value.public_data(None).len(), 2);
/// ```
pub trait ModelContract: 'static {
    /// Model name, as registered in the catalog.
    const NAME: &'static str;
    /// Human description.
    const DESCRIPTION: Option<&'static str> = None;
    /// Type of the index accessor, if the model is indexable.
    const INDEX: Option<IndexType> = None;
    /// Whether public data depends on the viewer.
    const MUTABLE: bool = false;
    /// Cache lifetime hint in seconds.
    const CACHE_TTL: u32 = 0;

    /// Declared fields, in output order.
    fn fields() -> FieldSet;

    /// A type-erased reference to this contract.
    #[must_use]
    fn model_ref() -> ModelRef
    where
        Self: Sized,
    {
        ModelRef::of::<Self>()
    }
}

/// Type-erased handle to a [`ModelContract`].
///
/// Two references are equal when they name the same model.
#[derive(Clone, Copy)]
pub struct ModelRef {
    name: &'static str,
    description: Option<&'static str>,
    index: Option<IndexType>,
    mutable: bool,
    cache_ttl: u32,
    fields: fn() -> FieldSet,
}

impl ModelRef {
    /// Captures the contract of `M`.
    #[must_use]
    pub fn of<M: ModelContract>() -> Self {
        Self {
            name: M::NAME,
            description: M::DESCRIPTION,
            index: M::INDEX,
            mutable: M::MUTABLE,
            cache_ttl: M::CACHE_TTL,
            fields: M::fields,
        }
    }

    /// Returns the model name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the description.
    #[must_use]
    pub const fn description(&self) -> Option<&'static str> {
        self.description
    }

    /// Returns the index type.
    #[must_use]
    pub const fn index_type(&self) -> Option<IndexType> {
        self.index
    }

    /// Returns `true` for viewer-dependent models.
    #[must_use]
    pub const fn is_mutable(&self) -> bool {
        self.mutable
    }

    /// Returns the cache lifetime hint.
    #[must_use]
    pub const fn cache_ttl(&self) -> u32 {
        self.cache_ttl
    }

    /// Builds the declared field set.
    #[must_use]
    pub fn fields(&self) -> FieldSet {
        (self.fields)()
    }
}

impl PartialEq for ModelRef {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for ModelRef {}

impl fmt::Debug for ModelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ModelRef").field(&self.name).finish()
    }
}

impl Serialize for ModelRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name)
    }
}

/// Key produced by a model's index accessor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndexValue {
    /// Integer key.
    Int(i64),
    /// String key.
    Str(String),
}

impl IndexValue {
    /// The type of this key.
    #[must_use]
    pub const fn index_type(&self) -> IndexType {
        match self {
            Self::Int(_) => IndexType::Integer,
            Self::Str(_) => IndexType::String,
        }
    }

    /// The key as a JSON object key.
    #[must_use]
    pub fn to_key(&self) -> String {
        match self {
            Self::Int(i) => i.to_string(),
            Self::Str(s) => s.clone(),
        }
    }
}

/// A model whose public data is the same for every viewer.
pub trait ImmutableModel: Send + Sync {
    /// Projects the instance into its declared fields.
    fn public_data(&self) -> PublicData;

    /// Index key, for models declaring [`ModelContract::INDEX`].
    fn index(&self) -> Option<IndexValue> {
        None
    }
}

/// A model whose public data may be redacted per viewer.
pub trait MutableModel: Send + Sync {
    /// Projects the instance for `viewer`.
    fn public_data(&self, viewer: Option<&Session>) -> PublicData;

    /// Index key, for models declaring [`ModelContract::INDEX`].
    fn index(&self) -> Option<IndexValue> {
        None
    }
}

#[derive(Clone)]
enum Instance {
    Immutable(Arc<dyn ImmutableModel>),
    Mutable(Arc<dyn MutableModel>),
}

/// A model instance paired with its contract.
#[derive(Clone)]
pub struct ModelValue {
    contract: ModelRef,
    instance: Instance,
}

impl ModelValue {
    /// Wraps an immutable model.
    #[must_use]
    pub fn immutable<M: ImmutableModel + ModelContract>(model: M) -> Self {
        Self {
            contract: ModelRef::of::<M>(),
            instance: Instance::Immutable(Arc::new(model)),
        }
    }

    /// Wraps a viewer-dependent model.
    #[must_use]
    pub fn mutable<M: MutableModel + ModelContract>(model: M) -> Self {
        Self {
            contract: ModelRef::of::<M>(),
            instance: Instance::Mutable(Arc::new(model)),
        }
    }

    /// Returns the contract.
    #[must_use]
    pub const fn contract(&self) -> ModelRef {
        self.contract
    }

    /// Returns the model name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.contract.name
    }

    /// Projects the instance. Immutable models ignore `viewer`.
    #[must_use]
    pub fn public_data(&self, viewer: Option<&Session>) -> PublicData {
        match &self.instance {
            Instance::Immutable(model) => model.public_data(),
            Instance::Mutable(model) => model.public_data(viewer),
        }
    }

    /// Returns the index key.
    #[must_use]
    pub fn index(&self) -> Option<IndexValue> {
        match &self.instance {
            Instance::Immutable(model) => model.index(),
            Instance::Mutable(model) => model.index(),
        }
    }
}

impl fmt::Debug for ModelValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ModelValue").field(&self.contract.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{public_data, FieldDeclaration};
    use tabula_core::{Actor, Locale};

    struct Tag(String);

    impl ModelContract for Tag {
        const NAME: &'static str = "Tag";
        const INDEX: Option<IndexType> = Some(IndexType::String);

        fn fields() -> FieldSet {
            FieldSet::from([("label", FieldDeclaration::string(false))])
        }
    }

    impl ImmutableModel for Tag {
        fn public_data(&self) -> PublicData {
            public_data! { "label" => self.0.as_str() }
        }

        fn index(&self) -> Option<IndexValue> {
            Some(IndexValue::Str(self.0.clone()))
        }
    }

    struct Secret {
        owner: i64,
    }

    impl ModelContract for Secret {
        const NAME: &'static str = "Secret";
        const MUTABLE: bool = true;

        fn fields() -> FieldSet {
            FieldSet::from([("value", FieldDeclaration::string(true))])
        }
    }

    impl MutableModel for Secret {
        fn public_data(&self, viewer: Option<&Session>) -> PublicData {
            let visible = viewer.is_some_and(|s| s.is_actor(self.owner));
            public_data! { "value" => visible.then_some("hidden") }
        }
    }

    #[test]
    fn test_model_ref_captures_contract() {
        let tag = Tag::model_ref();
        assert_eq!(tag.name(), "Tag");
        assert_eq!(tag.index_type(), Some(IndexType::String));
        assert!(!tag.is_mutable());
        assert_eq!(tag.fields().len(), 1);
        assert_eq!(tag, ModelRef::of::<Tag>());
        assert_ne!(tag, Secret::model_ref());
    }

    #[test]
    fn test_immutable_value() {
        let value = ModelValue::immutable(Tag("rust".into()));
        assert_eq!(value.index(), Some(IndexValue::Str("rust".into())));
        assert_eq!(value.public_data(None).keys().collect::<Vec<_>>(), vec!["label"]);
    }

    #[test]
    fn test_mutable_value_redacts_per_viewer() {
        let value = ModelValue::mutable(Secret { owner: 7 });
        let owner = Session::new(Locale::En).with_actor(Actor::new(7));
        let stranger = Session::new(Locale::En).with_actor(Actor::new(8));

        assert!(!value.public_data(Some(&owner))["value"].is_null());
        assert!(value.public_data(Some(&stranger))["value"].is_null());
        assert!(value.public_data(None)["value"].is_null());
        assert!(value.contract().is_mutable());
    }

    #[test]
    fn test_index_value_keys() {
        assert_eq!(IndexValue::Int(5).to_key(), "5");
        assert_eq!(IndexValue::Int(5).index_type(), IndexType::Integer);
    }
}
