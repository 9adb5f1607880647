//! The explicit method registry.

use crate::{ApiMethod, ImmutableMethod, ModelRef, MutableMethod};
use std::collections::{BTreeMap, BTreeSet};

/// All methods an API serves, keyed by name.
///
/// The registry is assembled once at startup and shared read-only. Discovery
/// walks it, together with every model reachable from the result fields, to
/// build the catalog.
///
/// # Example
///
/// ```
/// use tabula_contract::MethodRegistry;
///
/// let registry = MethodRegistry::new();
/// assert!(registry.is_empty());
/// assert!(registry.get("getBooks").is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MethodRegistry {
    methods: BTreeMap<String, ApiMethod>,
}

impl MethodRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            methods: BTreeMap::new(),
        }
    }

    /// Registers a method. Panics if the name is already taken.
    pub fn register(&mut self, method: ApiMethod) {
        let name = method.name().to_string();
        assert!(
            !self.methods.contains_key(&name),
            "contract misuse: method {name} registered twice"
        );
        tracing::debug!(method = %name, mutable = method.is_mutable(), "method registered");
        self.methods.insert(name, method);
    }

    /// Registers an immutable method.
    pub fn register_immutable(&mut self, method: impl ImmutableMethod + 'static) {
        self.register(ApiMethod::immutable(method));
    }

    /// Registers a mutable method.
    pub fn register_mutable(&mut self, method: impl MutableMethod + 'static) {
        self.register(ApiMethod::mutable(method));
    }

    /// Chaining form of [`Self::register_immutable`].
    #[must_use]
    pub fn with_immutable(mut self, method: impl ImmutableMethod + 'static) -> Self {
        self.register_immutable(method);
        self
    }

    /// Chaining form of [`Self::register_mutable`].
    #[must_use]
    pub fn with_mutable(mut self, method: impl MutableMethod + 'static) -> Self {
        self.register_mutable(method);
        self
    }

    /// Looks a method up by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ApiMethod> {
        self.methods.get(name)
    }

    /// Checks if a method is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Returns the number of registered methods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Returns `true` if no methods are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Methods sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = &ApiMethod> {
        self.methods.values()
    }

    /// Method names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    /// Every model reachable from a result field, sorted by name.
    #[must_use]
    pub fn models(&self) -> Vec<ModelRef> {
        let mut seen = BTreeSet::new();
        let mut found = Vec::new();
        let mut pending: Vec<ModelRef> = self
            .iter()
            .filter_map(|m| m.declaration().result())
            .flat_map(|field| field.referenced_models().collect::<Vec<_>>())
            .collect();

        while let Some(model) = pending.pop() {
            if !seen.insert(model.name()) {
                continue;
            }
            for field in model.fields().values() {
                pending.extend(field.referenced_models());
            }
            found.push(model);
        }

        found.sort_by_key(ModelRef::name);
        found
    }
}
