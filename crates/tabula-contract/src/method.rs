//! Method declarations and implementations.

use crate::{FieldDeclaration, OutputValue, ParameterDeclaration, ParameterSet, SelectionSpec, TypedInput};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tabula_core::{ErrorCode, Failure, Session};

/// What a method returns: a value, nothing (void methods), or a failure.
pub type MethodResult = Result<Option<OutputValue>, Failure>;

/// Static contract of a method.
///
/// # Example
///
/// ```
/// use tabula_contract::prelude::*;
///
/// let declaration = MethodDeclaration::builder("getBooksWithId")
///     .description("Returns one book")
///     .parameter("id", ParameterDeclaration::integer(Requirement::Required(3001)))
///     .result(FieldDeclaration::string(false))
///     .possible_errors([2005])
///     .build();
///
/// assert_eq!(declaration.name(), "getBooksWithId");
/// assert_eq!(declaration.all_parameters_filtered(Some(true)).len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct MethodDeclaration {
    name: String,
    description: Option<String>,
    parameters: ParameterSet,
    selection: Option<SelectionSpec>,
    all_parameters: Arc<ParameterSet>,
    result: Option<FieldDeclaration>,
    possible_errors: Vec<ErrorCode>,
    only_for_users: bool,
}

impl MethodDeclaration {
    /// Starts a declaration for the method `name`.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> MethodDeclarationBuilder {
        MethodDeclarationBuilder {
            name: name.into(),
            description: None,
            parameters: ParameterSet::new(),
            selection: None,
            result: None,
            possible_errors: Vec::new(),
            only_for_users: false,
        }
    }

    /// Returns the method name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The method's own parameters, without selection.
    #[must_use]
    pub const fn parameters(&self) -> &ParameterSet {
        &self.parameters
    }

    /// Returns the selection spec.
    #[must_use]
    pub const fn selection(&self) -> Option<&SelectionSpec> {
        self.selection.as_ref()
    }

    /// Selection parameters first, then the method's own.
    #[must_use]
    pub fn all_parameters(&self) -> Arc<ParameterSet> {
        Arc::clone(&self.all_parameters)
    }

    /// [`Self::all_parameters`], keeping only required (`Some(true)`) or
    /// optional (`Some(false)`) parameters.
    #[must_use]
    pub fn all_parameters_filtered(&self, required: Option<bool>) -> ParameterSet {
        self.all_parameters
            .iter()
            .filter(|(_, p)| required.map_or(true, |r| p.is_required() == r))
            .map(|(name, p)| (name.clone(), p.clone()))
            .collect()
    }

    /// The result field; `None` for void methods.
    #[must_use]
    pub const fn result(&self) -> Option<&FieldDeclaration> {
        self.result.as_ref()
    }

    /// Codes the method raises itself.
    #[must_use]
    pub fn possible_errors(&self) -> &[ErrorCode] {
        &self.possible_errors
    }

    /// Returns `true` if anonymous sessions are refused.
    #[must_use]
    pub const fn only_for_users(&self) -> bool {
        self.only_for_users
    }
}

/// Builder for [`MethodDeclaration`].
#[derive(Debug)]
pub struct MethodDeclarationBuilder {
    name: String,
    description: Option<String>,
    parameters: ParameterSet,
    selection: Option<SelectionSpec>,
    result: Option<FieldDeclaration>,
    possible_errors: Vec<ErrorCode>,
    only_for_users: bool,
}

impl MethodDeclarationBuilder {
    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Declares a parameter.
    #[must_use]
    pub fn parameter(mut self, name: impl Into<String>, declaration: ParameterDeclaration) -> Self {
        self.parameters.insert(name.into(), declaration);
        self
    }

    /// Enables pagination and sorting.
    #[must_use]
    pub fn selection(mut self, selection: SelectionSpec) -> Self {
        self.selection = Some(selection);
        self
    }

    /// Sets the result field.
    #[must_use]
    pub fn result(mut self, result: FieldDeclaration) -> Self {
        self.result = Some(result);
        self
    }

    /// Adds codes the method raises itself.
    #[must_use]
    pub fn possible_errors(mut self, codes: impl IntoIterator<Item = ErrorCode>) -> Self {
        self.possible_errors.extend(codes);
        self
    }

    /// Refuses anonymous sessions.
    #[must_use]
    pub const fn only_for_users(mut self) -> Self {
        self.only_for_users = true;
        self
    }

    /// Finishes the declaration.
    #[must_use]
    pub fn build(self) -> MethodDeclaration {
        let mut all_parameters = self
            .selection
            .as_ref()
            .map(SelectionSpec::parameters)
            .unwrap_or_default();
        for (name, declaration) in &self.parameters {
            all_parameters.insert(name.clone(), declaration.clone());
        }

        MethodDeclaration {
            name: self.name,
            description: self.description,
            parameters: self.parameters,
            selection: self.selection,
            all_parameters: Arc::new(all_parameters),
            result: self.result,
            possible_errors: self.possible_errors,
            only_for_users: self.only_for_users,
        }
    }
}

/// A method whose output does not depend on who is calling.
#[async_trait]
pub trait ImmutableMethod: Send + Sync {
    /// The method contract. Called once, at registration.
    fn declaration(&self) -> MethodDeclaration;

    /// Cache lifetime hint in seconds.
    fn cache_ttl(&self) -> u32 {
        0
    }

    /// Runs the method on validated input.
    async fn handle(&self, input: &TypedInput) -> MethodResult;
}

/// A method that acts on behalf of the caller's session.
#[async_trait]
pub trait MutableMethod: Send + Sync {
    /// The method contract. Called once, at registration.
    fn declaration(&self) -> MethodDeclaration;

    /// Runs the method on validated input for `session`.
    async fn handle(&self, input: &TypedInput, session: Option<&Session>) -> MethodResult;
}

/// A registered method: its declaration and its implementation.
#[derive(Clone)]
pub enum ApiMethod {
    /// Session-independent method.
    Immutable {
        /// The contract.
        declaration: Arc<MethodDeclaration>,
        /// Cache lifetime hint in seconds.
        cache_ttl: u32,
        /// The implementation.
        handler: Arc<dyn ImmutableMethod>,
    },
    /// Session-dependent method.
    Mutable {
        /// The contract.
        declaration: Arc<MethodDeclaration>,
        /// The implementation.
        handler: Arc<dyn MutableMethod>,
    },
}

impl ApiMethod {
    /// Wraps an immutable method.
    pub fn immutable(method: impl ImmutableMethod + 'static) -> Self {
        Self::Immutable {
            declaration: Arc::new(method.declaration()),
            cache_ttl: method.cache_ttl(),
            handler: Arc::new(method),
        }
    }

    /// Wraps a mutable method.
    pub fn mutable(method: impl MutableMethod + 'static) -> Self {
        Self::Mutable {
            declaration: Arc::new(method.declaration()),
            handler: Arc::new(method),
        }
    }

    /// Returns the contract.
    #[must_use]
    pub fn declaration(&self) -> &MethodDeclaration {
        match self {
            Self::Immutable { declaration, .. } | Self::Mutable { declaration, .. } => declaration,
        }
    }

    /// Returns the method name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.declaration().name()
    }

    /// Returns `true` for session-dependent methods.
    #[must_use]
    pub const fn is_mutable(&self) -> bool {
        matches!(self, Self::Mutable { .. })
    }

    /// Cache lifetime hint; always 0 for mutable methods.
    #[must_use]
    pub const fn cache_ttl(&self) -> u32 {
        match self {
            Self::Immutable { cache_ttl, .. } => *cache_ttl,
            Self::Mutable { .. } => 0,
        }
    }

    /// Runs the method. Immutable methods never see the session.
    pub async fn invoke(&self, input: &TypedInput, session: Option<&Session>) -> MethodResult {
        match self {
            Self::Immutable { handler, .. } => handler.handle(input).await,
            Self::Mutable { handler, .. } => handler.handle(input, session).await,
        }
    }
}

impl fmt::Debug for ApiMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiMethod")
            .field("name", &self.name())
            .field("mutable", &self.is_mutable())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Requirement, SortDirection};
    use serde_json::json;
    use tabula_core::{Actor, Locale};

    struct Echo;

    #[async_trait]
    impl ImmutableMethod for Echo {
        fn declaration(&self) -> MethodDeclaration {
            MethodDeclaration::builder("getEcho")
                .parameter("text", ParameterDeclaration::string(Requirement::Required(3002)))
                .result(FieldDeclaration::string(false))
                .build()
        }

        fn cache_ttl(&self) -> u32 {
            60
        }

        async fn handle(&self, input: &TypedInput) -> MethodResult {
            Ok(Some(input.require_string("text").into()))
        }
    }

    struct WhoAmI;

    #[async_trait]
    impl MutableMethod for WhoAmI {
        fn declaration(&self) -> MethodDeclaration {
            MethodDeclaration::builder("getWhoAmI")
                .result(FieldDeclaration::integer(true))
                .only_for_users()
                .build()
        }

        async fn handle(&self, _input: &TypedInput, session: Option<&Session>) -> MethodResult {
            Ok(Some(session.and_then(Session::actor).map(Actor::id).into()))
        }
    }

    fn typed(method: &ApiMethod, raw: serde_json::Value) -> TypedInput {
        let declaration = method.declaration();
        TypedInput::new(
            declaration.all_parameters(),
            raw.as_object().unwrap(),
            Locale::En,
            declaration.selection(),
        )
    }

    #[test]
    fn test_selection_parameters_come_first() {
        let declaration = MethodDeclaration::builder("getThings")
            .parameter("query", ParameterDeclaration::string(Requirement::Optional))
            .parameter("owner", ParameterDeclaration::integer(Requirement::Required(3100)))
            .selection(SelectionSpec::new("id", SortDirection::Asc))
            .build();

        let names: Vec<_> = declaration.all_parameters().keys().cloned().collect();
        assert_eq!(names, vec!["page", "limit", "sort_by", "sort_direction", "query", "owner"]);
        assert_eq!(declaration.parameters().len(), 2);

        let required: Vec<_> = declaration
            .all_parameters_filtered(Some(true))
            .into_keys()
            .collect();
        assert_eq!(required, vec!["owner"]);
        assert_eq!(declaration.all_parameters_filtered(Some(false)).len(), 5);
        assert_eq!(declaration.all_parameters_filtered(None).len(), 6);
    }

    #[tokio::test]
    async fn test_invoke_immutable() {
        let method = ApiMethod::immutable(Echo);
        assert!(!method.is_mutable());
        assert_eq!(method.cache_ttl(), 60);

        let input = typed(&method, json!({"text": " hi "}));
        let result = method.invoke(&input, None).await.unwrap();
        assert!(matches!(result, Some(OutputValue::String(s)) if s == "hi"));
    }

    #[tokio::test]
    async fn test_invoke_mutable_passes_session() {
        let method = ApiMethod::mutable(WhoAmI);
        assert!(method.is_mutable());
        assert_eq!(method.cache_ttl(), 0);
        assert!(method.declaration().only_for_users());

        let session = Session::new(Locale::En).with_actor(Actor::new(11));
        let input = typed(&method, json!({}));
        let result = method.invoke(&input, Some(&session)).await.unwrap();
        assert!(matches!(result, Some(OutputValue::Int(11))));
    }
}
