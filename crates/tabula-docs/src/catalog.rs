//! The discovery catalog.
//!
//! A [`Catalog`] is a serializable snapshot of everything a registry
//! exposes: methods with their parameters and error codes, the models they
//! return, and the error descriptions in one locale. Documentation renderers
//! and client generators consume it instead of the registry.

use crate::error::{DocsError, DocsResult};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use tabula_contract::{
    ApiMethod, FieldDeclaration, FieldSet, IndexType, MethodDeclaration, MethodRegistry,
    ModelRef, ParameterDeclaration, ParameterType, SelectionSpec,
};
use tabula_core::codes::{self, ErrorCode};
use tabula_core::{DescriptionTable, Locale, Phrase};

/// HTTP verb a method is reached with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `DELETE`
    Delete,
    /// `HEAD`
    Head,
    /// `OPTIONS`
    Options,
}

impl HttpMethod {
    /// Every supported verb.
    pub const ALL: [HttpMethod; 6] = [
        Self::Get,
        Self::Post,
        Self::Put,
        Self::Delete,
        Self::Head,
        Self::Options,
    ];

    /// Derives the verb from the lower-case prefix of the last name segment.
    /// Names without a known prefix are reached with `POST`.
    ///
    /// ```
    /// use tabula_docs::HttpMethod;
    ///
    /// assert_eq!(HttpMethod::from_method_name("getBooksWithId"), HttpMethod::Get);
    /// assert_eq!(HttpMethod::from_method_name("tokens/postRefresh"), HttpMethod::Post);
    /// assert_eq!(HttpMethod::from_method_name("books/archive"), HttpMethod::Post);
    /// ```
    #[must_use]
    pub fn from_method_name(name: &str) -> Self {
        let last = name.rsplit('/').next().unwrap_or(name);
        let prefix_len = last
            .find(|c: char| !c.is_ascii_lowercase())
            .unwrap_or(last.len());
        match &last[..prefix_len] {
            "get" => Self::Get,
            "put" => Self::Put,
            "delete" => Self::Delete,
            "head" => Self::Head,
            "options" => Self::Options,
            _ => Self::Post,
        }
    }

    /// Returns the upper-case verb.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One parameter of a [`MethodEntry`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterEntry {
    /// Wire name.
    pub name: String,
    /// Whether the parameter must be present.
    pub required: bool,
    /// Code raised when a required parameter is absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ErrorCode>,
    /// The full declaration.
    #[serde(flatten)]
    pub declaration: ParameterDeclaration,
}

/// One registered method.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodEntry {
    /// Registered name, e.g. `sessions/getInfo`.
    pub name: String,
    /// Name segments before the last one.
    pub namespace: Vec<String>,
    /// HTTP verb.
    pub http_method: HttpMethod,
    /// Human description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the method acts on behalf of the caller.
    pub mutable: bool,
    /// Whether anonymous callers are refused.
    pub only_for_users: bool,
    /// Cache lifetime hint in seconds.
    pub cache_ttl: u32,
    /// All parameters, selection parameters first.
    pub parameters: Vec<ParameterEntry>,
    /// Pagination and sorting, for list methods.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selection: Option<SelectionSpec>,
    /// Result field; `None` for void methods.
    pub result: Option<FieldDeclaration>,
    /// Every code the method may answer with, ascending.
    pub error_codes: Vec<ErrorCode>,
}

impl MethodEntry {
    fn from_method(method: &ApiMethod) -> DocsResult<Self> {
        let declaration = method.declaration();
        let name = declaration.name();
        if name.is_empty() {
            return Err(DocsError::invalid_method_name(name, "empty name"));
        }
        let mut segments: Vec<String> = name.split('/').map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(DocsError::invalid_method_name(name, "empty segment"));
        }
        segments.pop();

        let parameters = declaration
            .all_parameters()
            .iter()
            .map(|(name, declaration)| ParameterEntry {
                name: name.clone(),
                required: declaration.is_required(),
                error_code: declaration.requirement().error_code(),
                declaration: declaration.clone(),
            })
            .collect();

        Ok(Self {
            name: name.to_string(),
            namespace: segments,
            http_method: HttpMethod::from_method_name(name),
            description: declaration.description().map(str::to_string),
            mutable: method.is_mutable(),
            only_for_users: declaration.only_for_users(),
            cache_ttl: method.cache_ttl(),
            parameters,
            selection: declaration.selection().cloned(),
            result: declaration.result().cloned(),
            error_codes: method_error_codes(declaration),
        })
    }

    /// The last name segment.
    #[must_use]
    pub fn short_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    /// Parameters that must be present.
    pub fn required_parameters(&self) -> impl Iterator<Item = &ParameterEntry> {
        self.parameters.iter().filter(|p| p.required)
    }

    /// Parameters that may be absent.
    pub fn optional_parameters(&self) -> impl Iterator<Item = &ParameterEntry> {
        self.parameters.iter().filter(|p| !p.required)
    }
}

/// One model reachable from a method result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelEntry {
    /// Registered name.
    pub name: String,
    /// Human description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Declared fields, in output order.
    pub fields: FieldSet,
    /// Index type, for models usable as map values.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_type: Option<IndexType>,
    /// Whether the public data depends on the viewer.
    pub mutable: bool,
}

impl From<ModelRef> for ModelEntry {
    fn from(model: ModelRef) -> Self {
        Self {
            name: model.name().to_string(),
            description: model.description().map(str::to_string),
            fields: model.fields(),
            index_type: model.index_type(),
            mutable: model.is_mutable(),
        }
    }
}

/// One error code and its description.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorEntry {
    /// Numeric code.
    pub code: ErrorCode,
    /// Description in the catalog locale.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Description in every locale it is known in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phrase: Option<Phrase>,
}

/// Methods grouped by name segment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Namespace {
    /// Full names of the methods directly in this namespace.
    pub methods: Vec<String>,
    /// Nested namespaces by segment.
    pub children: IndexMap<String, Namespace>,
}

impl Namespace {
    fn insert(&mut self, path: &[String], method: &str) {
        match path.split_first() {
            None => self.methods.push(method.to_string()),
            Some((head, rest)) => self
                .children
                .entry(head.clone())
                .or_default()
                .insert(rest, method),
        }
    }

    /// Looks a nested namespace up by its segments.
    #[must_use]
    pub fn child(&self, path: &[&str]) -> Option<&Namespace> {
        path.iter()
            .try_fold(self, |namespace, segment| namespace.children.get(*segment))
    }
}

/// Everything a registry exposes, ready to render.
///
/// # Example
///
/// ```
/// use tabula_contract::MethodRegistry;
/// use tabula_core::{ErrorDescriptions, Locale};
/// use tabula_docs::Catalog;
///
/// let catalog = Catalog::build(&MethodRegistry::new(), ErrorDescriptions::builtin(), Locale::En)
///     .unwrap();
/// assert!(catalog.methods.is_empty());
/// assert!(catalog.error(1001).is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Catalog {
    /// Locale descriptions are rendered in.
    pub locale: Locale,
    /// Methods, by name.
    pub methods: Vec<MethodEntry>,
    /// Models reachable from any result, by name.
    pub models: Vec<ModelEntry>,
    /// Known and referenced error codes, ascending.
    pub errors: Vec<ErrorEntry>,
    /// Supported HTTP verbs.
    pub http_methods: Vec<HttpMethod>,
    /// Supported locales.
    pub locales: Vec<Locale>,
    /// Methods grouped by namespace.
    pub namespaces: Namespace,
}

impl Catalog {
    /// Walks every method of `registry` and every model they reference.
    ///
    /// # Errors
    ///
    /// Fails when a method name has an empty segment, or when two different
    /// models share a name.
    pub fn build(
        registry: &MethodRegistry,
        descriptions: &dyn DescriptionTable,
        locale: Locale,
    ) -> DocsResult<Self> {
        let mut methods = registry
            .iter()
            .map(MethodEntry::from_method)
            .collect::<DocsResult<Vec<_>>>()?;
        methods.sort_by(|a, b| a.name.cmp(&b.name));

        let models = collect_models(registry)?;

        let codes: BTreeSet<ErrorCode> = descriptions
            .codes()
            .into_iter()
            .chain(methods.iter().flat_map(|m| m.error_codes.iter().copied()))
            .collect();
        let errors = codes
            .into_iter()
            .map(|code| {
                let phrase = descriptions.describe(code);
                ErrorEntry {
                    code,
                    description: phrase.as_ref().map(|p| p.require(locale).to_string()),
                    phrase,
                }
            })
            .collect();

        let mut namespaces = Namespace::default();
        for method in &methods {
            namespaces.insert(&method.namespace, &method.name);
        }

        Ok(Self {
            locale,
            methods,
            models,
            errors,
            http_methods: HttpMethod::ALL.to_vec(),
            locales: Locale::ALL.to_vec(),
            namespaces,
        })
    }

    /// Looks a method up by its registered name.
    #[must_use]
    pub fn method(&self, name: &str) -> Option<&MethodEntry> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Looks a model up by name.
    #[must_use]
    pub fn model(&self, name: &str) -> Option<&ModelEntry> {
        self.models.iter().find(|m| m.name == name)
    }

    /// Looks an error up by code.
    #[must_use]
    pub fn error(&self, code: ErrorCode) -> Option<&ErrorEntry> {
        self.errors.iter().find(|e| e.code == code)
    }

    /// Renders the catalog as a JSON value.
    pub fn to_json(&self) -> DocsResult<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Renders the catalog as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> DocsResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn collect_models(registry: &MethodRegistry) -> DocsResult<Vec<ModelEntry>> {
    let mut found: IndexMap<&'static str, ModelEntry> = IndexMap::new();
    let mut pending: Vec<ModelRef> = registry
        .iter()
        .filter_map(|m| m.declaration().result())
        .flat_map(|field| field.referenced_models().collect::<Vec<_>>())
        .collect();

    while let Some(model) = pending.pop() {
        let entry = ModelEntry::from(model);
        if let Some(existing) = found.get(model.name()) {
            if *existing != entry {
                return Err(DocsError::ConflictingModel {
                    name: model.name().to_string(),
                });
            }
            continue;
        }
        for field in entry.fields.values() {
            pending.extend(field.referenced_models());
        }
        found.insert(model.name(), entry);
    }

    found.sort_keys();
    Ok(found.into_values().collect())
}

/// Every code a method may answer with, ascending and without duplicates.
///
/// The set is 1001, the declared possible errors, each required parameter's
/// code, the codes implied by parameter types and bounds, and 2002 for
/// methods closed to anonymous callers.
///
/// ```
/// use tabula_contract::{MethodDeclaration, ParameterDeclaration, Requirement};
/// use tabula_docs::method_error_codes;
///
/// let declaration = MethodDeclaration::builder("getBooksWithId")
///     .parameter("id", ParameterDeclaration::integer(Requirement::Required(3001)))
///     .possible_errors([2005])
///     .build();
/// assert_eq!(method_error_codes(&declaration), vec![1001, 2005, 3001, 3025]);
/// ```
#[must_use]
pub fn method_error_codes(declaration: &MethodDeclaration) -> Vec<ErrorCode> {
    let mut found = BTreeSet::from([codes::INTERNAL_SERVER_ERROR]);
    found.extend(declaration.possible_errors().iter().copied());
    if declaration.only_for_users() {
        found.insert(codes::USERS_ONLY);
    }
    for parameter in declaration.all_parameters().values() {
        found.extend(parameter.requirement().error_code());
        found.extend(implied_codes(parameter));
    }
    found.into_iter().collect()
}

fn implied_codes(parameter: &ParameterDeclaration) -> Vec<ErrorCode> {
    let mut found = Vec::new();
    match parameter.kind() {
        ParameterType::Integer => {
            found.push(codes::INVALID_INTEGER);
            if parameter.effective_int_min().is_some() {
                found.push(codes::INTEGER_TOO_SMALL);
            }
            if parameter.int_max_value().is_some() {
                found.push(codes::INTEGER_TOO_LARGE);
            }
        }
        ParameterType::Float => {
            found.push(codes::INVALID_FLOAT);
            let (min, max) = parameter.float_bounds();
            if min.is_some() || parameter.is_positive() {
                found.push(codes::FLOAT_TOO_SMALL);
            }
            if max.is_some() {
                found.push(codes::FLOAT_TOO_LARGE);
            }
        }
        ParameterType::String => {
            let (min, max) = parameter.length_bounds();
            if min.is_some() {
                found.push(codes::STRING_TOO_SHORT);
            }
            if max.is_some() {
                found.push(codes::STRING_TOO_LONG);
            }
        }
        ParameterType::Uuid => found.push(codes::INVALID_UUID),
        ParameterType::DateTime => found.push(codes::INVALID_DATE_TIME),
        ParameterType::Date => found.push(codes::INVALID_DATE),
        ParameterType::Enum => found.push(codes::INVALID_ENUM_VALUE),
        ParameterType::Array => match parameter.child_type() {
            Some(ParameterType::Uuid) => found.push(codes::INVALID_UUID_IN_ARRAY),
            Some(ParameterType::Enum) => found.push(codes::INVALID_ENUM_VALUE),
            Some(ParameterType::DateTime) => found.push(codes::INVALID_DATE_TIME),
            Some(ParameterType::Date) => found.push(codes::INVALID_DATE),
            _ => {}
        },
        ParameterType::Boolean | ParameterType::Phrase => {}
    }
    found
}
