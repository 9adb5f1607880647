//! Client code generation support.
//!
//! [`ClientManifest`] resolves every method and model in a [`Catalog`] to
//! the names and types of one [`TargetLanguage`]. Template-driven generators
//! render the manifest; nothing here emits source text.

use crate::catalog::{Catalog, MethodEntry, ParameterEntry};
use serde::Serialize;
use tabula_contract::{FieldDeclaration, FieldType, IndexType, ParameterDeclaration, ParameterType};
use tabula_core::ErrorCode;

/// Type mapping for one client language.
pub trait TargetLanguage {
    /// Language name, e.g. `javascript`.
    fn name(&self) -> &'static str;

    /// Type of a scalar field.
    fn scalar_field_type(&self, kind: FieldType) -> String;

    /// Type of a scalar parameter.
    fn scalar_parameter_type(&self, kind: ParameterType) -> String;

    /// Type of a model reference.
    fn model_type(&self, model: &str) -> String;

    /// Type of a list of `item`.
    fn list_type(&self, item: &str) -> String;

    /// Type of a map from index keys to `value`.
    fn map_type(&self, index: IndexType, value: &str) -> String;

    /// Type of an array field with no declared element type.
    fn untyped_array_type(&self) -> String;

    /// Marks `ty` as nullable.
    fn nullable(&self, ty: &str) -> String;

    /// Result type of a void method.
    fn void_type(&self) -> String;

    /// Full type of a field, without nullability.
    fn field_type(&self, field: &FieldDeclaration) -> String {
        match field.kind() {
            FieldType::Object => field
                .model()
                .map_or_else(|| self.scalar_field_type(FieldType::Object), |m| {
                    self.model_type(m.name())
                }),
            FieldType::Array => {
                let item = match (field.array_child_model(), field.array_child_type()) {
                    (Some(model), _) => self.model_type(model.name()),
                    (None, Some(child)) => self.scalar_field_type(child),
                    (None, None) => return self.untyped_array_type(),
                };
                match field.array_child_index_type() {
                    Some(index) => self.map_type(index, &item),
                    None => self.list_type(&item),
                }
            }
            scalar => self.scalar_field_type(scalar),
        }
    }

    /// Full type of a parameter.
    fn parameter_type(&self, parameter: &ParameterDeclaration) -> String {
        match parameter.kind() {
            ParameterType::Array => {
                let child = parameter.child_type().unwrap_or(ParameterType::String);
                let item = match child {
                    ParameterType::Enum => self.enum_type(parameter),
                    scalar => self.scalar_parameter_type(scalar),
                };
                self.list_type(&item)
            }
            ParameterType::Enum => self.enum_type(parameter),
            scalar => self.scalar_parameter_type(scalar),
        }
    }

    /// Type an enum parameter is sent as: that of its values.
    fn enum_type(&self, parameter: &ParameterDeclaration) -> String {
        let child = parameter
            .enum_domain()
            .map_or(ParameterType::String, |d| d.child_type());
        self.scalar_parameter_type(child)
    }

    /// Client function name for a method.
    fn function_name(&self, method: &str) -> String {
        method.replace('/', "_")
    }

    /// Client argument name for a parameter.
    fn argument_name(&self, parameter: &str) -> String {
        snake_to_camel(parameter)
    }
}

/// JavaScript with JSDoc type annotations.
#[derive(Debug, Clone, Copy, Default)]
pub struct JavaScript;

impl TargetLanguage for JavaScript {
    fn name(&self) -> &'static str {
        "javascript"
    }

    fn scalar_field_type(&self, kind: FieldType) -> String {
        match kind {
            FieldType::String | FieldType::Uuid => "String",
            FieldType::Integer | FieldType::Float => "Number",
            FieldType::Boolean => "Boolean",
            FieldType::Timestamp => "Date",
            FieldType::Phrase => "Api.Phrase",
            FieldType::Object | FieldType::Array => "Object",
        }
        .to_string()
    }

    fn scalar_parameter_type(&self, kind: ParameterType) -> String {
        match kind {
            ParameterType::String | ParameterType::Uuid => "String",
            ParameterType::Integer | ParameterType::Float => "Number",
            ParameterType::Boolean => "Boolean",
            ParameterType::Phrase => "Api.Phrase",
            ParameterType::DateTime | ParameterType::Date => "Date",
            ParameterType::Array => "Array",
            ParameterType::Enum => "String",
        }
        .to_string()
    }

    fn model_type(&self, model: &str) -> String {
        format!("Api.{model}")
    }

    fn list_type(&self, item: &str) -> String {
        format!("{item}[]")
    }

    fn map_type(&self, _index: IndexType, _value: &str) -> String {
        "Map".to_string()
    }

    fn untyped_array_type(&self) -> String {
        "Array".to_string()
    }

    fn nullable(&self, ty: &str) -> String {
        format!("{ty}|null")
    }

    fn void_type(&self) -> String {
        "void".to_string()
    }
}

/// Dart.
#[derive(Debug, Clone, Copy, Default)]
pub struct Dart;

impl TargetLanguage for Dart {
    fn name(&self) -> &'static str {
        "dart"
    }

    fn scalar_field_type(&self, kind: FieldType) -> String {
        match kind {
            FieldType::String | FieldType::Uuid => "String",
            FieldType::Integer | FieldType::Timestamp => "int",
            FieldType::Float => "double",
            FieldType::Boolean => "bool",
            FieldType::Phrase => "Phrase",
            FieldType::Object | FieldType::Array => "Object",
        }
        .to_string()
    }

    fn scalar_parameter_type(&self, kind: ParameterType) -> String {
        match kind {
            ParameterType::String | ParameterType::Uuid | ParameterType::Enum => "String",
            ParameterType::Integer => "int",
            ParameterType::Float => "double",
            ParameterType::Boolean => "bool",
            ParameterType::Phrase => "Phrase",
            ParameterType::DateTime | ParameterType::Date => "DateTime",
            ParameterType::Array => "List",
        }
        .to_string()
    }

    fn model_type(&self, model: &str) -> String {
        model.to_string()
    }

    fn list_type(&self, item: &str) -> String {
        format!("List<{item}>")
    }

    fn map_type(&self, index: IndexType, value: &str) -> String {
        let key = match index {
            IndexType::Integer => "int",
            IndexType::String => "String",
        };
        format!("Map<{key}, {value}>")
    }

    fn untyped_array_type(&self) -> String {
        "Map<dynamic, dynamic>".to_string()
    }

    fn nullable(&self, ty: &str) -> String {
        format!("{ty}?")
    }

    fn void_type(&self) -> String {
        "void".to_string()
    }
}

/// `page_number` becomes `pageNumber`.
///
/// ```
/// use tabula_docs::snake_to_camel;
///
/// assert_eq!(snake_to_camel("year_published"), "yearPublished");
/// assert_eq!(snake_to_camel("id"), "id");
/// ```
#[must_use]
pub fn snake_to_camel(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for c in name.chars() {
        if c == '_' {
            upper = !out.is_empty();
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// One argument of a client function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientArgument {
    /// Argument name in the client.
    pub name: String,
    /// Wire name sent to the server.
    pub wire_name: String,
    /// Target type, nullable when the parameter is optional.
    pub ty: String,
    /// Whether the argument must be given.
    pub required: bool,
    /// Human description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One client function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientMethod {
    /// Function name in the client.
    pub function_name: String,
    /// Registered method name.
    pub method: String,
    /// HTTP verb.
    pub http_method: String,
    /// Human description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Arguments, required first.
    pub arguments: Vec<ClientArgument>,
    /// Target result type.
    pub result_type: String,
    /// Name of the result model, when the result is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_model: Option<String>,
    /// Codes the method may answer with.
    pub error_codes: Vec<ErrorCode>,
}

/// One field of a client model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientField {
    /// Field name in the client.
    pub name: String,
    /// Key in the wire JSON.
    pub wire_name: String,
    /// Target type, nullable when the field is.
    pub ty: String,
}

/// One client model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientModel {
    /// Model name.
    pub name: String,
    /// Human description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Fields, in output order.
    pub fields: Vec<ClientField>,
}

/// A catalog resolved to one target language.
///
/// # Example
///
/// ```
/// use tabula_contract::MethodRegistry;
/// use tabula_core::{ErrorDescriptions, Locale};
/// use tabula_docs::{Catalog, ClientManifest, Dart};
///
/// let catalog = Catalog::build(&MethodRegistry::new(), ErrorDescriptions::builtin(), Locale::Ru)
///     .unwrap();
/// let manifest = ClientManifest::generate(&catalog, &Dart);
/// assert_eq!(manifest.language, "dart");
/// assert!(manifest.methods.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientManifest {
    /// Target language name.
    pub language: String,
    /// Client functions, by method name.
    pub methods: Vec<ClientMethod>,
    /// Client models, by name.
    pub models: Vec<ClientModel>,
}

impl ClientManifest {
    /// Resolves every method and model of `catalog` for `target`.
    #[must_use]
    pub fn generate<T: TargetLanguage + ?Sized>(catalog: &Catalog, target: &T) -> Self {
        let methods = catalog
            .methods
            .iter()
            .map(|method| client_method(method, target))
            .collect();

        let models = catalog
            .models
            .iter()
            .map(|model| ClientModel {
                name: model.name.clone(),
                description: model.description.clone(),
                fields: model
                    .fields
                    .iter()
                    .map(|(name, field)| ClientField {
                        name: target.argument_name(name),
                        wire_name: (*name).to_string(),
                        ty: resolved_field_type(field, target),
                    })
                    .collect(),
            })
            .collect();

        Self {
            language: target.name().to_string(),
            methods,
            models,
        }
    }

    /// Looks a client function up by its registered method name.
    #[must_use]
    pub fn method(&self, name: &str) -> Option<&ClientMethod> {
        self.methods.iter().find(|m| m.method == name)
    }

    /// Looks a client model up by name.
    #[must_use]
    pub fn model(&self, name: &str) -> Option<&ClientModel> {
        self.models.iter().find(|m| m.name == name)
    }
}

fn client_method<T: TargetLanguage + ?Sized>(method: &MethodEntry, target: &T) -> ClientMethod {
    let arguments = method
        .required_parameters()
        .chain(method.optional_parameters())
        .map(|parameter| client_argument(parameter, target))
        .collect();

    let (result_type, result_model) = match &method.result {
        Some(field) => (
            resolved_field_type(field, target),
            field.model().map(|m| m.name().to_string()),
        ),
        None => (target.void_type(), None),
    };

    ClientMethod {
        function_name: target.function_name(&method.name),
        method: method.name.clone(),
        http_method: method.http_method.to_string(),
        description: method.description.clone(),
        arguments,
        result_type,
        result_model,
        error_codes: method.error_codes.clone(),
    }
}

fn client_argument<T: TargetLanguage + ?Sized>(
    parameter: &ParameterEntry,
    target: &T,
) -> ClientArgument {
    let ty = target.parameter_type(&parameter.declaration);
    ClientArgument {
        name: target.argument_name(&parameter.name),
        wire_name: parameter.name.clone(),
        ty: if parameter.required {
            ty
        } else {
            target.nullable(&ty)
        },
        required: parameter.required,
        description: parameter.declaration.description_text().map(str::to_string),
    }
}

fn resolved_field_type<T: TargetLanguage + ?Sized>(field: &FieldDeclaration, target: &T) -> String {
    let ty = target.field_type(field);
    if field.is_nullable() {
        target.nullable(&ty)
    } else {
        ty
    }
}
