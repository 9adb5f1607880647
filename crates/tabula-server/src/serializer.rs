//! Output serializer.
//!
//! Checks an [`OutputValue`] against its [`FieldDeclaration`] and emits JSON.
//! Any disagreement is a [`ContractViolation`]: the method or model broke its
//! own declaration, so the request degrades to an internal error.

use serde_json::{Map, Number, Value};
use std::collections::HashSet;
use tabula_contract::{FieldDeclaration, FieldType, ModelRef, OutputValue};
use tabula_core::{ContractViolation, Session};
use uuid::Uuid;

/// Prefix of public-data keys that bypass declaration checks.
pub const PASSTHROUGH_PREFIX: char = '_';

/// Serializes output values for one viewer.
///
/// # Example
///
/// ```
/// use tabula_contract::{FieldDeclaration, OutputValue};
/// use tabula_server::Serializer;
///
/// let serializer = Serializer::new(None);
/// let json = serializer
///     .serialize_field(&FieldDeclaration::integer(true), &OutputValue::Null, "getCount", "result")
///     .unwrap();
/// assert!(json.is_null());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Serializer<'a> {
    viewer: Option<&'a Session>,
}

impl<'a> Serializer<'a> {
    /// Creates a serializer projecting models for `viewer`.
    #[must_use]
    pub const fn new(viewer: Option<&'a Session>) -> Self {
        Self { viewer }
    }

    /// Serializes `value` declared as `field`. `owner` and `name` locate the
    /// value in violation messages.
    pub fn serialize_field(
        &self,
        field: &FieldDeclaration,
        value: &OutputValue,
        owner: &str,
        name: &str,
    ) -> Result<Value, ContractViolation> {
        if value.is_null() {
            return if field.is_nullable() {
                Ok(Value::Null)
            } else {
                Err(ContractViolation::null_not_allowed(owner, name))
            };
        }

        match field.kind() {
            FieldType::Object => match field.model() {
                Some(model) => self.serialize_model(model, value, owner, name),
                None => Err(ContractViolation::incorrect_value(
                    owner,
                    name,
                    "object",
                    value.describe(),
                )),
            },
            FieldType::Array => self.serialize_array(field, value, owner, name),
            scalar => serialize_scalar(scalar, value, owner, name),
        }
    }

    /// Serializes a model value against the declared model.
    pub fn serialize_model(
        &self,
        model: ModelRef,
        value: &OutputValue,
        owner: &str,
        name: &str,
    ) -> Result<Value, ContractViolation> {
        let OutputValue::Model(instance) = value else {
            return Err(ContractViolation::incorrect_value(
                owner,
                name,
                format!("{} model", model.name()),
                value.describe(),
            ));
        };
        if instance.name() != model.name() {
            return Err(ContractViolation::model_mismatch(
                owner,
                name,
                model.name(),
                instance.name(),
            ));
        }

        let declared = model.fields();
        let data = instance.public_data(self.viewer);
        let mut out = Map::with_capacity(data.len());

        for (key, item) in &data {
            if key.starts_with(PASSTHROUGH_PREFIX) {
                out.insert(key.clone(), passthrough(item, model.name(), key)?);
                continue;
            }
            let Some(declaration) = declared.get(key.as_str()) else {
                return Err(ContractViolation::undeclared_field(model.name(), key.as_str()));
            };
            out.insert(
                key.clone(),
                self.serialize_field(declaration, item, model.name(), key)?,
            );
        }

        if let Some(missing) = declared.keys().find(|k| !data.contains_key(**k)) {
            return Err(ContractViolation::missing_field(model.name(), *missing));
        }

        Ok(Value::Object(out))
    }

    fn serialize_array(
        &self,
        field: &FieldDeclaration,
        value: &OutputValue,
        owner: &str,
        name: &str,
    ) -> Result<Value, ContractViolation> {
        let Some(child) = field.array_child_type() else {
            return match value {
                OutputValue::List(_)
                | OutputValue::Map(_)
                | OutputValue::Json(Value::Array(_) | Value::Object(_)) => {
                    passthrough(value, owner, name)
                }
                other => Err(ContractViolation::incorrect_value(
                    owner,
                    name,
                    "array",
                    other.describe(),
                )),
            };
        };

        let items = match value {
            OutputValue::List(items) => items,
            OutputValue::Map(_) | OutputValue::Json(Value::Object(_)) => {
                return Err(ContractViolation::associative_array(owner, name));
            }
            other => {
                return Err(ContractViolation::incorrect_value(
                    owner,
                    name,
                    "array",
                    other.describe(),
                ));
            }
        };

        let item_field = match field.array_child_model() {
            Some(model) => FieldDeclaration::object(model, false),
            None => FieldDeclaration::scalar(child, false),
        };

        let Some(index_type) = field.array_child_index_type() else {
            let mut out = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                out.push(self.serialize_field(&item_field, item, owner, &format!("{name}[{i}]"))?);
            }
            return Ok(Value::Array(out));
        };

        let mut out = Map::with_capacity(items.len());
        let mut seen = HashSet::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let item_name = format!("{name}[{i}]");
            let serialized = self.serialize_field(&item_field, item, owner, &item_name)?;
            let index = match item {
                OutputValue::Model(model) => model.index(),
                _ => None,
            };
            let Some(index) = index else {
                return Err(ContractViolation::index_mismatch(
                    owner,
                    item_name,
                    "element has no index",
                ));
            };
            if index.index_type() != index_type {
                return Err(ContractViolation::index_mismatch(
                    owner,
                    item_name,
                    format!("index must be {index_type}, got {}", index.index_type()),
                ));
            }
            let key = index.to_key();
            if !seen.insert(key.clone()) {
                return Err(ContractViolation::index_mismatch(
                    owner,
                    item_name,
                    format!("duplicate index {key}"),
                ));
            }
            out.insert(key, serialized);
        }
        Ok(Value::Object(out))
    }
}

fn serialize_scalar(
    kind: FieldType,
    value: &OutputValue,
    owner: &str,
    name: &str,
) -> Result<Value, ContractViolation> {
    let emitted = match (kind, value) {
        (FieldType::String, OutputValue::String(s)) => Some(Value::String(s.clone())),
        (FieldType::Integer, OutputValue::Int(i)) => Some(Value::from(*i)),
        (FieldType::Float, OutputValue::Float(f)) => Number::from_f64(*f).map(Value::Number),
        (FieldType::Boolean, OutputValue::Bool(b)) => Some(Value::Bool(*b)),
        (FieldType::Uuid, OutputValue::Uuid(u)) => Some(Value::String(u.to_string())),
        (FieldType::Uuid, OutputValue::String(s)) => Uuid::parse_str(s)
            .ok()
            .map(|u| Value::String(u.hyphenated().to_string())),
        (FieldType::Timestamp, OutputValue::Timestamp(t)) => Some(Value::from(t.timestamp())),
        (FieldType::Timestamp, OutputValue::Int(i)) => Some(Value::from(*i)),
        (FieldType::Phrase, OutputValue::Phrase(p)) => Some(p.to_json()),
        _ => None,
    };
    emitted.ok_or_else(|| {
        ContractViolation::incorrect_value(owner, name, kind.as_str(), value.describe())
    })
}

/// Converts an unchecked value to JSON. Models are not allowed here, since
/// nothing declares their shape.
fn passthrough(value: &OutputValue, owner: &str, name: &str) -> Result<Value, ContractViolation> {
    Ok(match value {
        OutputValue::Null => Value::Null,
        OutputValue::Bool(b) => Value::Bool(*b),
        OutputValue::Int(i) => Value::from(*i),
        OutputValue::Float(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
        OutputValue::String(s) => Value::String(s.clone()),
        OutputValue::Uuid(u) => Value::String(u.to_string()),
        OutputValue::Timestamp(t) => Value::from(t.timestamp()),
        OutputValue::Phrase(p) => p.to_json(),
        OutputValue::Json(v) => v.clone(),
        OutputValue::Model(model) => {
            return Err(ContractViolation::incorrect_value(
                owner,
                name,
                "plain value",
                format!("{} model", model.name()),
            ));
        }
        OutputValue::List(items) => Value::Array(
            items
                .iter()
                .map(|item| passthrough(item, owner, name))
                .collect::<Result<_, _>>()?,
        ),
        OutputValue::Map(items) => {
            let mut out = Map::with_capacity(items.len());
            for (key, item) in items {
                out.insert(key.clone(), passthrough(item, owner, name)?);
            }
            Value::Object(out)
        }
    })
}
