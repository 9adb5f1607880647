//! The response envelope.
//!
//! Every response, successful or not, has the same shape:
//!
//! ```json
//! {"ok": true, "result": {}, "errors": [], "service_info": {"generation_ms": 1.2, "throwables": []}}
//! ```

use crate::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tabula_contract::models::ErrorModel;
use tabula_contract::{FieldDeclaration, ModelContract, ModelValue, OutputValue};
use tabula_core::{ApiError, ChainLink, DescriptionTable, Failure};

/// The JSON body of every API response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// `true` when the method completed and its result was serialized.
    pub ok: bool,
    /// The serialized result, `null` on failure.
    pub result: Value,
    /// Contract errors, outermost first.
    pub errors: Vec<Value>,
    /// Diagnostics.
    pub service_info: ServiceInfo,
}

/// Request diagnostics attached to every envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceInfo {
    /// Time spent producing the response.
    pub generation_ms: f64,
    /// Non-contract failures, when exposure is enabled.
    pub throwables: Vec<Throwable>,
}

/// A failure that is not a contract error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Throwable {
    /// Failure class name.
    pub class: String,
    /// Failure code. Always 0 for non-contract failures.
    pub code: u32,
    /// Display message.
    pub message: String,
    /// The message and every `source()` below it.
    pub trace: Vec<String>,
}

impl Throwable {
    /// Describes a failure.
    #[must_use]
    pub fn from_failure(failure: &Failure) -> Self {
        Self {
            class: failure.class().to_string(),
            code: 0,
            message: failure.to_string(),
            trace: failure.trace(),
        }
    }
}

impl Envelope {
    /// A successful envelope around an already serialized result.
    #[must_use]
    pub fn success(result: Value, generation_ms: f64) -> Self {
        Self {
            ok: true,
            result,
            errors: Vec::new(),
            service_info: ServiceInfo {
                generation_ms,
                throwables: Vec::new(),
            },
        }
    }

    /// A failed envelope for `error` and its cause chain.
    ///
    /// Every contract error in the chain becomes one `errors[]` entry. The
    /// first non-contract cause ends the chain and is always returned as a
    /// throwable; it is only embedded in the envelope when `expose_throwables`
    /// is set.
    #[must_use]
    pub fn failure(
        error: &ApiError,
        descriptions: &dyn DescriptionTable,
        generation_ms: f64,
        expose_throwables: bool,
    ) -> (Self, Vec<Throwable>) {
        let mut errors = Vec::new();
        let mut throwables = Vec::new();
        for link in error.chain() {
            match link {
                ChainLink::Api(api) => errors.push(error_entry(api, descriptions)),
                ChainLink::Throwable(failure) => throwables.push(Throwable::from_failure(failure)),
            }
        }

        let envelope = Self {
            ok: false,
            result: Value::Null,
            errors,
            service_info: ServiceInfo {
                generation_ms,
                throwables: if expose_throwables {
                    throwables.clone()
                } else {
                    Vec::new()
                },
            },
        };
        (envelope, throwables)
    }

    /// Error codes carried by `errors[]`, outermost first.
    #[must_use]
    pub fn error_codes(&self) -> Vec<u32> {
        self.errors
            .iter()
            .filter_map(|e| e.get("code").and_then(Value::as_u64))
            .filter_map(|c| u32::try_from(c).ok())
            .collect()
    }
}

/// Serializes one contract error through the built-in `Error` model.
fn error_entry(error: &ApiError, descriptions: &dyn DescriptionTable) -> Value {
    let model = ErrorModel::from_error(error, descriptions);
    let field = FieldDeclaration::object(ErrorModel::model_ref(), false);
    let value = OutputValue::Model(ModelValue::immutable(model));
    Serializer::new(None)
        .serialize_field(&field, &value, ErrorModel::NAME, "errors")
        .unwrap_or_else(|_| {
            json!({
                "code": error.code(),
                "input_field": error.input_field(),
                "description": error.description(descriptions).to_json(),
            })
        })
}
