//! # Tabula Contract
//!
//! Declarative contracts for RPC methods and the models they return.
//!
//! A method declares its parameters with [`ParameterDeclaration`] and its
//! result with a [`FieldDeclaration`]. Models declare their fields through
//! [`ModelContract`]. At request time:
//!
//! 1. [`TypedInput`] coerces loosely-typed wire input against the parameters;
//! 2. the method runs through [`ApiMethod::invoke`];
//! 3. the returned [`OutputValue`] is checked against the result field by the
//!    server's serializer.
//!
//! The same declarations feed the discovery catalog, through the explicit
//! [`MethodRegistry`].
//!
//! ## Example
//!
//! ```
//! use tabula_contract::prelude::*;
//! use tabula_core::Locale;
//!
//! let declaration = MethodDeclaration::builder("getGreeting")
//!     .parameter("name", ParameterDeclaration::string(Requirement::Required(3002)))
//!     .result(FieldDeclaration::string(false))
//!     .build();
//!
//! let raw = serde_json::json!({ "name": "  Ada " });
//! let input = TypedInput::new(
//!     declaration.all_parameters(),
//!     raw.as_object().unwrap(),
//!     Locale::En,
//!     None,
//! );
//! assert_eq!(input.require_string("name"), "Ada");
//! ```

#![doc(html_root_url = "https://docs.rs/tabula-contract/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod enumeration;
mod error;
mod field;
pub mod input;
mod method;
mod model;
pub mod models;
mod output;
mod parameter;
mod registry;
pub mod selection;
mod types;

pub use enumeration::{ApiEnum, EnumDomain, EnumValue, EnumValues};
pub use error::{DeclarationError, DeclarationResult};
pub use field::{FieldDeclaration, FieldSet};
pub use input::{TypedInput, TypedValue};
pub use method::{
    ApiMethod, ImmutableMethod, MethodDeclaration, MethodDeclarationBuilder, MethodResult,
    MutableMethod,
};
pub use model::{
    ImmutableModel, IndexValue, ModelContract, ModelRef, ModelValue, MutableModel,
};
pub use output::{OutputValue, PublicData};
pub use parameter::{ParameterDeclaration, ParameterSet, Requirement};
pub use registry::MethodRegistry;
pub use selection::{SelectionError, SelectionSpec, SelectionState, SortDirection};
pub use types::{FieldType, IndexType, ParameterType};

/// Everything needed to declare and implement methods and models.
pub mod prelude {
    pub use crate::{
        public_data, ApiEnum, ApiMethod, EnumDomain, EnumValue, FieldDeclaration, FieldSet,
        ImmutableMethod, ImmutableModel, IndexType, IndexValue, MethodDeclaration, MethodResult,
        ModelContract, ModelValue, MutableMethod, MutableModel, OutputValue, ParameterDeclaration,
        ParameterType, PublicData, Requirement, SelectionSpec, SelectionState, SortDirection,
        TypedInput,
    };
}
