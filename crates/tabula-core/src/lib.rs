//! # Tabula Core
//!
//! Foundation types shared by every Tabula crate:
//!
//! - [`Locale`] and [`Phrase`] - multi-locale text
//! - [`ApiError`], [`ContractViolation`], [`Failure`] - the three failure kinds
//! - [`codes`] - framework error codes
//! - [`ErrorDescriptions`] - locale-keyed error description table
//! - [`Session`] and [`Actor`] - who is calling
//! - [`RequestContext`] - per-request state

#![doc(html_root_url = "https://docs.rs/tabula-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod codes;
mod context;
mod descriptions;
mod error;
mod locale;
mod phrase;
mod session;

pub use codes::ErrorCode;
pub use context::{RequestContext, RequestId};
pub use descriptions::{DescriptionTable, ErrorDescriptions};
pub use error::{ApiError, ApiResult, Chain, ChainLink, ContractViolation, Failure};
pub use locale::{Locale, UnknownLocale};
pub use phrase::Phrase;
pub use session::{Actor, Session, SessionId};
