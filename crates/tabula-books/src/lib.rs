//! # Tabula Books
//!
//! A small books API built on the Tabula contract layer: books live in an
//! in-memory store, sessions are opened with `POST /sessions` and carry
//! opaque bearer tokens.
//!
//! | Route | Method |
//! |---|---|
//! | `GET /books` | `getBooks` |
//! | `GET /books/{id}` | `getBooksWithId` |
//! | `POST /books` | `postBooks` |
//! | `PUT /books/{id}` | `putBooksWithId` |
//! | `DELETE /books/{id}` | `deleteBooksWithId` |
//! | `GET /sessions/info` | `sessions/getInfo` |
//! | `POST /sessions` | `postSessions` |
//! | `POST /tokens/refresh` | `tokens/postRefresh` |
//!
//! ```rust,ignore
//! let app = BooksApp::seeded(TabulaConfig::default())?;
//! app.server().run().await?;
//! ```

#![doc(html_root_url = "https://docs.rs/tabula-books/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod app;
pub mod errors;
mod isbn;
pub mod methods;
pub mod models;
pub mod store;
pub mod tokens;
pub mod users;

pub use app::BooksApp;
pub use isbn::{Isbn, IsbnError};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
