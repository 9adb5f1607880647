//! Method implementations.

mod books;
mod sessions;

pub use books::{DeleteBooksWithId, GetBooks, GetBooksWithId, PostBooks, PutBooksWithId};
pub use sessions::{GetSessionInfo, PostRefresh, PostSessions, REFRESH_METHOD};
