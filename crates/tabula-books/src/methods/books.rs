//! Book methods.

use crate::errors::{
    AUTHOR_REQUIRED, BOOKS_NOT_FOUND, BOOK_NOT_FOUND, ID_REQUIRED, ISBN_INVALID, ISBN_REQUIRED,
    ISBN_TAKEN, TITLE_REQUIRED,
};
use crate::isbn::Isbn;
use crate::models::{BookModel, BooksListModel};
use crate::store::{BookPatch, BookQuery, BookStore, NewBook, StoreError};
use async_trait::async_trait;
use std::sync::Arc;
use tabula_contract::prelude::*;
use tabula_core::{ApiError, Failure, Session};
use tracing::info;

const ID: &str = "id";
const QUERY: &str = "query";
const TITLE: &str = "title";
const AUTHOR: &str = "author";
const YEAR_PUBLISHED: &str = "year_published";
const CLEAR_YEAR_PUBLISHED: &str = "clear_year_published";
const ISBN: &str = "isbn";

fn parse_isbn(raw: &str) -> Result<Isbn, ApiError> {
    Isbn::try_from_str(raw).map_err(|_| ApiError::with_field(ISBN_INVALID, ISBN))
}

fn store_failure(error: StoreError) -> Failure {
    match error {
        StoreError::NotFound(_) => ApiError::with_field(BOOK_NOT_FOUND, ID).into(),
        StoreError::DuplicateIsbn(_) => ApiError::with_field(ISBN_TAKEN, ISBN).into(),
        StoreError::Seed(e) => Failure::Unexpected(e.into()),
    }
}

/// `GET /books`: a filtered, sorted page of books.
pub struct GetBooks {
    store: Arc<BookStore>,
    limit_max: u32,
}

impl GetBooks {
    /// Lists from `store`, at most `limit_max` books per page.
    #[must_use]
    pub const fn new(store: Arc<BookStore>, limit_max: u32) -> Self {
        Self { store, limit_max }
    }
}

#[async_trait]
impl ImmutableMethod for GetBooks {
    fn declaration(&self) -> MethodDeclaration {
        MethodDeclaration::builder("getBooks")
            .description("Получение выборки книг")
            .parameter(
                QUERY,
                ParameterDeclaration::string(Requirement::Optional).description("Поисковый запрос"),
            )
            .parameter(
                YEAR_PUBLISHED,
                ParameterDeclaration::integer(Requirement::Optional).description("Год публикации"),
            )
            .selection(
                SelectionSpec::new(ID, SortDirection::Desc)
                    .with_variant(TITLE)
                    .with_variant(YEAR_PUBLISHED)
                    .with_variant(AUTHOR)
                    .with_variant(ISBN)
                    .with_limit_max(self.limit_max),
            )
            .result(FieldDeclaration::object(BooksListModel::model_ref(), false))
            .possible_errors([BOOKS_NOT_FOUND])
            .build()
    }

    async fn handle(&self, input: &TypedInput) -> MethodResult {
        let query = BookQuery {
            text: input.get_string(QUERY),
            year_published: input.get_int(YEAR_PUBLISHED),
        };

        let total = self.store.count(&query);
        if total == 0 {
            return Err(ApiError::only_code(BOOKS_NOT_FOUND).into());
        }

        let selection = input.require_selection_data(total);
        let books = self.store.page(
            &query,
            selection.sort_column(),
            selection.sort_direction(),
            selection.offset(),
            u64::from(selection.limit()),
        );
        Ok(Some(ModelValue::immutable(BooksListModel::new(books, selection)).into()))
    }
}

/// `GET /books/{id}`.
pub struct GetBooksWithId {
    store: Arc<BookStore>,
}

impl GetBooksWithId {
    /// Reads from `store`.
    #[must_use]
    pub const fn new(store: Arc<BookStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ImmutableMethod for GetBooksWithId {
    fn declaration(&self) -> MethodDeclaration {
        MethodDeclaration::builder("getBooksWithId")
            .description("Получение книги")
            .parameter(
                ID,
                ParameterDeclaration::integer(Requirement::Required(ID_REQUIRED))
                    .description("ID книги"),
            )
            .result(FieldDeclaration::object(BookModel::model_ref(), false))
            .possible_errors([BOOK_NOT_FOUND])
            .build()
    }

    async fn handle(&self, input: &TypedInput) -> MethodResult {
        let book = self
            .store
            .get(input.require_int(ID))
            .ok_or_else(|| ApiError::with_field(BOOK_NOT_FOUND, ID))?;
        Ok(Some(ModelValue::immutable(BookModel(book)).into()))
    }
}

/// `POST /books`: creates a book.
pub struct PostBooks {
    store: Arc<BookStore>,
}

impl PostBooks {
    /// Writes to `store`.
    #[must_use]
    pub const fn new(store: Arc<BookStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl MutableMethod for PostBooks {
    fn declaration(&self) -> MethodDeclaration {
        MethodDeclaration::builder("postBooks")
            .description("Создание книги")
            .parameter(
                TITLE,
                ParameterDeclaration::string(Requirement::Required(TITLE_REQUIRED))
                    .description("Наименование"),
            )
            .parameter(
                AUTHOR,
                ParameterDeclaration::string(Requirement::Required(AUTHOR_REQUIRED))
                    .description("Автор"),
            )
            .parameter(
                YEAR_PUBLISHED,
                ParameterDeclaration::integer(Requirement::Optional).description("Год публикации"),
            )
            .parameter(
                ISBN,
                ParameterDeclaration::string(Requirement::Required(ISBN_REQUIRED))
                    .description("ISBN"),
            )
            .result(FieldDeclaration::object(BookModel::model_ref(), false))
            .possible_errors([ISBN_INVALID, ISBN_TAKEN])
            .only_for_users()
            .build()
    }

    async fn handle(&self, input: &TypedInput, session: Option<&Session>) -> MethodResult {
        let isbn = parse_isbn(input.require_string(ISBN))?;
        let book = self
            .store
            .create(NewBook {
                title: input.require_string(TITLE).to_string(),
                author: input.require_string(AUTHOR).to_string(),
                isbn,
                year_published: input.get_int(YEAR_PUBLISHED),
            })
            .map_err(store_failure)?;

        info!(
            book_id = book.id,
            actor = %session.map(Session::log_id).unwrap_or_default(),
            "book created"
        );
        Ok(Some(ModelValue::immutable(BookModel(book)).into()))
    }
}

/// `PUT /books/{id}`: edits a book.
pub struct PutBooksWithId {
    store: Arc<BookStore>,
}

impl PutBooksWithId {
    /// Writes to `store`.
    #[must_use]
    pub const fn new(store: Arc<BookStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl MutableMethod for PutBooksWithId {
    fn declaration(&self) -> MethodDeclaration {
        MethodDeclaration::builder("putBooksWithId")
            .description("Редактирование книги")
            .parameter(
                ID,
                ParameterDeclaration::integer(Requirement::Required(ID_REQUIRED))
                    .description("ID книги"),
            )
            .parameter(
                TITLE,
                ParameterDeclaration::string(Requirement::Optional).description("Наименование"),
            )
            .parameter(
                AUTHOR,
                ParameterDeclaration::string(Requirement::Optional).description("Автор"),
            )
            .parameter(
                YEAR_PUBLISHED,
                ParameterDeclaration::integer(Requirement::Optional).description("Год публикации"),
            )
            .parameter(
                CLEAR_YEAR_PUBLISHED,
                ParameterDeclaration::boolean(Requirement::Optional)
                    .description("Очистить год публикации"),
            )
            .parameter(
                ISBN,
                ParameterDeclaration::string(Requirement::Optional).description("ISBN"),
            )
            .result(FieldDeclaration::object(BookModel::model_ref(), false))
            .possible_errors([BOOK_NOT_FOUND, ISBN_INVALID, ISBN_TAKEN])
            .only_for_users()
            .build()
    }

    async fn handle(&self, input: &TypedInput, session: Option<&Session>) -> MethodResult {
        let id = input.require_int(ID);
        if self.store.get(id).is_none() {
            return Err(ApiError::with_field(BOOK_NOT_FOUND, ID).into());
        }

        let isbn = input.get_string(ISBN).as_deref().map(parse_isbn).transpose()?;
        let year_published = if input.get_bool(CLEAR_YEAR_PUBLISHED).unwrap_or(false) {
            Some(None)
        } else {
            input.get_int(YEAR_PUBLISHED).map(Some)
        };
        let patch = BookPatch {
            title: input.get_string(TITLE),
            author: input.get_string(AUTHOR),
            isbn,
            year_published,
        };

        let book = self.store.update(id, patch).map_err(store_failure)?;
        info!(
            book_id = book.id,
            actor = %session.map(Session::log_id).unwrap_or_default(),
            "book updated"
        );
        Ok(Some(ModelValue::immutable(BookModel(book)).into()))
    }
}

/// `DELETE /books/{id}`.
pub struct DeleteBooksWithId {
    store: Arc<BookStore>,
}

impl DeleteBooksWithId {
    /// Deletes from `store`.
    #[must_use]
    pub const fn new(store: Arc<BookStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl MutableMethod for DeleteBooksWithId {
    fn declaration(&self) -> MethodDeclaration {
        MethodDeclaration::builder("deleteBooksWithId")
            .description("Удаление книги")
            .parameter(
                ID,
                ParameterDeclaration::integer(Requirement::Required(ID_REQUIRED))
                    .description("ID книги"),
            )
            .possible_errors([BOOK_NOT_FOUND])
            .only_for_users()
            .build()
    }

    async fn handle(&self, input: &TypedInput, session: Option<&Session>) -> MethodResult {
        let book = self
            .store
            .delete(input.require_int(ID))
            .map_err(store_failure)?;
        info!(
            book_id = book.id,
            actor = %session.map(Session::log_id).unwrap_or_default(),
            "book deleted"
        );
        Ok(None)
    }
}
