//! Output models of the books API.

use crate::store::Book;
use crate::tokens::{IssuedToken, TokensPair};
use crate::users::{UserRecord, VIEW_PRIVATE_PERMISSION};
use chrono::Utc;
use tabula_contract::models::SelectionDataModel;
use tabula_contract::prelude::*;
use tabula_core::Session;

/// A book.
#[derive(Debug, Clone)]
pub struct BookModel(pub Book);

impl ModelContract for BookModel {
    const NAME: &'static str = "Book";
    const DESCRIPTION: Option<&'static str> = Some("Книга");
    const INDEX: Option<IndexType> = Some(IndexType::Integer);

    fn fields() -> FieldSet {
        FieldSet::from([
            ("id", FieldDeclaration::integer(false).with_description("ID")),
            ("title", FieldDeclaration::string(false).with_description("Название")),
            ("isbn", FieldDeclaration::string(false).with_description("ISBN")),
            ("author", FieldDeclaration::string(false).with_description("Автор")),
            (
                "year_published",
                FieldDeclaration::integer(true).with_description("Год издания"),
            ),
            (
                "created_at",
                FieldDeclaration::timestamp(false).with_description("Дата создания"),
            ),
        ])
    }
}

impl ImmutableModel for BookModel {
    fn public_data(&self) -> PublicData {
        let book = &self.0;
        public_data! {
            "id" => book.id,
            "title" => book.title.as_str(),
            "isbn" => book.isbn.as_str(),
            "author" => book.author.as_str(),
            "year_published" => book.year_published,
            "created_at" => book.created_at,
        }
    }

    fn index(&self) -> Option<IndexValue> {
        Some(IndexValue::Int(self.0.id))
    }
}

/// A page of books with its selection details.
#[derive(Debug, Clone)]
pub struct BooksListModel {
    books: Vec<Book>,
    selection: SelectionState,
}

impl BooksListModel {
    /// Pairs a page with the selection that produced it.
    #[must_use]
    pub const fn new(books: Vec<Book>, selection: SelectionState) -> Self {
        Self { books, selection }
    }
}

impl ModelContract for BooksListModel {
    const NAME: &'static str = "BooksList";
    const DESCRIPTION: Option<&'static str> = Some("Выборка книг");

    fn fields() -> FieldSet {
        FieldSet::from([
            (
                "books",
                FieldDeclaration::array_of_objects(BookModel::model_ref(), None)
                    .with_description("Книги"),
            ),
            (
                "selection_data",
                FieldDeclaration::object(SelectionDataModel::model_ref(), false)
                    .with_description("Данные о выборке"),
            ),
        ])
    }
}

impl ImmutableModel for BooksListModel {
    fn public_data(&self) -> PublicData {
        let books: Vec<ModelValue> = self
            .books
            .iter()
            .cloned()
            .map(|book| ModelValue::immutable(BookModel(book)))
            .collect();
        public_data! {
            "books" => books,
            "selection_data" => ModelValue::immutable(SelectionDataModel::new(self.selection.clone())),
        }
    }
}

/// A token handed to the client.
#[derive(Debug, Clone)]
pub struct JwtTokenModel(pub IssuedToken);

impl ModelContract for JwtTokenModel {
    const NAME: &'static str = "JwtToken";
    const DESCRIPTION: Option<&'static str> = Some("JWT-токен");

    fn fields() -> FieldSet {
        FieldSet::from([
            (
                "value",
                FieldDeclaration::string(false).with_description("Значение токена"),
            ),
            (
                "expiration_date",
                FieldDeclaration::timestamp(false).with_description("Дата истечения"),
            ),
        ])
    }
}

impl ImmutableModel for JwtTokenModel {
    fn public_data(&self) -> PublicData {
        public_data! {
            "value" => self.0.value.as_str(),
            "expiration_date" => self.0.expiration_date,
        }
    }
}

/// An access and refresh token pair.
#[derive(Debug, Clone)]
pub struct JwtTokensPairModel(pub TokensPair);

impl ModelContract for JwtTokensPairModel {
    const NAME: &'static str = "JwtTokensPair";
    const DESCRIPTION: Option<&'static str> = Some("Пара JWT-токенов");

    fn fields() -> FieldSet {
        FieldSet::from([
            (
                "access_token",
                FieldDeclaration::object(JwtTokenModel::model_ref(), false)
                    .with_description("Токен для доступа"),
            ),
            (
                "refresh_token",
                FieldDeclaration::object(JwtTokenModel::model_ref(), false)
                    .with_description("Токен для обновления"),
            ),
        ])
    }
}

impl ImmutableModel for JwtTokensPairModel {
    fn public_data(&self) -> PublicData {
        public_data! {
            "access_token" => ModelValue::immutable(JwtTokenModel(self.0.access_token.clone())),
            "refresh_token" => ModelValue::immutable(JwtTokenModel(self.0.refresh_token.clone())),
        }
    }
}

/// Public side of a session.
#[derive(Debug, Clone)]
pub struct SessionModel(pub Session);

impl ModelContract for SessionModel {
    const NAME: &'static str = "Session";
    const DESCRIPTION: Option<&'static str> = Some("Сессия");
    const MUTABLE: bool = true;

    fn fields() -> FieldSet {
        FieldSet::from([(
            "language_code",
            FieldDeclaration::string(false).with_description("Код языка"),
        )])
    }
}

impl MutableModel for SessionModel {
    fn public_data(&self, _viewer: Option<&Session>) -> PublicData {
        public_data! { "language_code" => self.0.locale().code() }
    }
}

/// A user, with private fields hidden from other viewers.
#[derive(Debug, Clone)]
pub struct UserModel(pub UserRecord);

impl UserModel {
    fn can_show_private(&self, viewer: Option<&Session>) -> bool {
        viewer.is_some_and(|session| {
            session.is_actor(self.0.id)
                || session
                    .actor()
                    .is_some_and(|actor| actor.has_permission(VIEW_PRIVATE_PERMISSION))
        })
    }
}

impl ModelContract for UserModel {
    const NAME: &'static str = "User";
    const DESCRIPTION: Option<&'static str> = Some("Пользователь");
    const MUTABLE: bool = true;

    fn fields() -> FieldSet {
        FieldSet::from([
            ("id", FieldDeclaration::integer(false).with_description("ID")),
            (
                "phone_number",
                FieldDeclaration::string(true).with_description("Номер телефона"),
            ),
            ("username", FieldDeclaration::string(true).with_description("Юзернейм")),
            ("first_name", FieldDeclaration::string(false).with_description("Имя")),
            ("last_name", FieldDeclaration::string(true).with_description("Фамилия")),
            ("middle_name", FieldDeclaration::string(true).with_description("Отчество")),
            (
                "last_request_date",
                FieldDeclaration::timestamp(true).with_description("Дата последнего посещения"),
            ),
            (
                "is_online",
                FieldDeclaration::boolean(false).with_description("Флаг \"Онлайн\""),
            ),
        ])
    }
}

impl MutableModel for UserModel {
    fn public_data(&self, viewer: Option<&Session>) -> PublicData {
        let user = &self.0;
        let show = self.can_show_private(viewer);
        let private = |value: &Option<String>| if show { value.clone() } else { None };
        public_data! {
            "id" => user.id,
            "phone_number" => private(&user.phone_number),
            "username" => user.username.clone(),
            "first_name" => user.first_name.as_str(),
            "last_name" => private(&user.last_name),
            "middle_name" => private(&user.middle_name),
            "last_request_date" => user.last_request_date,
            "is_online" => user.is_online(Utc::now()),
        }
    }
}

/// Everything a client needs about its session.
#[derive(Debug, Clone)]
pub struct SessionInfoModel {
    session: Session,
    user: Option<UserRecord>,
    tokens: Option<TokensPair>,
}

impl SessionInfoModel {
    /// Describes `session`, owned by `user`, with freshly issued `tokens`.
    #[must_use]
    pub const fn new(session: Session, user: Option<UserRecord>, tokens: Option<TokensPair>) -> Self {
        Self {
            session,
            user,
            tokens,
        }
    }
}

impl ModelContract for SessionInfoModel {
    const NAME: &'static str = "SessionInfo";
    const DESCRIPTION: Option<&'static str> = Some("Информация о сессии");
    const MUTABLE: bool = true;

    fn fields() -> FieldSet {
        FieldSet::from([
            (
                "user",
                FieldDeclaration::object(UserModel::model_ref(), true)
                    .with_description("Пользователь"),
            ),
            (
                "session",
                FieldDeclaration::object(SessionModel::model_ref(), false)
                    .with_description("Сессия"),
            ),
            (
                "tokens",
                FieldDeclaration::object(JwtTokensPairModel::model_ref(), true)
                    .with_description("JWT-токены"),
            ),
            (
                "timezone",
                FieldDeclaration::string(false).with_description("Временная зона"),
            ),
        ])
    }
}

impl MutableModel for SessionInfoModel {
    fn public_data(&self, _viewer: Option<&Session>) -> PublicData {
        public_data! {
            "user" => self.user.clone().map(|user| ModelValue::mutable(UserModel(user))),
            "session" => ModelValue::mutable(SessionModel(self.session.clone())),
            "tokens" => self.tokens.clone().map(|pair| ModelValue::immutable(JwtTokensPairModel(pair))),
            "timezone" => self.session.timezone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isbn::Isbn;
    use tabula_core::{Actor, Locale};

    fn book() -> Book {
        Book {
            id: 7,
            title: "Dune".to_string(),
            isbn: Isbn::try_from_str("9780441013593").unwrap(),
            author: "Frank Herbert".to_string(),
            year_published: None,
            created_at: Utc::now(),
        }
    }

    fn user() -> UserRecord {
        UserRecord {
            phone_number: Some("+7700".to_string()),
            last_name: Some("Lovelace".to_string()),
            ..UserRecord::new(2, "Ada")
        }
    }

    fn keys(data: &PublicData) -> Vec<&str> {
        data.keys().map(String::as_str).collect()
    }

    fn declared<M: ModelContract>() -> Vec<&'static str> {
        M::fields().keys().copied().collect()
    }

    #[test]
    fn test_book_projection() {
        let value = ModelValue::immutable(BookModel(book()));
        let data = value.public_data(None);
        assert_eq!(keys(&data), declared::<BookModel>());
        assert_eq!(value.index(), Some(IndexValue::Int(7)));
        assert!(data["year_published"].is_null());
        assert!(matches!(data["isbn"], OutputValue::String(ref s) if s == "9780441013593"));
    }

    #[test]
    fn test_user_redaction() {
        let value = ModelValue::mutable(UserModel(user()));

        let anonymous = value.public_data(None);
        assert_eq!(keys(&anonymous), declared::<UserModel>());
        assert!(anonymous["phone_number"].is_null());
        assert!(anonymous["last_name"].is_null());

        let stranger = Session::new(Locale::En).with_actor(Actor::new(3));
        assert!(value.public_data(Some(&stranger))["phone_number"].is_null());

        let owner = Session::new(Locale::En).with_actor(Actor::new(2));
        assert!(!value.public_data(Some(&owner))["phone_number"].is_null());

        let admin = Session::new(Locale::En)
            .with_actor(Actor::new(1).with_permission(VIEW_PRIVATE_PERMISSION));
        assert!(!value.public_data(Some(&admin))["last_name"].is_null());
    }

    #[test]
    fn test_session_info_projection() {
        let session = Session::new(Locale::Kk);
        let info = SessionInfoModel::new(session, None, None);
        let data = ModelValue::mutable(info).public_data(None);
        assert_eq!(keys(&data), declared::<SessionInfoModel>());
        assert!(data["user"].is_null());
        assert!(data["tokens"].is_null());
        assert!(matches!(data["timezone"], OutputValue::String(ref tz) if tz == "UTC"));
    }
}
