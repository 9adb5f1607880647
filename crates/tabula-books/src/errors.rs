//! Error codes of the books API and their descriptions.

use tabula_core::{ErrorCode, ErrorDescriptions, Locale, Phrase};

/// The ISBN belongs to another book.
pub const ISBN_TAKEN: ErrorCode = 2004;
/// No book with the requested id.
pub const BOOK_NOT_FOUND: ErrorCode = 2005;
/// The listing matched nothing.
pub const BOOKS_NOT_FOUND: ErrorCode = 2006;
/// Book id is missing or not an integer.
pub const ID_REQUIRED: ErrorCode = 3001;
/// Title is missing.
pub const TITLE_REQUIRED: ErrorCode = 3002;
/// Author is missing.
pub const AUTHOR_REQUIRED: ErrorCode = 3003;
/// ISBN is missing.
pub const ISBN_REQUIRED: ErrorCode = 3004;
/// ISBN is not a valid ISBN-13.
pub const ISBN_INVALID: ErrorCode = 3005;

/// Framework descriptions plus the books API codes.
#[must_use]
pub fn descriptions() -> ErrorDescriptions {
    ErrorDescriptions::with_builtin()
        .with(
            ISBN_TAKEN,
            phrase("Книга с таким ISBN уже существует", "A book with this ISBN already exists"),
        )
        .with(BOOK_NOT_FOUND, phrase("Книга не найдена", "Book not found"))
        .with(BOOKS_NOT_FOUND, phrase("Книги не найдены", "No books found"))
        .with(ID_REQUIRED, phrase("Укажите ID книги", "Book ID is required"))
        .with(TITLE_REQUIRED, phrase("Укажите название книги", "Title is required"))
        .with(AUTHOR_REQUIRED, phrase("Укажите автора книги", "Author is required"))
        .with(ISBN_REQUIRED, phrase("Укажите ISBN книги", "ISBN is required"))
        .with(
            ISBN_INVALID,
            phrase("Некорректный ISBN-13", "ISBN must be a valid ISBN-13"),
        )
}

fn phrase(ru: &str, en: &str) -> Phrase {
    Phrase::make(Locale::Ru, ru).with_value(Locale::En, en)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabula_core::DescriptionTable;

    #[test]
    fn test_descriptions_layer_over_builtin() {
        let table = descriptions();
        assert!(table.describe(1001).is_some());
        assert_eq!(
            table.describe(ISBN_INVALID).unwrap().require(Locale::En),
            "ISBN must be a valid ISBN-13"
        );
        assert_eq!(
            table.describe(BOOK_NOT_FOUND).unwrap().require(Locale::Kk),
            "Книга не найдена"
        );
    }
}
