//! Locale-keyed error descriptions.

use crate::codes::{self, ErrorCode};
use crate::{Locale, Phrase};
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Looks up the human description template for an error code.
///
/// Templates may contain `{name}` placeholders that are filled from
/// [`ApiError::with_var`](crate::ApiError::with_var).
pub trait DescriptionTable: Send + Sync {
    /// Returns the template for `code`.
    fn describe(&self, code: ErrorCode) -> Option<Phrase>;

    /// All codes this table knows, ascending.
    fn codes(&self) -> Vec<ErrorCode>;
}

/// In-memory description table.
///
/// # Example
///
/// ```
/// use tabula_core::{DescriptionTable, ErrorDescriptions, Locale, Phrase};
///
/// let table = ErrorDescriptions::with_builtin()
///     .with(2005, Phrase::make(Locale::En, "Book not found"));
///
/// assert!(table.describe(1001).is_some());
/// assert_eq!(table.describe(2005).unwrap().get(Locale::En), Some("Book not found"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ErrorDescriptions {
    entries: BTreeMap<ErrorCode, Phrase>,
}

static BUILTIN: OnceLock<ErrorDescriptions> = OnceLock::new();

impl ErrorDescriptions {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table pre-filled with the framework descriptions.
    #[must_use]
    pub fn with_builtin() -> Self {
        Self::builtin().clone()
    }

    /// The shared framework table, built on first use.
    pub fn builtin() -> &'static Self {
        BUILTIN.get_or_init(build_builtin)
    }

    /// Adds or replaces a description.
    #[must_use]
    pub fn with(mut self, code: ErrorCode, description: Phrase) -> Self {
        self.insert(code, description);
        self
    }

    /// Adds or replaces a description in place.
    pub fn insert(&mut self, code: ErrorCode, description: Phrase) {
        self.entries.insert(code, description);
    }

    /// Number of described codes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is described.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl DescriptionTable for ErrorDescriptions {
    fn describe(&self, code: ErrorCode) -> Option<Phrase> {
        self.entries.get(&code).cloned()
    }

    fn codes(&self) -> Vec<ErrorCode> {
        self.entries.keys().copied().collect()
    }
}

fn ru_en(ru: &str, en: &str) -> Phrase {
    Phrase::make(Locale::Ru, ru).with_value(Locale::En, en)
}

fn build_builtin() -> ErrorDescriptions {
    ErrorDescriptions::new()
        .with(
            codes::INTERNAL_SERVER_ERROR,
            ru_en("Внутренняя ошибка сервера", "Internal server error"),
        )
        .with(codes::METHOD_NOT_FOUND, ru_en("Метод не найден", "Method not found"))
        .with(
            codes::TOKEN_EXPIRED,
            ru_en("Срок действия токена истёк", "Token has expired"),
        )
        .with(codes::NOT_ENOUGH_RIGHTS, ru_en("Недостаточно прав", "Not enough rights"))
        .with(
            codes::USERS_ONLY,
            ru_en(
                "Метод доступен только пользователям",
                "Method is available to users only",
            ),
        )
        .with(
            codes::INVALID_ENUM_VALUE,
            ru_en("Недопустимое значение", "Value is not allowed"),
        )
        .with(
            codes::STRING_TOO_SHORT,
            ru_en(
                "Минимальная длина: {min} символов",
                "Must be at least {min} characters long",
            ),
        )
        .with(
            codes::STRING_TOO_LONG,
            ru_en(
                "Максимальная длина: {max} символов",
                "Must be at most {max} characters long",
            ),
        )
        .with(codes::INVALID_FLOAT, ru_en("Ожидалось число", "Number expected"))
        .with(
            codes::FLOAT_TOO_SMALL,
            ru_en("Минимальное значение: {min}", "Minimum value is {min}"),
        )
        .with(
            codes::FLOAT_TOO_LARGE,
            ru_en("Максимальное значение: {max}", "Maximum value is {max}"),
        )
        .with(
            codes::INTEGER_TOO_SMALL,
            ru_en("Минимальное значение: {min}", "Minimum value is {min}"),
        )
        .with(
            codes::INTEGER_TOO_LARGE,
            ru_en("Максимальное значение: {max}", "Maximum value is {max}"),
        )
        .with(
            codes::INVALID_UUID_IN_ARRAY,
            ru_en("Список содержит некорректный UUID", "List contains an invalid UUID"),
        )
        .with(
            codes::INVALID_INTEGER,
            ru_en("Ожидалось целое число", "Integer expected"),
        )
        .with(codes::INVALID_UUID, ru_en("Некорректный UUID", "Invalid UUID"))
        .with(
            codes::INVALID_DATE_TIME,
            ru_en("Некорректные дата и время", "Invalid date and time"),
        )
        .with(codes::INVALID_DATE, ru_en("Некорректная дата", "Invalid date"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_covers_framework_codes() {
        let table = ErrorDescriptions::builtin();
        for code in [
            codes::INTERNAL_SERVER_ERROR,
            codes::METHOD_NOT_FOUND,
            codes::TOKEN_EXPIRED,
            codes::USERS_ONLY,
            codes::INVALID_ENUM_VALUE,
            codes::INVALID_INTEGER,
            codes::INVALID_UUID,
            codes::INVALID_UUID_IN_ARRAY,
            codes::FLOAT_TOO_SMALL,
            codes::FLOAT_TOO_LARGE,
        ] {
            let phrase = table.describe(code).unwrap();
            assert!(phrase.get(Locale::Ru).is_some(), "missing ru for {code}");
            assert!(phrase.get(Locale::En).is_some(), "missing en for {code}");
        }
    }

    #[test]
    fn test_builtin_is_shared() {
        assert!(std::ptr::eq(ErrorDescriptions::builtin(), ErrorDescriptions::builtin()));
    }

    #[test]
    fn test_codes_sorted() {
        let codes = ErrorDescriptions::new()
            .with(3002, Phrase::make(Locale::En, "b"))
            .with(2005, Phrase::make(Locale::En, "a"))
            .codes();
        assert_eq!(codes, vec![2005, 3002]);
    }

    #[test]
    fn test_with_builtin_extends() {
        let table = ErrorDescriptions::with_builtin().with(2005, Phrase::make(Locale::En, "x"));
        assert_eq!(table.len(), ErrorDescriptions::builtin().len() + 1);
    }
}
