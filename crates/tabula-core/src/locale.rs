//! Supported locales.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A locale the API can describe errors and phrases in.
///
/// The declaration order is significant: it is the order locales appear in
/// catalogs and the order [`Phrase`](crate::Phrase) falls back through.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// Russian.
    #[default]
    Ru,
    /// Kazakh.
    Kk,
    /// Uzbek.
    Uz,
    /// English.
    En,
    /// Indonesian.
    Id,
}

impl Locale {
    /// All supported locales, in declaration order.
    pub const ALL: [Locale; 5] = [Self::Ru, Self::Kk, Self::Uz, Self::En, Self::Id];

    /// Returns the two-letter wire code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Ru => "ru",
            Self::Kk => "kk",
            Self::Uz => "uz",
            Self::En => "en",
            Self::Id => "id",
        }
    }

    /// Looks a locale up by its wire code. Matching is case-insensitive.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|locale| locale.code().eq_ignore_ascii_case(code.trim()))
    }

    /// Picks the first supported locale from an `Accept-Language` header value.
    ///
    /// Quality weights are ignored; tags are taken in the order given and
    /// region subtags are dropped (`en-US` matches `en`).
    ///
    /// ```
    /// use tabula_core::Locale;
    ///
    /// assert_eq!(Locale::from_accept_language("fr, en-US;q=0.8"), Some(Locale::En));
    /// assert_eq!(Locale::from_accept_language("fr"), None);
    /// ```
    #[must_use]
    pub fn from_accept_language(header: &str) -> Option<Self> {
        header
            .split(',')
            .filter_map(|tag| tag.split(';').next())
            .filter_map(|tag| tag.split(['-', '_']).next())
            .find_map(Self::from_code)
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Error returned when parsing an unknown locale code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown locale code: {0}")]
pub struct UnknownLocale(pub String);

impl FromStr for Locale {
    type Err = UnknownLocale;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s).ok_or_else(|| UnknownLocale(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_roundtrip() {
        for locale in Locale::ALL {
            assert_eq!(Locale::from_code(locale.code()), Some(locale));
        }
    }

    #[test]
    fn test_from_code_case_insensitive() {
        assert_eq!(Locale::from_code("EN"), Some(Locale::En));
        assert_eq!(Locale::from_code(" kk "), Some(Locale::Kk));
        assert_eq!(Locale::from_code("de"), None);
    }

    #[test]
    fn test_from_str_error() {
        let err = "xx".parse::<Locale>().unwrap_err();
        assert!(err.to_string().contains("xx"));
    }

    #[test]
    fn test_accept_language() {
        assert_eq!(Locale::from_accept_language("kk-KZ,ru;q=0.9"), Some(Locale::Kk));
        assert_eq!(Locale::from_accept_language("de-DE, id"), Some(Locale::Id));
        assert_eq!(Locale::from_accept_language(""), None);
    }

    #[test]
    fn test_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Locale::Uz).unwrap(), "\"uz\"");
        let locale: Locale = serde_json::from_str("\"en\"").unwrap();
        assert_eq!(locale, Locale::En);
    }
}
