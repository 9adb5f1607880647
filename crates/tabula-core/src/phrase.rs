//! Multi-locale text.

use crate::Locale;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;

/// Text available in one or more locales.
///
/// A phrase always holds at least one value. Values are kept in [`Locale`]
/// declaration order, which is also the fallback order used by
/// [`Phrase::require`].
///
/// # Example
///
/// ```
/// use tabula_core::{Locale, Phrase};
///
/// let phrase = Phrase::make(Locale::En, "Book not found")
///     .with_value(Locale::Ru, "Книга не найдена");
///
/// assert_eq!(phrase.get(Locale::En), Some("Book not found"));
/// // Missing locales fall back to the first available value.
/// assert_eq!(phrase.require(Locale::Kk), "Книга не найдена");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Phrase {
    values: BTreeMap<Locale, String>,
}

impl Phrase {
    /// Creates a phrase from a locale map, returning `None` when it is empty.
    #[must_use]
    pub fn new(values: BTreeMap<Locale, String>) -> Option<Self> {
        if values.is_empty() {
            None
        } else {
            Some(Self { values })
        }
    }

    /// Creates a phrase with a single value.
    #[must_use]
    pub fn make(locale: Locale, value: impl Into<String>) -> Self {
        let mut values = BTreeMap::new();
        values.insert(locale, value.into());
        Self { values }
    }

    /// Returns a copy of this phrase with `value` set for `locale`.
    #[must_use]
    pub fn with_value(mut self, locale: Locale, value: impl Into<String>) -> Self {
        self.set_value(locale, value);
        self
    }

    /// Sets the value for a locale, replacing any existing one.
    pub fn set_value(&mut self, locale: Locale, value: impl Into<String>) {
        self.values.insert(locale, value.into());
    }

    /// Returns the value for exactly this locale.
    #[must_use]
    pub fn get(&self, locale: Locale) -> Option<&str> {
        self.values.get(&locale).map(String::as_str)
    }

    /// Returns the value for `locale`, or the first available value.
    #[must_use]
    pub fn require(&self, locale: Locale) -> &str {
        self.get(locale)
            .or_else(|| self.values.values().next().map(String::as_str))
            .unwrap_or_default()
    }

    /// Locales this phrase has values for.
    pub fn locales(&self) -> impl Iterator<Item = Locale> + '_ {
        self.values.keys().copied()
    }

    /// Iterates over `(locale, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (Locale, &str)> {
        self.values.iter().map(|(l, v)| (*l, v.as_str()))
    }

    /// Applies `f` to every value.
    #[must_use]
    pub fn map_values(&self, mut f: impl FnMut(&str) -> String) -> Self {
        Self {
            values: self
                .values
                .iter()
                .map(|(locale, value)| (*locale, f(value)))
                .collect(),
        }
    }

    /// Returns the phrase as a JSON object keyed by locale code.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.values
                .iter()
                .map(|(l, v)| (l.code().to_string(), serde_json::Value::String(v.clone())))
                .collect(),
        )
    }
}

impl Serialize for Phrase {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (locale, value) in &self.values {
            map.serialize_entry(locale.code(), value)?;
        }
        map.end()
    }
}
