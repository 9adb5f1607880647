//! Pagination and sorting.
//!
//! A method that lists things declares a [`SelectionSpec`]. The spec adds
//! four optional parameters (`page`, `limit`, `sort_by`, `sort_direction`)
//! and, once the method knows how many rows match, turns the request into a
//! [`SelectionState`] through
//! [`TypedInput::require_selection_data`](crate::TypedInput::require_selection_data).

use crate::{ParameterDeclaration, ParameterSet, Requirement};
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Name of the page parameter.
pub const PAGE: &str = "page";
/// Name of the page size parameter.
pub const LIMIT: &str = "limit";
/// Name of the sort key parameter.
pub const SORT_BY: &str = "sort_by";
/// Name of the sort direction parameter.
pub const SORT_DIRECTION: &str = "sort_direction";

/// Default upper bound for `limit`.
pub const DEFAULT_LIMIT_MAX: u32 = 30;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

impl SortDirection {
    /// `ASC` or `DESC`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }

    /// Parses `asc`/`desc` in any case.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "ASC" => Some(Self::Asc),
            "DESC" => Some(Self::Desc),
            _ => None,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected manual pagination input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SelectionError {
    /// `limit` must be at least 1.
    #[error("limit must be positive, got {0}")]
    NonPositiveLimit(i64),
    /// `offset` must not be negative.
    #[error("offset must not be negative, got {0}")]
    NegativeOffset(i64),
}

/// Per-method pagination and sorting declaration.
///
/// # Example
///
/// ```
/// use tabula_contract::{SelectionSpec, SortDirection};
///
/// let spec = SelectionSpec::new("id", SortDirection::Desc)
///     .with_variant("title")
///     .with_aliased_variant("year", "year_published")
///     .with_limit_max(50);
///
/// assert_eq!(spec.column("year"), Some("year_published"));
/// assert_eq!(spec.column("id"), Some("id"));
/// assert_eq!(spec.parameters().len(), 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionSpec {
    sort_variants: IndexMap<String, String>,
    default_sort_by: String,
    default_sort_direction: SortDirection,
    limit_max: u32,
}

impl SelectionSpec {
    /// Creates a spec sorting by `default_sort_by`, which is also registered
    /// as an alias of itself.
    #[must_use]
    pub fn new(default_sort_by: impl Into<String>, direction: SortDirection) -> Self {
        let default_sort_by = default_sort_by.into();
        let mut sort_variants = IndexMap::new();
        sort_variants.insert(default_sort_by.clone(), default_sort_by.clone());
        Self {
            sort_variants,
            default_sort_by,
            default_sort_direction: direction,
            limit_max: DEFAULT_LIMIT_MAX,
        }
    }

    /// Allows sorting by `column` under its own name.
    #[must_use]
    pub fn with_variant(self, column: impl Into<String>) -> Self {
        let column = column.into();
        self.with_aliased_variant(column.clone(), column)
    }

    /// Allows sorting by `column` under `alias`.
    #[must_use]
    pub fn with_aliased_variant(mut self, alias: impl Into<String>, column: impl Into<String>) -> Self {
        self.sort_variants.insert(alias.into(), column.into());
        self
    }

    /// Sets the upper bound for `limit`. Panics when zero.
    #[must_use]
    pub fn with_limit_max(mut self, limit_max: u32) -> Self {
        assert!(limit_max > 0, "contract misuse: limit_max must be positive");
        self.limit_max = limit_max;
        self
    }

    /// Maps a sort alias to its column.
    #[must_use]
    pub fn column(&self, alias: &str) -> Option<&str> {
        self.sort_variants.get(alias).map(String::as_str)
    }

    /// Sort aliases, in declaration order.
    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.sort_variants.keys().map(String::as_str)
    }

    /// Returns the default sort alias.
    #[must_use]
    pub fn default_sort_by(&self) -> &str {
        &self.default_sort_by
    }

    /// Returns the default direction.
    #[must_use]
    pub const fn default_sort_direction(&self) -> SortDirection {
        self.default_sort_direction
    }

    /// Returns the upper bound for `limit`.
    #[must_use]
    pub const fn limit_max(&self) -> u32 {
        self.limit_max
    }

    /// The four optional selection parameters.
    #[must_use]
    pub fn parameters(&self) -> ParameterSet {
        let aliases = self.aliases().collect::<Vec<_>>().join(", ");
        ParameterSet::from([
            (
                PAGE.to_string(),
                ParameterDeclaration::integer(Requirement::Optional)
                    .description("Page number, starting at 1")
                    .default_value(1),
            ),
            (
                LIMIT.to_string(),
                ParameterDeclaration::integer(Requirement::Optional)
                    .description(format!("Page size, at most {}", self.limit_max))
                    .default_value(self.limit_max),
            ),
            (
                SORT_BY.to_string(),
                ParameterDeclaration::string(Requirement::Optional)
                    .description(format!("Sort key: {aliases}"))
                    .default_value(self.default_sort_by.as_str()),
            ),
            (
                SORT_DIRECTION.to_string(),
                ParameterDeclaration::string(Requirement::Optional)
                    .description("ASC or DESC")
                    .default_value(self.default_sort_direction.as_str()),
            ),
        ])
    }
}

/// Resolved pagination for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionState {
    limit: u32,
    limit_max: u32,
    offset: u64,
    page: u64,
    total_amount: u64,
    sort_by: String,
    sort_column: String,
    sort_direction: SortDirection,
    sort_variants: Vec<String>,
}

impl SelectionState {
    /// Starts at page 1 with the spec's defaults and a full page.
    #[must_use]
    pub fn new(spec: &SelectionSpec, total_amount: u64) -> Self {
        let sort_by = spec.default_sort_by().to_string();
        let sort_column = spec.column(&sort_by).unwrap_or(&sort_by).to_string();
        Self {
            limit: spec.limit_max(),
            limit_max: spec.limit_max(),
            offset: 0,
            page: 1,
            total_amount,
            sort_by,
            sort_column,
            sort_direction: spec.default_sort_direction(),
            sort_variants: spec.aliases().map(str::to_string).collect(),
        }
    }

    /// Moves to `page`, clamped to the valid range.
    pub fn set_page(&mut self, page: u64) {
        let pages = self.pages_total();
        if pages == 0 {
            self.page = 1;
            self.offset = 0;
            return;
        }
        self.page = page.clamp(1, pages);
        self.offset = u64::from(self.limit) * (self.page - 1);
    }

    /// Changes the page size, clamped to `limit_max`, and re-applies the page.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::NonPositiveLimit`] for `limit < 1`.
    pub fn set_limit(&mut self, limit: i64) -> Result<(), SelectionError> {
        if limit < 1 {
            return Err(SelectionError::NonPositiveLimit(limit));
        }
        self.apply_limit(u32::try_from(limit).unwrap_or(self.limit_max));
        Ok(())
    }

    pub(crate) fn apply_limit(&mut self, limit: u32) {
        self.limit = limit.clamp(1, self.limit_max);
        self.set_page(self.page);
    }

    /// Jumps to the page containing `offset`. The offset is aligned down to
    /// the page boundary.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::NegativeOffset`] for `offset < 0`.
    pub fn set_offset(&mut self, offset: i64) -> Result<(), SelectionError> {
        let offset = u64::try_from(offset).map_err(|_| SelectionError::NegativeOffset(offset))?;
        self.set_page(offset / u64::from(self.limit) + 1);
        Ok(())
    }

    pub(crate) fn set_sort(&mut self, alias: String, column: String, direction: SortDirection) {
        self.sort_by = alias;
        self.sort_column = column;
        self.sort_direction = direction;
    }

    /// Number of pages, 0 when nothing matched.
    #[must_use]
    pub fn pages_total(&self) -> u64 {
        self.total_amount.div_ceil(u64::from(self.limit))
    }

    /// The page `offset` falls on.
    #[must_use]
    pub fn calc_page(&self) -> u64 {
        self.offset / u64::from(self.limit) + 1
    }

    /// Returns the page size.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Returns the upper bound for the page size.
    #[must_use]
    pub const fn limit_max(&self) -> u32 {
        self.limit_max
    }

    /// Returns the row offset.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.offset
    }

    /// Returns the current page.
    #[must_use]
    pub const fn page(&self) -> u64 {
        self.page
    }

    /// Returns the total number of matching rows.
    #[must_use]
    pub const fn total_amount(&self) -> u64 {
        self.total_amount
    }

    /// Returns the sort alias.
    #[must_use]
    pub fn sort_by(&self) -> &str {
        &self.sort_by
    }

    /// Returns the column the alias maps to.
    #[must_use]
    pub fn sort_column(&self) -> &str {
        &self.sort_column
    }

    /// Returns the sort direction.
    #[must_use]
    pub const fn sort_direction(&self) -> SortDirection {
        self.sort_direction
    }

    /// Returns the accepted sort aliases.
    #[must_use]
    pub fn sort_variants(&self) -> &[String] {
        &self.sort_variants
    }
}
