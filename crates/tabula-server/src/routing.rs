//! Path to method-name rewriting.
//!
//! A request path relative to the base path maps onto a registered method
//! name. `GET /api/v1/books` calls `getBooks`, `PUT /api/v1/books/5` calls
//! `putBooksWithId` with `id = 5`, and `POST /api/v1/tokens/refresh` calls
//! `tokens/postRefresh`.

use http::Method;

/// Suffix appended when the last path segment is an integer.
pub const WITH_ID_SUFFIX: &str = "WithId";

/// Input key receiving the integer path segment.
pub const ID_PARAMETER: &str = "id";

/// A path resolved to a method name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// Registered method name.
    pub method_name: String,
    /// Integer taken from the last path segment.
    pub id: Option<i64>,
}

/// Returns `path` relative to `base_path`, or `None` when it lies outside.
///
/// ```
/// use tabula_server::routing::strip_base_path;
///
/// assert_eq!(strip_base_path("/api/v1", "/api/v1/books"), Some("books"));
/// assert_eq!(strip_base_path("/api/v1", "/api/v10/books"), None);
/// assert_eq!(strip_base_path("/", "/books"), Some("books"));
/// ```
#[must_use]
pub fn strip_base_path<'a>(base_path: &str, path: &'a str) -> Option<&'a str> {
    let base = base_path.trim_end_matches('/');
    let rest = path.strip_prefix(base)?;
    if rest.is_empty() {
        return Some(rest);
    }
    rest.strip_prefix('/')
}

/// Rewrites a relative path into a method name.
///
/// Returns `None` when no method could possibly match: an empty path, an
/// empty segment, or a segment that does not start with a lower-case letter.
#[must_use]
pub fn resolve(verb: &Method, relative_path: &str) -> Option<Route> {
    let mut segments: Vec<&str> = relative_path.split('/').collect();

    let mut last = segments.pop()?;
    let id = parse_canonical_int(last);
    if id.is_some() {
        last = segments.pop()?;
    }
    if last.is_empty() {
        return None;
    }

    let verb = verb.as_str().to_ascii_lowercase();
    let mut name = if last.starts_with(&verb) {
        last.to_string()
    } else {
        format!("{verb}{}", upper_first(last))
    };
    if id.is_some() {
        name.push_str(WITH_ID_SUFFIX);
    }

    if !segments.iter().copied().chain([name.as_str()]).all(starts_lowercase) {
        return None;
    }

    segments.push(&name);
    Some(Route {
        method_name: segments.join("/"),
        id,
    })
}

/// Parses `segment` only if it is the canonical rendering of an integer.
fn parse_canonical_int(segment: &str) -> Option<i64> {
    segment
        .parse::<i64>()
        .ok()
        .filter(|value| value.to_string() == segment)
}

fn upper_first(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn starts_lowercase(segment: &str) -> bool {
    segment.chars().next().is_some_and(|c| c.is_ascii_lowercase())
}
