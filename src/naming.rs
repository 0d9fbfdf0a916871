//! Name derivation helpers for generated identifiers and files.

use once_cell::sync::Lazy;
use regex::Regex;

static FIRST_CAP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(.)([A-Z][a-z]+)").expect("valid regex"));
static ALL_CAP: Lazy<Regex> = Lazy::new(|| Regex::new(r"([a-z0-9])([A-Z])").expect("valid regex"));

/// `ApiBookInfo` -> `api_book_info`, `HTTPServer` -> `http_server`
pub fn to_snake_case(name: &str) -> String {
    let name = FIRST_CAP.replace_all(name, "${1}_${2}");
    let name = ALL_CAP.replace_all(&name, "${1}_${2}");
    name.to_lowercase()
}

/// Upper-case the first character: `int64` -> `Int64`
pub fn to_cap(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Name of the value-conversion helper for a primitive, e.g.
/// `cast.ToInt64` for prefix `cast.To` and `int64`
pub fn conversion_function(prefix: &str, primitive: &str) -> String {
    format!("{prefix}{}", to_cap(primitive))
}
