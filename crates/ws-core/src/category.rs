//! Issue title categories.

/// Extracts the component prefix of an issue title.
///
/// Titles conventionally start with the affected package, as in
/// `net/http: fix leak`. The text before the first colon is the category
/// when it contains no whitespace; otherwise the category is empty.
pub fn extract_category(title: &str) -> &str {
    match title.split_once(':') {
        Some((prefix, _)) if !prefix.contains(char::is_whitespace) => prefix,
        _ => "",
    }
}
