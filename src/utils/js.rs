//! JavaScript source construction helpers.

/// Render a string as a JavaScript string literal by way of its JSON
/// encoding, so quotes, backslashes and control characters are escaped.
pub fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}
