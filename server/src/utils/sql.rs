//! SQL utility functions

/// Escape SQL LIKE metacharacters (%, _, \) in user input
///
/// Pair the resulting pattern with `ESCAPE '\'`.
///
/// # Example
///
/// ```
/// use tablekit_server::utils::sql::escape_like_pattern;
///
/// let needle = "100% match_test";
/// let pattern = format!("%{}%", escape_like_pattern(needle));
/// assert_eq!(pattern, "%100\\% match\\_test%");
/// ```
pub fn escape_like_pattern(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Double-quote an identifier, doubling embedded quotes
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
