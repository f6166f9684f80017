use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for validating uploaded filenames
    /// A single path component: no separators, no control characters
    /// - Valid: "sales.csv", "report 2024.csv", "data-v1.2.csv"
    /// - Invalid: "../x.csv", "dir/x.csv", "dir\\x.csv", ""
    pub static ref FILENAME_REGEX: Regex = Regex::new(r"^[^/\\\x00-\x1f]+$").unwrap();
}

/// Whether `name` can be stored as-is inside the flat upload directory
pub fn is_safe_filename(name: &str) -> bool {
    FILENAME_REGEX.is_match(name) && name != "." && name != ".."
}
