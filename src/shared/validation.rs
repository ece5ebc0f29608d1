use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for plain decimal coordinates as sent by map pickers
    /// - Valid: "12.9716", "-6.2088", "+77", "0.5", ".5"
    /// - Invalid: "abc", "1e5", "NaN", "inf", "12,97", "", " 12"
    pub static ref COORDINATE_REGEX: Regex =
        Regex::new(r"^[+-]?(?:\d+(?:\.\d*)?|\.\d+)$").unwrap();
}

/// Parse a decimal coordinate string, rejecting anything that is not a
/// plain finite decimal number.
pub fn parse_coordinate(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if !COORDINATE_REGEX.is_match(trimmed) {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}
