//! Input shape checks shared by the request handlers.
//!
//! All helpers are pure; handlers turn a `false` into a 400 response with the
//! offending field named in `details`.

use std::sync::LazyLock;

use regex::Regex;
use uuid::Uuid;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}$")
        .expect("email pattern is valid")
});

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9]{9,15}$").expect("phone pattern is valid"));

/// Earliest year accepted for vehicles and billing periods.
pub const MIN_YEAR: i32 = 1900;
/// Latest year accepted for vehicles and billing periods.
pub const MAX_YEAR: i32 = 2100;

pub fn is_valid_email(value: &str) -> bool {
    value.len() <= 254 && EMAIL_RE.is_match(value)
}

/// Only the canonical hyphenated form (`8-4-4-4-12` hex digits) is accepted.
pub fn is_valid_uuid(value: &str) -> bool {
    value.len() == 36 && Uuid::parse_str(value).is_ok()
}

/// Phone numbers may contain spaces and dashes as separators; what remains
/// must be 9 to 15 digits with an optional leading `+`.
pub fn is_valid_phone(value: &str) -> bool {
    let compact: String = value
        .chars()
        .filter(|c| *c != ' ' && *c != '-')
        .collect();
    PHONE_RE.is_match(&compact)
}

pub fn is_valid_year(year: i32) -> bool {
    (MIN_YEAR..=MAX_YEAR).contains(&year)
}

pub fn is_non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

pub fn is_valid_tax_percentage(value: f64) -> bool {
    value.is_finite() && (0.0..=100.0).contains(&value)
}
