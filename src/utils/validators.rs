//! Syntax checks for long URLs, custom aliases and expiry bounds.
//!
//! [`is_valid_url`] and [`is_valid_alias`] are pure predicates. The `validate_*`
//! helpers wrap bound checks into [`AppError::Validation`] with a client-facing message.

use crate::error::AppError;
use regex::Regex;
use serde_json::json;
use std::sync::LazyLock;

/// Maximum accepted length of a long URL, in characters.
pub const MAX_URL_LENGTH: usize = 2048;

/// Upper bound for `expiry_minutes` (one year).
pub const MAX_EXPIRY_MINUTES: i64 = 525_600;

/// Scheme, dot-separated labels ending in an alphabetic TLD, optional `/`-prefixed tail.
static URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(https?://)([a-zA-Z0-9-]+\.)+[a-zA-Z]{2,}(/\S*)?$").expect("valid URL regex")
});

static ALIAS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9-]{3,30}$").expect("valid alias regex"));

/// Returns true if `s` is a syntactically valid `http`/`https` URL.
///
/// No network lookup is performed.
///
/// # Examples
///
/// ```
/// use quicklink::utils::validators::is_valid_url;
///
/// assert!(is_valid_url("https://example.com/path?q=1"));
/// assert!(!is_valid_url("ftp://example.com"));
/// assert!(!is_valid_url("https://localhost"));
/// ```
pub fn is_valid_url(s: &str) -> bool {
    URL_REGEX.is_match(s)
}

/// Returns true if `s` is 3-30 characters of ASCII letters, digits and hyphens.
///
/// # Examples
///
/// ```
/// use quicklink::utils::validators::is_valid_alias;
///
/// assert!(is_valid_alias("my-link"));
/// assert!(!is_valid_alias("ab"));
/// assert!(!is_valid_alias("abc!"));
/// ```
pub fn is_valid_alias(s: &str) -> bool {
    ALIAS_REGEX.is_match(s)
}

/// Rejects URLs longer than [`MAX_URL_LENGTH`] characters.
pub fn validate_url_length(url: &str) -> Result<(), AppError> {
    let length = url.chars().count();
    if length > MAX_URL_LENGTH {
        return Err(AppError::bad_request(
            format!("URL too long (max {MAX_URL_LENGTH} characters)"),
            json!({ "provided_length": length, "max_length": MAX_URL_LENGTH }),
        ));
    }
    Ok(())
}

/// Rejects expiries outside `1..=525600` minutes.
pub fn validate_expiry_minutes(minutes: i64) -> Result<(), AppError> {
    if minutes > MAX_EXPIRY_MINUTES {
        return Err(AppError::bad_request(
            "expiry_minutes cannot exceed 1 year",
            json!({ "expiry_minutes": minutes, "max": MAX_EXPIRY_MINUTES }),
        ));
    }

    if minutes <= 0 {
        return Err(AppError::bad_request(
            "expiry_minutes must be a positive number",
            json!({ "expiry_minutes": minutes }),
        ));
    }

    Ok(())
}
