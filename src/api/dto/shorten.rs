//! DTOs for link shortening endpoint.

use serde::{Deserialize, Serialize};

/// Request to shorten a URL.
#[derive(Debug, Deserialize)]
pub struct ShortenRequest {
    pub long_url: String,

    /// Lifetime in minutes.
    ///
    /// - field absent: the configured default applies
    /// - `null`: the link never expires
    /// - number: expires that many minutes from now
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub expiry_minutes: Option<Option<i64>>,

    pub custom_alias: Option<String>,
}

impl ShortenRequest {
    /// Resolves the requested lifetime against `default_minutes`.
    pub fn effective_expiry(&self, default_minutes: i64) -> Option<i64> {
        match self.expiry_minutes {
            None => Some(default_minutes),
            Some(minutes) => minutes,
        }
    }
}

/// Created (or reused) short link.
#[derive(Debug, Serialize)]
pub struct ShortenResponse {
    pub short_code: String,
    pub short_url: String,
}
