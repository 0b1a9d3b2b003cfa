//! DTOs for link statistics.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::application::services::MappingStats;

/// Click count and metadata of a short link.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub short_code: String,
    pub original_url: String,
    pub clicks: i64,
    pub created_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<MappingStats> for StatsResponse {
    fn from(stats: MappingStats) -> Self {
        Self {
            short_code: stats.short_code,
            original_url: stats.original_url,
            clicks: stats.clicks,
            created_at: stats.created_at,
            expires_at: stats.expires_at,
        }
    }
}
