//! Mapping entity representing a short code bound to a target URL.

use chrono::{DateTime, Utc};

/// A stored short code → URL association with its metadata.
///
/// `created_ip` and `user_agent` are captured once at creation for auditing and never
/// change afterwards.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Mapping {
    pub id: i64,
    pub original_url: String,
    pub short_code: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub clicks: i64,
    pub created_ip: Option<String>,
    pub user_agent: Option<String>,
}

impl Mapping {
    /// Returns true if the mapping's expiry lies at or before `now`.
    ///
    /// Mappings without `expires_at` never expire.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|e| e <= now)
    }

    /// Returns true if the mapping has passed its expiry time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Returns true if the mapping is still resolvable at `now`.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_expired_at(now)
    }
}

/// Input data for creating a new mapping.
///
/// `created_at` is supplied by the caller so that it is the same instant the expiry
/// was computed from.
#[derive(Debug, Clone)]
pub struct NewMapping {
    pub original_url: String,
    pub short_code: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_ip: Option<String>,
    pub user_agent: Option<String>,
}

impl NewMapping {
    /// Materializes the stored row once the store has assigned an id.
    pub fn into_mapping(self, id: i64) -> Mapping {
        Mapping {
            id,
            original_url: self.original_url,
            short_code: self.short_code,
            created_at: self.created_at,
            expires_at: self.expires_at,
            clicks: 0,
            created_ip: self.created_ip,
            user_agent: self.user_agent,
        }
    }
}

/// Aggregate numbers over the whole store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreSummary {
    pub mappings: i64,
    pub expired: i64,
    pub clicks: i64,
}
