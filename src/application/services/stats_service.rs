//! Read-only mapping statistics and expired-mapping maintenance.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::info;

use crate::domain::entities::{Mapping, StoreSummary};
use crate::domain::repositories::MappingRepository;
use crate::error::AppError;

/// Public metadata of a single mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct MappingStats {
    pub short_code: String,
    pub original_url: String,
    pub clicks: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<Mapping> for MappingStats {
    fn from(m: Mapping) -> Self {
        Self {
            short_code: m.short_code,
            original_url: m.original_url,
            clicks: m.clicks,
            created_at: m.created_at,
            expires_at: m.expires_at,
        }
    }
}

/// Service for mapping statistics.
pub struct StatsService<R: MappingRepository + ?Sized> {
    repository: Arc<R>,
}

impl<R: MappingRepository + ?Sized> StatsService<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Returns click count and metadata for `code`.
    ///
    /// Unlike redirects, this path never deletes: an expired mapping is reported as
    /// [`AppError::Expired`] and left in storage until a redirect, a resubmission or a
    /// sweep removes it.
    ///
    /// # Errors
    ///
    /// - [`AppError::NotFound`] if no mapping holds `code`
    /// - [`AppError::Expired`] if the mapping's expiry has passed
    pub async fn stats(&self, code: &str) -> Result<MappingStats, AppError> {
        let mapping = self
            .repository
            .find_by_code(code)
            .await?
            .ok_or_else(|| AppError::not_found("Short URL not found", json!({ "code": code })))?;

        if mapping.is_expired() {
            return Err(AppError::expired(
                "This short URL has expired and is no longer available",
                json!({ "code": code, "expired_at": mapping.expires_at }),
            ));
        }

        Ok(mapping.into())
    }

    /// Deletes all mappings expired as of `now`.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let removed = self.repository.purge_expired(now).await?;
        if removed > 0 {
            info!(removed, "Purged expired mappings");
        }
        Ok(removed)
    }

    /// Store-wide totals.
    pub async fn summary(&self) -> Result<StoreSummary, AppError> {
        self.repository.summary(Utc::now()).await
    }

    /// Checks that storage is reachable.
    pub async fn health_check(&self) -> Result<(), AppError> {
        self.repository.ping().await
    }
}
