//! Repository trait for mapping storage.

use crate::domain::entities::{Mapping, NewMapping, StoreSummary};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Name of the uniqueness constraint on `short_code`.
pub const SHORT_CODE_CONSTRAINT: &str = "mappings_short_code_key";

/// Name of the uniqueness constraint on `original_url`.
pub const ORIGINAL_URL_CONSTRAINT: &str = "mappings_original_url_key";

/// Storage interface for mappings.
///
/// The store enforces uniqueness of `short_code` and of `original_url`. Violations are
/// reported as [`AppError::Conflict`] with the constraint name
/// ([`SHORT_CODE_CONSTRAINT`] or [`ORIGINAL_URL_CONSTRAINT`]) in `details.constraint`,
/// so callers can tell the two races apart.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgMappingRepository`] - PostgreSQL
/// - [`crate::infrastructure::persistence::MemoryMappingRepository`] - in-process
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MappingRepository: Send + Sync {
    /// Inserts a new mapping with `clicks = 0`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the short code or the original URL is taken.
    /// Returns [`AppError::Internal`] on storage errors.
    async fn create(&self, new_mapping: NewMapping) -> Result<Mapping, AppError>;

    /// Finds a mapping by short code, expired or not.
    async fn find_by_code(&self, code: &str) -> Result<Option<Mapping>, AppError>;

    /// Finds a mapping by exact original URL, expired or not.
    async fn find_by_original_url(&self, original_url: &str)
    -> Result<Option<Mapping>, AppError>;

    /// Returns true if any mapping, live or expired, holds `code`.
    async fn code_exists(&self, code: &str) -> Result<bool, AppError>;

    /// Sets a new expiry on the mapping with `id`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the mapping no longer exists.
    async fn update_expiry(
        &self,
        id: i64,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<Mapping, AppError>;

    /// Atomically increments the click counter and returns the updated mapping.
    ///
    /// Returns `Ok(None)` if no mapping holds `code` any more.
    async fn increment_clicks(&self, code: &str) -> Result<Option<Mapping>, AppError>;

    /// Deletes the mapping with `id` only if it is expired as of `now`.
    ///
    /// Returns `Ok(true)` if a row was removed. A mapping whose expiry was extended in
    /// the meantime is left untouched.
    async fn delete_if_expired(&self, id: i64, now: DateTime<Utc>) -> Result<bool, AppError>;

    /// Deletes every mapping expired as of `now` and returns how many were removed.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError>;

    /// Store-wide totals.
    async fn summary(&self, now: DateTime<Utc>) -> Result<StoreSummary, AppError>;

    /// Checks that the backing store is reachable.
    async fn ping(&self) -> Result<(), AppError>;
}
