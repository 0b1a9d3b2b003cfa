//! Short code resolution for redirects.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{debug, info};

use crate::domain::repositories::MappingRepository;
use crate::error::AppError;

/// Resolves short codes to their target URLs and counts clicks.
pub struct RedirectService<R: MappingRepository + ?Sized> {
    repository: Arc<R>,
}

impl<R: MappingRepository + ?Sized> RedirectService<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Resolves `code` to its original URL and records one click.
    ///
    /// An expired mapping is deleted on the spot and reported as expired; later calls
    /// for the same code see [`AppError::NotFound`]. Click counting is best-effort: two
    /// concurrent resolves racing an expiry may both count.
    ///
    /// # Errors
    ///
    /// - [`AppError::NotFound`] if no mapping holds `code`
    /// - [`AppError::Expired`] if the mapping's expiry has passed
    /// - [`AppError::Internal`] on storage errors
    pub async fn resolve(&self, code: &str) -> Result<String, AppError> {
        let mapping = self
            .repository
            .find_by_code(code)
            .await?
            .ok_or_else(|| not_found(code))?;

        let now = Utc::now();
        if mapping.is_expired_at(now) {
            self.repository.delete_if_expired(mapping.id, now).await?;
            info!(code = %code, "Deleted expired mapping on redirect");
            return Err(AppError::expired(
                "This short URL has expired and is no longer available",
                json!({ "code": code, "expired_at": mapping.expires_at }),
            ));
        }

        let updated = self
            .repository
            .increment_clicks(code)
            .await?
            .ok_or_else(|| not_found(code))?;

        debug!(code = %code, clicks = updated.clicks, "Resolved short code");
        Ok(updated.original_url)
    }
}

fn not_found(code: &str) -> AppError {
    AppError::not_found("Short URL not found", json!({ "code": code }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Mapping;
    use crate::domain::repositories::MockMappingRepository;
    use chrono::{DateTime, Duration};

    fn test_mapping(expires_at: Option<DateTime<Utc>>, clicks: i64) -> Mapping {
        Mapping {
            id: 11,
            original_url: "https://example.com/target".to_string(),
            short_code: "go1234".to_string(),
            created_at: Utc::now() - Duration::days(1),
            expires_at,
            clicks,
            created_ip: None,
            user_agent: None,
        }
    }

    #[tokio::test]
    async fn test_resolve_increments_and_returns_url() {
        let mut repo = MockMappingRepository::new();
        let found = test_mapping(Some(Utc::now() + Duration::hours(1)), 0);
        let incremented = test_mapping(None, 1);
        repo.expect_find_by_code()
            .withf(|code| code == "go1234")
            .times(1)
            .returning(move |_| Ok(Some(found.clone())));
        repo.expect_increment_clicks()
            .withf(|code| code == "go1234")
            .times(1)
            .returning(move |_| Ok(Some(incremented.clone())));
        repo.expect_delete_if_expired().times(0);

        let url = RedirectService::new(Arc::new(repo))
            .resolve("go1234")
            .await
            .unwrap();

        assert_eq!(url, "https://example.com/target");
    }

    #[tokio::test]
    async fn test_resolve_unknown_code() {
        let mut repo = MockMappingRepository::new();
        repo.expect_find_by_code().times(1).returning(|_| Ok(None));
        repo.expect_increment_clicks().times(0);

        let err = RedirectService::new(Arc::new(repo))
            .resolve("missing")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_resolve_expired_deletes_and_fails() {
        let mut repo = MockMappingRepository::new();
        let expired = test_mapping(Some(Utc::now() - Duration::seconds(5)), 4);
        repo.expect_find_by_code()
            .times(1)
            .returning(move |_| Ok(Some(expired.clone())));
        repo.expect_delete_if_expired()
            .withf(|id, _| *id == 11)
            .times(1)
            .returning(|_, _| Ok(true));
        repo.expect_increment_clicks().times(0);

        let err = RedirectService::new(Arc::new(repo))
            .resolve("go1234")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Expired { .. }));
    }

    #[tokio::test]
    async fn test_resolve_deleted_between_lookup_and_increment() {
        let mut repo = MockMappingRepository::new();
        let found = test_mapping(None, 0);
        repo.expect_find_by_code()
            .returning(move |_| Ok(Some(found.clone())));
        repo.expect_increment_clicks()
            .times(1)
            .returning(|_| Ok(None));

        let err = RedirectService::new(Arc::new(repo))
            .resolve("go1234")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound { .. }));
    }
}
