//! PostgreSQL implementation of the mapping repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{Mapping, NewMapping, StoreSummary};
use crate::domain::repositories::MappingRepository;
use crate::error::AppError;

const MAPPING_COLUMNS: &str =
    "id, original_url, short_code, created_at, expires_at, clicks, created_ip, user_agent";

/// PostgreSQL repository for mapping storage and retrieval.
///
/// Uniqueness of `short_code` and `original_url` is enforced by the schema; violations
/// surface as [`AppError::Conflict`] carrying the constraint name.
pub struct PgMappingRepository {
    pool: Arc<PgPool>,
}

impl PgMappingRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MappingRepository for PgMappingRepository {
    async fn create(&self, new_mapping: NewMapping) -> Result<Mapping, AppError> {
        let mapping = sqlx::query_as::<_, Mapping>(&format!(
            r#"
            INSERT INTO mappings (original_url, short_code, created_at, expires_at, created_ip, user_agent)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {MAPPING_COLUMNS}
            "#
        ))
        .bind(&new_mapping.original_url)
        .bind(&new_mapping.short_code)
        .bind(new_mapping.created_at)
        .bind(new_mapping.expires_at)
        .bind(&new_mapping.created_ip)
        .bind(&new_mapping.user_agent)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(mapping)
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Mapping>, AppError> {
        let mapping = sqlx::query_as::<_, Mapping>(&format!(
            "SELECT {MAPPING_COLUMNS} FROM mappings WHERE short_code = $1"
        ))
        .bind(code)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(mapping)
    }

    async fn find_by_original_url(
        &self,
        original_url: &str,
    ) -> Result<Option<Mapping>, AppError> {
        // md5() lets the lookup use the unique expression index.
        let mapping = sqlx::query_as::<_, Mapping>(&format!(
            r#"
            SELECT {MAPPING_COLUMNS}
            FROM mappings
            WHERE md5(original_url) = md5($1) AND original_url = $1
            "#
        ))
        .bind(original_url)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(mapping)
    }

    async fn code_exists(&self, code: &str) -> Result<bool, AppError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM mappings WHERE short_code = $1)")
                .bind(code)
                .fetch_one(self.pool.as_ref())
                .await?;

        Ok(exists)
    }

    async fn update_expiry(
        &self,
        id: i64,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<Mapping, AppError> {
        sqlx::query_as::<_, Mapping>(&format!(
            "UPDATE mappings SET expires_at = $2 WHERE id = $1 RETURNING {MAPPING_COLUMNS}"
        ))
        .bind(id)
        .bind(expires_at)
        .fetch_optional(self.pool.as_ref())
        .await?
        .ok_or_else(|| AppError::not_found("Mapping not found", json!({ "id": id })))
    }

    async fn increment_clicks(&self, code: &str) -> Result<Option<Mapping>, AppError> {
        let mapping = sqlx::query_as::<_, Mapping>(&format!(
            "UPDATE mappings SET clicks = clicks + 1 WHERE short_code = $1 RETURNING {MAPPING_COLUMNS}"
        ))
        .bind(code)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(mapping)
    }

    async fn delete_if_expired(&self, id: i64, now: DateTime<Utc>) -> Result<bool, AppError> {
        let result = sqlx::query(
            "DELETE FROM mappings WHERE id = $1 AND expires_at IS NOT NULL AND expires_at <= $2",
        )
        .bind(id)
        .bind(now)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let result =
            sqlx::query("DELETE FROM mappings WHERE expires_at IS NOT NULL AND expires_at <= $1")
                .bind(now)
                .execute(self.pool.as_ref())
                .await?;

        Ok(result.rows_affected())
    }

    async fn summary(&self, now: DateTime<Utc>) -> Result<StoreSummary, AppError> {
        let (mappings, expired, clicks): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                COUNT(*) FILTER (WHERE expires_at IS NOT NULL AND expires_at <= $1),
                COALESCE(SUM(clicks), 0)::BIGINT
            FROM mappings
            "#,
        )
        .bind(now)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(StoreSummary {
            mappings,
            expired,
            clicks,
        })
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(self.pool.as_ref())
            .await?;
        Ok(())
    }
}
