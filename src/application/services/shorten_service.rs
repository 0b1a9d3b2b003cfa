//! Short link creation: admission, validation, idempotency and code assignment.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::application::services::rate_limiter::RateLimiter;
use crate::domain::entities::{Mapping, NewMapping};
use crate::domain::repositories::{
    MappingRepository, ORIGINAL_URL_CONSTRAINT, SHORT_CODE_CONSTRAINT,
};
use crate::error::AppError;
use crate::utils::client_ip::ClientInfo;
use crate::utils::code_generator::{DEFAULT_CODE_LENGTH, DEFAULT_MAX_ATTEMPTS, generate_unique_code};
use crate::utils::validators::{
    is_valid_alias, is_valid_url, validate_expiry_minutes, validate_url_length,
};

/// Aliases that collide with fixed routes and can never be claimed.
///
/// Mirrors the literal first path segments of [`crate::api::routes::public_routes`]
/// (`/shorten` and `/stats/{code}`). Those routes win over `/{code}`, so a mapping under
/// one of these codes could be created but never redirected. Compared case-insensitively.
/// Keep this list in step with the route table.
pub const RESERVED_ALIASES: &[&str] = &["shorten", "stats"];

/// Request to shorten a single URL.
#[derive(Debug, Clone)]
pub struct ShortenCommand {
    pub long_url: String,
    /// Lifetime in minutes; `None` means the mapping never expires.
    pub expiry_minutes: Option<i64>,
    pub custom_alias: Option<String>,
    pub client: ClientInfo,
}

/// Tunables for [`ShortenService`].
#[derive(Debug, Clone)]
pub struct ShortenSettings {
    /// Prefix for short URLs, e.g. `https://sho.rt`.
    pub base_url: String,
    pub code_length: usize,
    pub max_attempts: usize,
}

impl Default for ShortenSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            code_length: DEFAULT_CODE_LENGTH,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Service for creating short links.
///
/// # Idempotency
///
/// Submitting a URL that already has a live mapping returns that mapping instead of
/// minting a new code. This also applies when a custom alias is supplied: the existing
/// code wins and the alias is ignored. When the request carries an expiry, the
/// existing mapping's expiry is moved to the newly computed time.
pub struct ShortenService<R: MappingRepository + ?Sized> {
    repository: Arc<R>,
    rate_limiter: Arc<RateLimiter>,
    settings: ShortenSettings,
}

impl<R: MappingRepository + ?Sized> ShortenService<R> {
    /// Creates a new shorten service.
    pub fn new(repository: Arc<R>, rate_limiter: Arc<RateLimiter>, settings: ShortenSettings) -> Self {
        Self {
            repository,
            rate_limiter,
            settings,
        }
    }

    /// Shortens a URL.
    ///
    /// Gates run in order and the first failure aborts without touching storage:
    /// rate limit, URL length, expiry bounds, URL syntax. Then an existing mapping for
    /// the same URL is reused, or a new one is created under the custom alias or a
    /// generated code.
    ///
    /// # Errors
    ///
    /// - [`AppError::RateLimited`] if the client exceeded its creation budget
    /// - [`AppError::Validation`] for bad URLs, aliases or expiries
    /// - [`AppError::Conflict`] if the alias belongs to a live mapping of another URL
    /// - [`AppError::GenerationExhausted`] if no free code could be drawn
    /// - [`AppError::Internal`] on storage errors
    pub async fn shorten(&self, command: ShortenCommand) -> Result<Mapping, AppError> {
        let ShortenCommand {
            long_url,
            expiry_minutes,
            custom_alias,
            client,
        } = command;

        let now = Utc::now();
        self.admit(&client, now)?;

        let long_url = long_url.trim().to_string();
        validate_url_length(&long_url)?;

        if let Some(minutes) = expiry_minutes {
            validate_expiry_minutes(minutes)?;
        }

        if !is_valid_url(&long_url) {
            return Err(AppError::bad_request(
                "Invalid URL",
                json!({ "url": long_url }),
            ));
        }

        let expires_at = expiry_minutes.map(|minutes| now + Duration::minutes(minutes));

        if let Some(existing) = self
            .reuse_existing(&long_url, expiry_minutes.is_some(), expires_at, now)
            .await?
        {
            return Ok(existing);
        }

        let alias = match custom_alias.filter(|a| !a.is_empty()) {
            Some(raw) => {
                let alias = raw.trim().to_string();
                validate_alias(&alias)?;

                if let Some(existing) = self.claim_alias(&alias, &long_url, now).await? {
                    return Ok(existing);
                }

                Some(alias)
            }
            None => None,
        };

        let template = NewMapping {
            original_url: long_url,
            short_code: String::new(),
            created_at: now,
            expires_at,
            created_ip: client.ip,
            user_agent: client.user_agent,
        };

        self.insert(template, alias).await
    }

    /// Builds the public short URL for a code.
    pub fn short_url(&self, code: &str) -> String {
        format!("{}/{}", self.settings.base_url.trim_end_matches('/'), code)
    }

    fn admit(&self, client: &ClientInfo, now: DateTime<Utc>) -> Result<(), AppError> {
        let key = client.rate_limit_key();

        if self.rate_limiter.check_and_record(key, now) {
            return Ok(());
        }

        let retry_after = self.rate_limiter.retry_after(key, now);
        warn!(client = %key, retry_after, "Creation rate limit exceeded");

        Err(AppError::rate_limited(
            "Too many requests. Please try again later.",
            retry_after,
            json!({
                "limit": self.rate_limiter.max_requests(),
                "window_seconds": self.rate_limiter.window().num_seconds(),
            }),
        ))
    }

    /// Returns the live mapping for `long_url`, extending its expiry if one was given.
    ///
    /// An expired mapping is deleted and `None` returned so creation proceeds.
    async fn reuse_existing(
        &self,
        long_url: &str,
        expiry_given: bool,
        expires_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<Option<Mapping>, AppError> {
        let Some(existing) = self.repository.find_by_original_url(long_url).await? else {
            return Ok(None);
        };

        if existing.is_expired_at(now) {
            self.repository.delete_if_expired(existing.id, now).await?;
            info!(code = %existing.short_code, "Deleted expired mapping for resubmitted URL");
            return Ok(None);
        }

        if expiry_given {
            let updated = self
                .repository
                .update_expiry(existing.id, expires_at)
                .await?;
            info!(code = %updated.short_code, expires_at = ?expires_at, "Extended expiry of existing mapping");
            return Ok(Some(updated));
        }

        debug!(code = %existing.short_code, "Reusing existing mapping");
        Ok(Some(existing))
    }

    /// Checks whether `alias` can be claimed for `long_url`.
    ///
    /// Returns the mapping itself if it already points at `long_url`. An expired holder
    /// is deleted to free the alias.
    async fn claim_alias(
        &self,
        alias: &str,
        long_url: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Mapping>, AppError> {
        let Some(holder) = self.repository.find_by_code(alias).await? else {
            return Ok(None);
        };

        if holder.is_live_at(now) {
            if holder.original_url == long_url {
                return Ok(Some(holder));
            }
            return Err(alias_conflict(alias));
        }

        self.repository.delete_if_expired(holder.id, now).await?;
        info!(code = %alias, "Released expired alias");
        Ok(None)
    }

    /// Persists a mapping, resolving uniqueness races reported by the store.
    async fn insert(&self, template: NewMapping, alias: Option<String>) -> Result<Mapping, AppError> {
        for _ in 0..self.settings.max_attempts {
            let short_code = match &alias {
                Some(alias) => alias.clone(),
                None => {
                    generate_unique_code(
                        self.repository.as_ref(),
                        self.settings.code_length,
                        self.settings.max_attempts,
                    )
                    .await?
                }
            };

            let new_mapping = NewMapping {
                short_code,
                ..template.clone()
            };

            match self.repository.create(new_mapping).await {
                Ok(mapping) => {
                    info!(
                        code = %mapping.short_code,
                        url = %mapping.original_url,
                        expires_at = ?mapping.expires_at,
                        "Created mapping"
                    );
                    return Ok(mapping);
                }
                Err(e) if e.is_unique_violation_on(ORIGINAL_URL_CONSTRAINT) => {
                    debug!(url = %template.original_url, "URL shortened concurrently, returning existing mapping");
                    return self.existing_after_race(&template.original_url).await;
                }
                Err(e) if e.is_unique_violation_on(SHORT_CODE_CONSTRAINT) => {
                    if let Some(alias) = &alias {
                        return Err(alias_conflict(alias));
                    }
                    debug!("Generated code taken concurrently, drawing again");
                }
                Err(e) => return Err(e),
            }
        }

        Err(AppError::generation_exhausted(
            "Failed to generate unique code",
            json!({ "reason": "Too many collisions", "attempts": self.settings.max_attempts }),
        ))
    }

    async fn existing_after_race(&self, long_url: &str) -> Result<Mapping, AppError> {
        self.repository
            .find_by_original_url(long_url)
            .await?
            .ok_or_else(|| {
                AppError::conflict(
                    "URL was modified concurrently, please retry",
                    json!({ "url": long_url }),
                )
            })
    }
}

fn validate_alias(alias: &str) -> Result<(), AppError> {
    if !is_valid_alias(alias) {
        return Err(AppError::bad_request(
            "Alias must be 3-30 characters (letters, numbers, hyphens only)",
            json!({ "alias": alias }),
        ));
    }

    if RESERVED_ALIASES.contains(&alias.to_ascii_lowercase().as_str()) {
        return Err(AppError::bad_request(
            "This alias is reserved",
            json!({ "alias": alias }),
        ));
    }

    Ok(())
}

fn alias_conflict(alias: &str) -> AppError {
    AppError::conflict("Custom alias already in use", json!({ "alias": alias }))
}
