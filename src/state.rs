//! Shared application state injected into every handler.

use std::sync::Arc;

use crate::application::services::{
    RateLimiter, RedirectService, ShortenService, ShortenSettings, StatsService,
};
use crate::domain::repositories::MappingRepository;

/// Application state cloned into each request.
#[derive(Clone)]
pub struct AppState {
    pub shorten_service: Arc<ShortenService<dyn MappingRepository>>,
    pub redirect_service: Arc<RedirectService<dyn MappingRepository>>,
    pub stats_service: Arc<StatsService<dyn MappingRepository>>,
    pub rate_limiter: Arc<RateLimiter>,
    /// Trust forwarding headers when identifying clients.
    pub behind_proxy: bool,
    /// Expiry applied when a creation request omits `expiry_minutes`.
    pub default_expiry_minutes: i64,
}

impl AppState {
    /// Wires all services around one repository and one rate limiter.
    pub fn new(
        repository: Arc<dyn MappingRepository>,
        rate_limiter: Arc<RateLimiter>,
        settings: ShortenSettings,
        default_expiry_minutes: i64,
        behind_proxy: bool,
    ) -> Self {
        Self {
            shorten_service: Arc::new(ShortenService::new(
                repository.clone(),
                rate_limiter.clone(),
                settings,
            )),
            redirect_service: Arc::new(RedirectService::new(repository.clone())),
            stats_service: Arc::new(StatsService::new(repository)),
            rate_limiter,
            behind_proxy,
            default_expiry_minutes,
        }
    }
}
