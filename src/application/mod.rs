//! Application layer services implementing business logic.
//!
//! Services orchestrate validation, rate limiting and repository calls, and give HTTP
//! handlers and the admin CLI a clean API.
//!
//! # Available Services
//!
//! - [`services::shorten_service::ShortenService`] - Short link creation
//! - [`services::redirect_service::RedirectService`] - Code resolution and click counting
//! - [`services::stats_service::StatsService`] - Mapping statistics and expiry sweeps
//! - [`services::rate_limiter::RateLimiter`] - Per-client creation admission control

pub mod services;
