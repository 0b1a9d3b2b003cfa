//! Business logic services for the application layer.

pub mod rate_limiter;
pub mod redirect_service;
pub mod shorten_service;
pub mod stats_service;

pub use rate_limiter::RateLimiter;
pub use redirect_service::RedirectService;
pub use shorten_service::{ShortenCommand, ShortenService, ShortenSettings};
pub use stats_service::{MappingStats, StatsService};
