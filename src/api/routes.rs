//! API route configuration.
//!
//! None of the endpoints require authentication.

use crate::api::handlers::{health_handler, redirect_handler, shorten_handler, stats_handler};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

/// All public API routes.
///
/// # Endpoints
///
/// - `GET  /`              - Health check
/// - `POST /shorten`       - Create a short link
/// - `GET  /stats/{code}`  - Click count and metadata for a link
/// - `GET  /{code}`        - Redirect to the original URL
///
/// Fixed routes take precedence over `/{code}`, which is why `shorten` and `stats`
/// can never be used as custom aliases.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(health_handler))
        .route("/shorten", post(shorten_handler))
        .route("/stats/{code}", get(stats_handler))
        .route("/{code}", get(redirect_handler))
}
