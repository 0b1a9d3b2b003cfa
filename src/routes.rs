//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /`             - Health check
//! - `POST /shorten`      - Create a short link
//! - `GET  /stats/{code}` - Link statistics
//! - `GET  /{code}`       - Short link redirect
//!
//! # Middleware
//!
//! - **CORS** - Permissive: any origin, method and header
//! - **Tracing** - Structured request/response logging
//! - **Path normalization** - Trailing slash handling
//!
//! Rate limiting is not a layer here: it applies to link creation only and lives in
//! the shorten service.

use crate::api;
use crate::api::middleware::tracing;
use crate::state::AppState;
use axum::Router;
use tower::Layer;
use tower_http::cors::CorsLayer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Builds the router with all routes and per-route middleware, without path
/// normalization.
pub fn api_router(state: AppState) -> Router {
    api::routes::public_routes()
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(tracing::layer())
}

/// Constructs the application router with all routes and middleware.
///
/// Trailing slashes are trimmed before routing, so `/stats/abc/` reaches the same
/// handler as `/stats/abc`.
pub fn app_router(state: AppState) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(api_router(state))
}
