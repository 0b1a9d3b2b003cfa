//! Handler for link shortening endpoint.

use axum::{
    Json,
    extract::{ConnectInfo, State, rejection::JsonRejection},
    http::HeaderMap,
};
use serde_json::json;
use std::net::SocketAddr;

use crate::api::dto::shorten::{ShortenRequest, ShortenResponse};
use crate::application::services::ShortenCommand;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::client_ip::extract_client_info;

/// Creates a short link, or returns the existing one for an already shortened URL.
///
/// # Endpoint
///
/// `POST /shorten`
///
/// # Request Body
///
/// ```json
/// {
///   "long_url": "https://example.com/some/long/path",
///   "expiry_minutes": 60,
///   "custom_alias": "my-link"
/// }
/// ```
///
/// `expiry_minutes` and `custom_alias` are optional. Omitting `expiry_minutes` applies
/// the configured default; `null` creates a link that never expires.
///
/// # Response
///
/// ```json
/// {
///   "short_code": "my-link",
///   "short_url": "http://localhost:8000/my-link"
/// }
/// ```
///
/// # Errors
///
/// - **400** malformed body, invalid URL, alias or expiry
/// - **409** custom alias taken by another URL
/// - **429** rate limit exceeded (with `Retry-After`)
pub async fn shorten_handler(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ShortenRequest>, JsonRejection>,
) -> Result<Json<ShortenResponse>, AppError> {
    let Json(payload) = payload.map_err(|rejection| {
        AppError::bad_request(
            "Invalid request body",
            json!({ "reason": rejection.body_text() }),
        )
    })?;

    let command = ShortenCommand {
        expiry_minutes: payload.effective_expiry(state.default_expiry_minutes),
        long_url: payload.long_url,
        custom_alias: payload.custom_alias,
        client: extract_client_info(&headers, addr, state.behind_proxy),
    };

    let mapping = state.shorten_service.shorten(command).await?;
    let short_url = state.shorten_service.short_url(&mapping.short_code);

    Ok(Json(ShortenResponse {
        short_code: mapping.short_code,
        short_url,
    }))
}
