//! Client identity extraction for rate limiting and auditing.

use axum::http::{HeaderMap, header};
use std::net::SocketAddr;

/// Request metadata captured at creation time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    /// Client IP address, used as the rate-limit key.
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

impl ClientInfo {
    pub fn new(ip: Option<String>, user_agent: Option<String>) -> Self {
        Self { ip, user_agent }
    }

    /// Key under which this client's creation requests are counted.
    ///
    /// Clients without a known address share one bucket.
    pub fn rate_limit_key(&self) -> &str {
        self.ip.as_deref().unwrap_or("unknown")
    }
}

/// Builds [`ClientInfo`] from request headers and the peer address.
///
/// With `behind_proxy`, the first `X-Forwarded-For` entry wins, then `X-Real-IP`, then
/// the socket peer. Without it, forwarding headers are ignored since any client can
/// set them.
///
/// # Examples
///
/// ```ignore
/// let mut headers = HeaderMap::new();
/// headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());
///
/// let info = extract_client_info(&headers, peer, true);
/// assert_eq!(info.ip.as_deref(), Some("203.0.113.7"));
/// ```
pub fn extract_client_info(headers: &HeaderMap, peer: SocketAddr, behind_proxy: bool) -> ClientInfo {
    let forwarded = if behind_proxy {
        forwarded_ip(headers)
    } else {
        None
    };

    let ip = forwarded.unwrap_or_else(|| peer.ip().to_string());

    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    ClientInfo::new(Some(ip), user_agent)
}

fn forwarded_ip(headers: &HeaderMap) -> Option<String> {
    let from_header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    from_header("x-forwarded-for").or_else(|| from_header("x-real-ip"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn peer() -> SocketAddr {
        "192.0.2.10:54321".parse().unwrap()
    }

    #[test]
    fn test_peer_address_used_by_default() {
        let headers = HeaderMap::new();
        let info = extract_client_info(&headers, peer(), false);

        assert_eq!(info.ip.as_deref(), Some("192.0.2.10"));
        assert!(info.user_agent.is_none());
    }

    #[test]
    fn test_forwarded_headers_ignored_without_proxy() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7"));

        let info = extract_client_info(&headers, peer(), false);
        assert_eq!(info.ip.as_deref(), Some("192.0.2.10"));
    }

    #[test]
    fn test_first_forwarded_for_entry_behind_proxy() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.1"));

        let info = extract_client_info(&headers, peer(), true);
        assert_eq!(info.ip.as_deref(), Some("203.0.113.7"));
    }

    #[test]
    fn test_real_ip_fallback_behind_proxy() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.1"));

        let info = extract_client_info(&headers, peer(), true);
        assert_eq!(info.ip.as_deref(), Some("198.51.100.1"));
    }

    #[test]
    fn test_user_agent_captured() {
        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, HeaderValue::from_static("Mozilla/5.0"));

        let info = extract_client_info(&headers, peer(), false);
        assert_eq!(info.user_agent.as_deref(), Some("Mozilla/5.0"));
    }

    #[test]
    fn test_unknown_client_key() {
        assert_eq!(ClientInfo::default().rate_limit_key(), "unknown");
        assert_eq!(
            ClientInfo::new(Some("10.1.1.1".into()), None).rate_limit_key(),
            "10.1.1.1"
        );
    }
}
