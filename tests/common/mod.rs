#![allow(dead_code)]

use axum::extract::ConnectInfo;
use axum_test::TestServer;
use chrono::{Duration, Utc};
use quicklink::application::services::{RateLimiter, ShortenSettings};
use quicklink::domain::entities::{Mapping, NewMapping};
use quicklink::domain::repositories::MappingRepository;
use quicklink::infrastructure::persistence::MemoryMappingRepository;
use quicklink::routes::api_router;
use quicklink::state::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::Layer;

pub const BASE_URL: &str = "http://sho.rt";
pub const DEFAULT_EXPIRY_MINUTES: i64 = 1440;

/// Injects a fixed peer address, standing in for `into_make_service_with_connect_info`.
#[derive(Clone)]
pub struct MockConnectInfoLayer {
    addr: SocketAddr,
}

impl MockConnectInfoLayer {
    pub fn new(addr: SocketAddr) -> Self {
        Self { addr }
    }
}

impl Default for MockConnectInfoLayer {
    fn default() -> Self {
        Self::new("127.0.0.1:12345".parse().unwrap())
    }
}

impl<S> Layer<S> for MockConnectInfoLayer {
    type Service = MockConnectInfoService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MockConnectInfoService {
            inner,
            addr: self.addr,
        }
    }
}

#[derive(Clone)]
pub struct MockConnectInfoService<S> {
    inner: S,
    addr: SocketAddr,
}

impl<S, B> tower::Service<axum::http::Request<B>> for MockConnectInfoService<S>
where
    S: tower::Service<axum::http::Request<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        req.extensions_mut().insert(ConnectInfo(self.addr));
        self.inner.call(req)
    }
}

/// Options for building a test application.
pub struct TestApp {
    pub rate_limit: usize,
    pub behind_proxy: bool,
}

impl Default for TestApp {
    fn default() -> Self {
        Self {
            rate_limit: 1000,
            behind_proxy: false,
        }
    }
}

impl TestApp {
    /// Builds state over a fresh in-memory store, returning the store for seeding.
    pub fn state(&self) -> (AppState, Arc<MemoryMappingRepository>) {
        let repo = Arc::new(MemoryMappingRepository::new());
        let rate_limiter = Arc::new(RateLimiter::new(self.rate_limit, Duration::seconds(60)));
        let settings = ShortenSettings {
            base_url: BASE_URL.to_string(),
            ..ShortenSettings::default()
        };

        let state = AppState::new(
            repo.clone(),
            rate_limiter,
            settings,
            DEFAULT_EXPIRY_MINUTES,
            self.behind_proxy,
        );

        (state, repo)
    }

    /// Builds a test server over the full router.
    pub fn server(&self) -> (TestServer, Arc<MemoryMappingRepository>) {
        let (state, repo) = self.state();
        let app = api_router(state).layer(MockConnectInfoLayer::default());

        (TestServer::new(app).unwrap(), repo)
    }
}

/// Inserts a mapping directly, bypassing validation and rate limiting.
pub async fn seed_mapping(
    repo: &MemoryMappingRepository,
    code: &str,
    url: &str,
    expires_in: Option<Duration>,
) -> Mapping {
    let now = Utc::now();
    repo.create(NewMapping {
        original_url: url.to_string(),
        short_code: code.to_string(),
        created_at: now - Duration::days(2),
        expires_at: expires_in.map(|d| now + d),
        created_ip: None,
        user_agent: None,
    })
    .await
    .unwrap()
}
