//! HTTP server initialization and runtime setup.
//!
//! Handles storage setup, migrations, the expired-mapping sweep and the Axum server
//! lifecycle.

use crate::application::services::{RateLimiter, ShortenSettings, StatsService};
use crate::config::{Config, StorageBackend};
use crate::domain::repositories::MappingRepository;
use crate::infrastructure::persistence::{MemoryMappingRepository, PgMappingRepository};
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use chrono::Utc;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

/// Creates a PostgreSQL pool from the configured pool settings.
pub async fn connect_pool(config: &Config) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    Ok(pool)
}

/// Builds the mapping repository selected by `STORAGE_BACKEND`.
///
/// For PostgreSQL this connects and applies pending migrations.
pub async fn build_repository(config: &Config) -> Result<Arc<dyn MappingRepository>> {
    match config.storage_backend {
        StorageBackend::Postgres => {
            let pool = connect_pool(config).await?;
            tracing::info!("Connected to database");

            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("Failed to run migrations")?;
            tracing::info!("Migrations applied");

            Ok(Arc::new(PgMappingRepository::new(Arc::new(pool))))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; mappings are lost on restart");
            Ok(Arc::new(MemoryMappingRepository::new()))
        }
    }
}

/// Periodically deletes expired mappings and forgets idle rate-limit clients.
async fn run_sweeper(
    stats_service: Arc<StatsService<dyn MappingRepository>>,
    rate_limiter: Arc<RateLimiter>,
    period: Duration,
) {
    let mut interval = tokio::time::interval(period);
    // The first tick completes immediately.
    interval.tick().await;

    loop {
        interval.tick().await;
        let now = Utc::now();

        if let Err(e) = stats_service.purge_expired(now).await {
            tracing::error!(error = %e, "Expired mapping sweep failed");
        }

        let pruned = rate_limiter.prune_idle(now);
        if pruned > 0 {
            tracing::debug!(pruned, "Pruned idle rate limit entries");
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - Mapping storage (PostgreSQL with migrations, or in-memory)
/// - Rate limiter and services
/// - Expired mapping sweep (when `SWEEP_INTERVAL_SECONDS` > 0)
/// - Axum HTTP server with graceful shutdown on Ctrl+C
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let repository = build_repository(&config).await?;

    let rate_limiter = Arc::new(RateLimiter::new(
        config.rate_limit_max_requests,
        chrono::Duration::seconds(config.rate_limit_window_seconds),
    ));

    let settings = ShortenSettings {
        base_url: config.base_url.clone(),
        code_length: config.code_length,
        max_attempts: config.code_max_attempts,
    };

    let state = AppState::new(
        repository,
        rate_limiter.clone(),
        settings,
        config.default_expiry_minutes,
        config.behind_proxy,
    );

    if config.is_sweep_enabled() {
        tokio::spawn(run_sweeper(
            state.stats_service.clone(),
            rate_limiter,
            Duration::from_secs(config.sweep_interval_seconds),
        ));
        tracing::info!("Expired mapping sweep started");
    }

    let app = app_router(state);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}
