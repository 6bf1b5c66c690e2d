//! ToFit Engine
//!
//! Recommendation scoring and services catalog API for the ToFit marketplace.
//!
//! # Architecture
//!
//! - **Marketplace source**: PostgreSQL-backed reads of bookings, listings and favourites
//! - **Catalog pipeline**: join, filter and sort listings for browsing
//! - **Recommendation engine**: personalised top-N ranking from booking history
//! - **API Server**: REST endpoints for the mobile and web clients
//!
//! # Graceful Shutdown
//!
//! The engine handles SIGTERM and SIGINT signals, ensuring:
//! - In-flight requests complete
//! - Database connections are closed cleanly

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tofit::api::{self, AppState};
use tofit::config::{Config, LogFormat};
use tofit::database::{self, Database};
use tofit::marketplace::PgMarketplace;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first so the log format is known
    let config = Config::from_env();
    let format = config
        .as_ref()
        .map(|c| c.logging.format)
        .unwrap_or(LogFormat::Compact);

    // Initialize tracing with structured logging
    init_tracing(format);
    let config = Arc::new(config.context("failed to load configuration")?);

    info!("═══════════════════════════════════════════════════════════════");
    info!("  🚀 ToFit Engine v{}", env!("CARGO_PKG_VERSION"));
    info!("═══════════════════════════════════════════════════════════════");
    config.log_summary();
    info!("✅ Configuration loaded and validated");

    // Initialize database connection pool
    let db = Database::new(&config.database)
        .await
        .context("failed to open database pool")?;
    info!("✅ Database connection pool established");

    // Run migrations
    info!("📦 Running database migrations...");
    database::run_migrations(db.pool())
        .await
        .context("failed to apply migrations")?;
    info!("✅ Database migrations applied");

    let source = Arc::new(PgMarketplace::new(db.pool().clone()));
    let state = Arc::new(AppState::new(source, &config.recommendation));

    info!("  📡 API: http://{}:{}", config.api.host, config.api.port);
    info!(
        "  🔗 Health: http://{}:{}/health",
        config.api.host, config.api.port
    );

    let server = tokio::spawn({
        let config = config.clone();
        async move { api::start_server(state, &config.api, shutdown_signal()).await }
    });

    match server.await {
        Ok(Ok(())) => info!("📴 API server stopped"),
        Ok(Err(e)) => error!("API server error: {:?}", e),
        Err(e) => error!("API server task failed: {:?}", e),
    }

    // Cleanup resources
    if tokio::time::timeout(Duration::from_secs(10), db.close())
        .await
        .is_err()
    {
        warn!("⚠️ Database close timed out, forcing exit");
    }

    info!("👋 ToFit Engine stopped gracefully");
    Ok(())
}

/// Initialize structured logging with tracing
fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        // Default log levels
        EnvFilter::new("tofit_engine=debug,tofit=debug,tower_http=debug,sqlx=warn,info")
    });

    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(true))
            .init(),
        LogFormat::Compact => registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false)
                    .with_ansi(std::env::var("NO_COLOR").is_err()),
            )
            .init(),
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("📴 Shutdown signal received");
}
