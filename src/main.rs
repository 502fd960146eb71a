use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Level, info, warn};
use tracing_subscriber::fmt::format::FmtSpan;

use agri_market::{
    AppState, DatabasePool, MarketConfig, MarketStore, MemoryStore, SecurityMiddlewareConfig,
    SlidingWindowLimiter, TokenVerifier, api::create_router, config::sanitize_for_logging,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first - this validates all security requirements
    let config = MarketConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        eprintln!("Please check AGRI_* environment variables.");
        e
    })?;

    init_logging(&config)?;

    info!("Starting marketplace contact service");
    info!(
        "Contact gating: {} requests per {}s, minimum reputation {}",
        config.access.rate_limit_max_attempts,
        config.access.rate_limit_window_secs,
        config.access.min_trust_score
    );

    let store = open_store(&config).await?;

    let limiter = Arc::new(SlidingWindowLimiter::new(
        config.access.rate_limit_max_attempts,
        config.access.window(),
    ));
    spawn_limiter_cleanup(
        limiter.clone(),
        Duration::from_secs(config.access.cleanup_interval_secs),
    );

    let security_config = SecurityMiddlewareConfig {
        max_request_size: config.security.max_request_size,
        log_requests: config.logging.log_requests,
        sanitize_logs: config.logging.sanitize_logs,
    };
    let tokens = Arc::new(TokenVerifier::new(&config.security.jwt_secret));

    let state = AppState::new(
        store,
        limiter,
        config.access.to_policy(),
        tokens,
        security_config,
    );
    let app = create_router(state);

    let bind_addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", bind_addr, e))?;

    info!("Marketplace contact service listening on {}", bind_addr);
    info!(
        "Security middleware: Max body={}KB, Request logging={}",
        config.security.max_request_size / 1024,
        config.logging.log_requests
    );

    // Serve with connect info for client IP extraction
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// PostgreSQL when enabled, otherwise the in-memory store
async fn open_store(config: &MarketConfig) -> Result<Arc<dyn MarketStore>> {
    if !config.database.postgres_enabled {
        warn!("PostgreSQL disabled, using in-memory store (data is lost on restart)");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let url = &config.database.postgres_url;
    let shown = if config.logging.sanitize_logs {
        sanitize_for_logging(url)
    } else {
        url.clone()
    };
    info!("Connecting to PostgreSQL at {}", shown);

    let db = DatabasePool::new(url, config.database.max_connections)
        .await
        .map_err(|e| anyhow::anyhow!(e))?;
    db.init_schema().await.map_err(|e| anyhow::anyhow!(e))?;

    Ok(Arc::new(db))
}

/// Periodically drop idle rate-limit keys
fn spawn_limiter_cleanup(limiter: Arc<SlidingWindowLimiter>, every: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            let before = limiter.tracked_keys();
            limiter.cleanup();
            let after = limiter.tracked_keys();
            if after < before {
                info!(removed = before - after, remaining = after, "Rate limiter cleanup");
            }
        }
    });
}

fn init_logging(config: &MarketConfig) -> Result<()> {
    let log_level = match config.logging.level.to_lowercase().as_str() {
        "error" => Level::ERROR,
        "warn" => Level::WARN,
        "info" => Level::INFO,
        "debug" => Level::DEBUG,
        "trace" => Level::TRACE,
        _ => Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_span_events(if config.logging.log_requests {
            FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        })
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set logging subscriber: {}", e))?;

    if config.logging.sanitize_logs {
        info!("Logging initialized with client address sanitization");
    }

    Ok(())
}
