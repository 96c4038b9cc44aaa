use std::{net::SocketAddr, time::Duration};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use coachline::api::middleware::session::AppState;
use coachline::config::Config;
use coachline::db;
use coachline::jobs::session_cleanup;
use coachline::services::{mailer::Mailer, paystack::PaystackClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coachline=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Coachline server...");

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded successfully");

    // Create database pool
    let pool = db::create_pool(&config.database_url).await?;
    tracing::info!("Database pool created");

    // Run migrations
    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    let gateway = PaystackClient::new(
        &config.paystack_base_url,
        config.paystack_secret_key.clone(),
        Duration::from_secs(config.gateway_timeout_secs),
    )?;
    let mailer = Mailer::from_config(&config)?;

    // Kept alive for the lifetime of the server
    let _scheduler = session_cleanup::start(pool.clone(), &config.session_cleanup_cron).await?;

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    // Build application state
    let state = AppState {
        pool,
        config,
        gateway,
        mailer,
    };

    let app = coachline::api::app(state);

    tracing::info!("Listening on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install CTRL+C signal handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, cleaning up...");
}
