//! slash-infra web server.
//!
//! Receives Slack slash commands, verifies their signatures, acknowledges
//! them immediately and answers through the response URL once the lookup
//! has finished.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use slash_infra::search::{aws::ec2_clients, Ec2Resolver};
use slash_infra::{router, AppState, Config, SignatureVerifier};

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine; real deployments use the environment
    let dotenv = dotenvy::dotenv();

    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    if let Err(e) = dotenv {
        warn!(error = %e, "dotenv_not_loaded");
    }

    info!("web_server_starting");

    // Load configuration
    let config = Config::from_env();
    info!(
        port = config.port,
        signing_secret_configured = !config.slack_signing_secret.is_empty(),
        signature_max_age = config.slack_signature_max_age,
        pending_grace_ms = config.pending_grace_ms,
        aws_accounts = config.aws_accounts.len(),
        "config_loaded"
    );

    // One HTTP client for every callback delivery
    let http_client = reqwest::Client::builder()
        .timeout(config.http_timeout())
        .build()
        .context("Failed to create HTTP client")?;

    let verifier = SignatureVerifier::new(config.slack_signing_secret.clone())
        .with_max_age(config.signature_max_age());

    let resolver = Ec2Resolver::new(ec2_clients(&config.aws_accounts).await);
    info!(accounts = resolver.account_count(), "ec2_resolver_ready");

    let port = config.port;
    let state = AppState::new(config, http_client, verifier, Arc::new(resolver));
    let app = router(state);

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "web_server_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("web_server_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "ctrl_c_handler_failed");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "sigterm_handler_failed");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("web_server_shutting_down");
}
