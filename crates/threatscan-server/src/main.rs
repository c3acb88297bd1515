//! ThreatScan Server
//!
//! Serves ranked threat predictions (phishing, scam, safe, ...) for pasted
//! email and message text.

use anyhow::Result;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};

use threatscan_classifiers::InferenceService;
use threatscan_server::cli::Cli;
use threatscan_server::{create_router, AppState, ServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    info!("Starting ThreatScan server");

    let config = ServerConfig::load(&cli.config, &cli)?;
    info!("Model directory: {}", config.model.model_dir.display());
    info!("Backend: {:?}, device: {:?}", config.model.backend, config.model.device);

    let metrics_handle = init_metrics()?;

    // Load the model before accepting traffic; a missing model is fatal.
    let service = Arc::new(InferenceService::new(config.model.clone()));
    let bundle = {
        let service = Arc::clone(&service);
        tokio::task::spawn_blocking(move || service.load_model()).await??
    };
    info!(
        "Model ready with {} classes on {:?}",
        bundle.classifier().num_labels(),
        bundle.device()
    );

    let state = AppState::new(service, Some(metrics_handle));
    let app = create_router(state);

    let addr = config.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);

    let shutdown = async {
        shutdown_signal().await;
        warn!("Shutdown signal received, stopping server...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Listen for shutdown signals (SIGTERM, SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("threatscan=debug,tower_http=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("threatscan=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Initialize metrics exporter and return handle for rendering
fn init_metrics() -> Result<PrometheusHandle> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics: {}", e))?;

    metrics::describe_counter!(
        "threatscan_requests_total",
        "Total number of analyze requests"
    );
    metrics::describe_counter!("threatscan_errors_total", "Total number of errors by type");
    metrics::describe_histogram!(
        "threatscan_inference_latency_us",
        metrics::Unit::Microseconds,
        "End-to-end predict latency in microseconds"
    );

    info!("Metrics exporter initialized");
    Ok(handle)
}
