use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::api;
use crate::cli::commands::ServeArgs;
use crate::config::ScannerConfig;
use crate::errors::ClawscanError;

pub async fn handle_serve(args: ServeArgs, mut config: ScannerConfig) -> Result<(), ClawscanError> {
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    let addr = format!("{}:{}", config.host, config.port);
    info!(
        addr = %addr,
        network = %config.network,
        payments = if config.deep_scan_requires_payment() { "x402" } else { "demo mode" },
        deep_scan_price = %config.deep_scan_price,
        "Starting API server"
    );

    std::fs::create_dir_all(&config.upload_dir)?;
    let state = api::AppState::new(config)?;
    let app = api::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    let shutdown = CancellationToken::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown requested");
            trigger.cancel();
        }
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(|e| ClawscanError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}
