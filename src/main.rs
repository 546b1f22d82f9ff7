//! Process entry point: parse CLI flags, load the sprinkler config, wire up
//! the scheduling core and serve the HTTP API until a shutdown signal
//! arrives, at which point every active sprinkler is turned off before exit.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use sprinkler_daemon::config::{load_sprinklers, CliArgs};
use sprinkler_daemon::{api, build_scheduler, default_runtime_windows, AppConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))).init();

    let args = CliArgs::parse();
    let drivers = load_sprinklers(&args.config_file)?;
    tracing::info!(count = drivers.len(), config_file = %args.config_file.display(), "loaded sprinkler registrations");

    let config = AppConfig { max_active: args.max_active, max_low_priority: args.max_low_priority };
    let handle = build_scheduler(drivers, config, default_runtime_windows());

    let router = api::build_router(handle.clone());
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", args.port)).await?;
    tracing::info!(port = args.port, "sprinklerd listening");

    axum::serve(listener, router).with_graceful_shutdown(shutdown_signal()).await?;

    tracing::info!("shutting down, turning off every active sprinkler");
    handle.shutdown().await;
    Ok(())
}

/// Resolves once `SIGINT` or (on unix) `SIGTERM` is received, so the
/// scheduler gets a chance to turn off every active sprinkler before exit.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
