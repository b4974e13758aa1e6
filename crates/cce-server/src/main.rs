//! `cc-executor` — binds the WebSocket/JSON-RPC surface and
//! serves it until a shutdown signal arrives.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

/// CC Executor: long-running WebSocket subprocess execution service.
#[derive(Debug, Parser)]
#[command(name = "cc-executor", version)]
struct Args {
    /// Path to the service configuration TOML document. Defaults to the
    /// platform config directory.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override `listen_address` from the config document/environment.
    #[arg(long)]
    listen_address: Option<String>,

    /// Directory for a rolling log file. If unset, logs go to stderr only.
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // `_guard` must stay alive for the life of the process or buffered
    // log lines are dropped on exit.
    let _guard = init_tracing(args.log_dir.as_deref())?;

    let mut config = match &args.config {
        Some(path) => cce_config::ServiceConfig::load(path).apply_env_overrides(),
        None => cce_config::ServiceConfig::load_default(),
    };
    if let Some(listen_address) = args.listen_address {
        config.listen_address = listen_address;
    }

    let listen_address = config.listen_address.clone();
    let timing_store = config.timing_store();
    let timing_oracle = cce_timing::TimingOracle::new(timing_store, config.to_timing_config());
    let state = cce_protocol::AppState::new(config.to_protocol_config(), timing_oracle);

    let listener = tokio::net::TcpListener::bind(&listen_address)
        .await
        .with_context(|| format!("failed to bind {listen_address}"))?;
    tracing::info!(%listen_address, "cc-executor listening");

    let app = cce_protocol::app::router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server loop exited with an error")?;

    tracing::info!("cc-executor shut down cleanly");
    Ok(())
}

fn init_tracing(log_dir: Option<&std::path::Path>) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    use tracing_subscriber::EnvFilter;

    let Some(log_dir) = log_dir else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(EnvFilter::from_default_env())
            .try_init()
            .ok();
        return Ok(None);
    };

    std::fs::create_dir_all(log_dir).with_context(|| format!("failed to create log dir {}", log_dir.display()))?;
    let file_name = format!("cc-executor-{}.log", chrono_like_timestamp());
    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(EnvFilter::from_default_env())
        .try_init()
        .ok();

    Ok(Some(guard))
}

/// Timestamp for the log file name without pulling in `chrono::Utc::now()`
/// at the call site elsewhere — kept local and minimal since this is the
/// only caller.
fn chrono_like_timestamp() -> String {
    chrono::Utc::now().format("%Y%m%d-%H%M%S").to_string()
}

/// Graceful shutdown on SIGINT/SIGTERM, mirroring the signal-based
/// shutdown idiom axum's own examples use.
async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received SIGINT, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
