//! # waygate-daemon
//!
//! Gateway daemon binary — wires the transport lifecycle, event dispatch,
//! ranking flusher, and HTTP server into one process.

#![deny(unsafe_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use waygate_core::errors::GatewayError;
use waygate_runtime::{
    ActivityHandler, ConnectionSupervisor, Dispatcher, DirtyTracker, Flusher, GatewayService,
    StopReason, spawn_flush_task,
};
use waygate_server::{AppState, ServerConfig, Shutdown, serve};
use waygate_settings::Settings;
use waygate_store::{CredentialStore, JsonRankingStore};
use waygate_transport::stub::StubTransport;

/// How long shutdown waits for tasks to drain.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Waygate gateway daemon.
#[derive(Parser, Debug)]
#[command(name = "waygate", about = "Messaging gateway daemon")]
struct Cli {
    /// Path to the settings file.
    #[arg(long, default_value = "waygate.json")]
    settings: PathBuf,

    /// Host to bind (overrides settings).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (overrides settings).
    #[arg(long)]
    port: Option<u16>,

    /// Root directory for session credentials and ranking state.
    #[arg(long)]
    data_dir: Option<String>,

    /// Directory served as static assets.
    #[arg(long)]
    static_dir: Option<String>,

    /// Seconds between ranking flush ticks.
    #[arg(long)]
    flush_interval_secs: Option<u64>,

    /// Phone number to print a pairing code for at startup.
    #[arg(long)]
    pair_number: Option<String>,
}

/// CLI flags win over the settings file and environment overrides.
fn apply_cli_overrides(settings: &mut Settings, args: &Cli) {
    if let Some(host) = &args.host {
        settings.server.host = host.clone();
    }
    if let Some(port) = args.port {
        settings.server.port = port;
    }
    if let Some(dir) = &args.data_dir {
        settings.gateway.data_dir = dir.clone();
    }
    if let Some(dir) = &args.static_dir {
        settings.server.static_dir = dir.clone();
    }
    if let Some(secs) = args.flush_interval_secs {
        settings.flush.interval_secs = secs;
    }
    if let Some(number) = &args.pair_number {
        settings.gateway.pair_number = Some(number.clone());
    }
}

/// Poll for a pairing code once a session handle exists, then log it.
///
/// The connection usually opens within a second or two of startup; give it
/// a minute before giving up.
async fn announce_pairing_code(
    gateway: Arc<dyn GatewayService>,
    number: String,
    cancel: CancellationToken,
) {
    for _ in 0..60 {
        match gateway.request_pairing_code(&number).await {
            Ok(code) => {
                info!(%code, "pairing code ready — enter it in the app");
                return;
            }
            Err(GatewayError::Unavailable(_)) => {
                tokio::select! {
                    () = tokio::time::sleep(Duration::from_secs(1)) => {}
                    () = cancel.cancelled() => return,
                }
            }
            Err(e) => {
                warn!(error = %e, "startup pairing request failed");
                return;
            }
        }
    }
    warn!("no connection after 60s, skipping startup pairing — use GET /code instead");
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut settings = waygate_settings::load_settings_from_path(&args.settings)
        .context("failed to load settings")?;
    apply_cli_overrides(&mut settings, &args);

    let data_dir = Path::new(&settings.gateway.data_dir);
    waygate_store::ensure_dirs(data_dir).context("failed to create data directory layout")?;

    let credentials = Arc::new(CredentialStore::new(data_dir));
    let ranking = Arc::new(JsonRankingStore::new(data_dir));

    // No real client library is linked yet, so the transport is the
    // in-process stub; everything above it (lifecycle, dispatch, flush,
    // HTTP) is the production wiring.
    let transport = Arc::new(StubTransport::always_open());
    info!("using in-process stub transport");

    let tracker = Arc::new(DirtyTracker::new());
    let activity = Arc::new(ActivityHandler::new(tracker.clone()));
    let dispatcher = Arc::new(Dispatcher::new(activity.clone(), activity));

    let supervisor = Arc::new(ConnectionSupervisor::new(
        transport,
        credentials.clone(),
        settings.retry.clone(),
    ));

    let shutdown = Shutdown::new();

    // Lifecycle loop. A terminal auth stop means reconnecting is pointless,
    // so it takes the whole process down with it.
    let lifecycle = {
        let run = supervisor.clone().spawn(dispatcher, shutdown.token());
        let cancel = shutdown.token();
        tokio::spawn(async move {
            match run.await {
                Ok(StopReason::Cancelled) => info!("lifecycle loop stopped"),
                Ok(StopReason::TerminalAuth(reason)) => {
                    error!(?reason, "credentials invalidated, shutting down — re-pair to recover");
                    cancel.cancel();
                }
                Err(e) => {
                    error!(error = %e, "lifecycle task failed");
                    cancel.cancel();
                }
            }
        })
    };

    let flusher = Arc::new(Flusher::new(tracker, ranking));
    let flush_task = spawn_flush_task(
        flusher,
        Duration::from_secs(settings.flush.interval_secs),
        shutdown.token(),
    );

    if let Some(number) = settings.gateway.pair_number.clone() {
        if credentials.load().is_some() {
            info!("existing session credentials found, skipping startup pairing");
        } else {
            let gateway: Arc<dyn GatewayService> = supervisor.clone();
            drop(tokio::spawn(announce_pairing_code(
                gateway,
                number,
                shutdown.token(),
            )));
        }
    }

    let config = ServerConfig {
        host: settings.server.host.clone(),
        port: settings.server.port,
        static_dir: PathBuf::from(&settings.server.static_dir),
    };
    let state = AppState::new(supervisor, config.static_dir.clone());
    let server_task = {
        let cancel = shutdown.token();
        tokio::spawn(async move {
            if let Err(e) = serve(&config, state, cancel.clone()).await {
                error!(error = %e, "http server failed");
                cancel.cancel();
            }
        })
    };

    info!(
        name = settings.gateway.name.as_str(),
        port = settings.server.port,
        flush_interval_secs = settings.flush.interval_secs,
        "gateway started"
    );

    let shutdown_token = shutdown.token();
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.context("failed to listen for ctrl-c")?;
            info!("shutdown signal received");
        }
        () = shutdown_token.cancelled() => {}
    }

    shutdown
        .drain(vec![lifecycle, flush_task, server_task], DRAIN_TIMEOUT)
        .await;
    info!("shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults() {
        let cli = Cli::parse_from(["waygate"]);
        assert_eq!(cli.settings, PathBuf::from("waygate.json"));
        assert_eq!(cli.host, None);
        assert_eq!(cli.port, None);
    }

    #[test]
    fn cli_custom_port() {
        let cli = Cli::parse_from(["waygate", "--port", "8080"]);
        assert_eq!(cli.port, Some(8080));
    }

    #[test]
    fn cli_overrides_win_over_settings() {
        let cli = Cli::parse_from([
            "waygate",
            "--host",
            "127.0.0.1",
            "--port",
            "3000",
            "--data-dir",
            "/var/lib/waygate",
            "--flush-interval-secs",
            "5",
        ]);
        let mut settings = Settings::default();
        apply_cli_overrides(&mut settings, &cli);

        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.server.port, 3000);
        assert_eq!(settings.gateway.data_dir, "/var/lib/waygate");
        assert_eq!(settings.flush.interval_secs, 5);
    }

    #[test]
    fn absent_flags_leave_settings_alone() {
        let cli = Cli::parse_from(["waygate"]);
        let mut settings = Settings::default();
        settings.server.port = 4242;
        apply_cli_overrides(&mut settings, &cli);
        assert_eq!(settings.server.port, 4242);
        assert_eq!(settings.server.host, "0.0.0.0");
    }

    #[test]
    fn pair_number_flag_lands_in_settings() {
        let cli = Cli::parse_from(["waygate", "--pair-number", "94771234567"]);
        let mut settings = Settings::default();
        apply_cli_overrides(&mut settings, &cli);
        assert_eq!(settings.gateway.pair_number.as_deref(), Some("94771234567"));
    }
}
