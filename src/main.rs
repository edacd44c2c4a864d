//! VRChat age-verification relay.
//!
//! ```text
//!   in-game caller ──▶ admission ──▶ handlers ──▶ resolver ──▶ cooldown gate
//!                                                    │
//!                                                    ▼
//!                                      session manager ──▶ VRChat API
//! ```
//!
//! The listener comes up first; the VRChat login runs in the background and
//! `/health` reports 503 until it succeeds.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use vrc_age_relay::config::{load_config_or_default, Credentials};
use vrc_age_relay::lifecycle::Shutdown;
use vrc_age_relay::observability::{logging, metrics};
use vrc_age_relay::session::{SessionManager, SessionStore};
use vrc_age_relay::{RelayServer, VrchatClient};

#[derive(Parser)]
#[command(name = "vrc-age-relay", version, about = "VRChat age-verification relay")]
struct Args {
    /// Path to the TOML configuration file (defaults apply when absent)
    #[arg(short, long, env = "RELAY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env is normal in production
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let config = load_config_or_default(args.config.as_deref())?;
    logging::init_logging(&config.observability);
    install_panic_hook();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "vrc-age-relay starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        tls = config.listener.tls.is_some(),
        cooldown_ms = config.cooldown.interval_ms,
        upstream_timeout_secs = config.timeouts.upstream_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let client = VrchatClient::new(&config.upstream, &config.timeouts)?;
    let credentials = Credentials::from_env();
    if let Err(missing) = &credentials {
        tracing::warn!(variable = missing, "VRChat credentials incomplete");
    }
    let store = config.session.persist_path.as_ref().map(SessionStore::new);
    let session = Arc::new(SessionManager::new(Arc::new(client), credentials, store));

    let shutdown = Shutdown::new();
    shutdown.spawn_signal_listener();

    let server = RelayServer::new(config.clone(), session.clone())?;
    let server_task = if config.listener.tls.is_some() {
        let addr: SocketAddr = config.listener.bind_address.parse()?;
        tokio::spawn(server.run_tls(addr, shutdown.subscribe()))
    } else {
        let listener = TcpListener::bind(&config.listener.bind_address).await?;
        tracing::info!(address = %listener.local_addr()?, "Listening for connections");
        tokio::spawn(server.run(listener, shutdown.subscribe()))
    };

    // Failure is recorded on the session and surfaced through /health
    tokio::spawn(async move {
        if session.initialize().await.is_err() {
            tracing::warn!("Relay is serving but not ready; /health reports the login failure");
        }
    });

    server_task.await??;
    tracing::info!("Shutdown complete");
    Ok(())
}

/// Panics anywhere are fatal: log them through tracing, then exit non-zero.
fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_else(|| "unknown".to_string());
        let payload = info
            .payload()
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());

        tracing::error!(location = %location, panic = %payload, "Fatal panic, exiting");
        std::process::exit(1);
    }));
}
