//! api-relay server binary.
//!
//! ```text
//!   Browser / SSR fetch                 api-relay                      Backend
//!   ───────────────────▶  /api/<rest>  ─────────────▶  API_URL/<rest>  ───────▶
//!                         anything else → static files / 404
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use api_relay::config::loader::load_config;
use api_relay::lifecycle::{self, signals, Shutdown};
use api_relay::observability::logging;

#[derive(Parser)]
#[command(name = "api-relay")]
#[command(about = "Relays /api/* to the backend and serves the application", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overrides `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<SocketAddr>,

    /// Backend base URL, overrides `API_URL` and `backend.address`.
    #[arg(long)]
    backend: Option<String>,

    /// Directory with the built frontend, overrides `app.static_dir`.
    #[arg(long)]
    static_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("api-relay: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind.to_string();
    }
    if let Some(backend) = cli.backend {
        config.backend.address = backend;
    }
    if let Some(dir) = cli.static_dir {
        config.app.static_dir = Some(dir);
    }

    if let Err(e) = logging::init_logging(&config.observability) {
        eprintln!("api-relay: failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    tracing::info!("api-relay v{} starting", env!("CARGO_PKG_VERSION"));

    let settings = match config.validate() {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let shutdown = Shutdown::new();
    signals::trigger_on_signal(shutdown.clone());

    if let Err(e) = lifecycle::start(settings, &shutdown).await {
        tracing::error!(error = %e, "Relay stopped with error");
        return ExitCode::FAILURE;
    }

    tracing::info!("Shutdown complete");
    ExitCode::SUCCESS
}
