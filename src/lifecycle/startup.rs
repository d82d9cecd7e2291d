//! Startup orchestration.
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - The listener binds last (traffic only when ready)

use metrics_exporter_prometheus::BuildError;
use thiserror::Error;

use crate::config::Settings;
use crate::http::RelayServer;
use crate::lifecycle::Shutdown;
use crate::net::{Listener, ListenerError};
use crate::observability::metrics;

/// Errors that end the process before or while serving.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error("Failed to install metrics exporter: {0}")]
    Metrics(#[from] BuildError),

    #[error("Server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Bring up every subsystem for `settings` and serve until `shutdown` fires.
pub async fn start(settings: Settings, shutdown: &Shutdown) -> Result<(), StartupError> {
    tracing::info!(
        bind_address = %settings.bind_address,
        backend = %settings.backend,
        request_body = ?settings.request_body,
        max_connections = settings.max_connections,
        "Configuration loaded"
    );

    if let Some(addr) = settings.metrics_address {
        metrics::init_metrics(addr)?;
    }

    let server = RelayServer::new(&settings);
    let listener = Listener::bind(settings.bind_address, settings.max_connections).await?;

    server.run(listener, shutdown.subscribe()).await?;
    Ok(())
}
