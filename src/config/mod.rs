//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, apply API_URL / PUBLIC_API_URL)
//!     → validation.rs (semantic checks, typed addresses)
//!     → Settings (validated, immutable)
//!     → shared via Arc to the inbound proxy and the outbound rewriters
//! ```
//!
//! # Design Decisions
//! - Settings are read once at startup and never reloaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub mod address;
pub mod loader;
pub mod schema;
pub mod validation;

pub use address::{AddressError, ApiBase, BackendAddress};
pub use loader::{load_config, ConfigError};
pub use schema::{
    AppConfig, BackendConfig, ListenerConfig, LogFormat, ObservabilityConfig, OutboundConfig,
    RelayConfig, RequestBodyMode,
};
pub use validation::{validate_config, ValidationError};

/// Validated runtime settings, built once by [`validate_config`].
#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_address: SocketAddr,
    pub max_connections: usize,
    pub backend: BackendAddress,
    pub request_body: RequestBodyMode,
    pub max_buffered_body_bytes: usize,
    pub connect_timeout: Duration,
    pub public_api_base: ApiBase,
    pub loopback_base: ApiBase,
    pub static_dir: Option<PathBuf>,
    /// Set only when metrics are enabled.
    pub metrics_address: Option<SocketAddr>,
}

impl Settings {
    /// Settings for a relay on `bind_address` forwarding to `backend`, with
    /// every other value at its default.
    pub fn new(bind_address: SocketAddr, backend: BackendAddress) -> Self {
        let defaults = RelayConfig::default();
        Self {
            bind_address,
            max_connections: defaults.listener.max_connections,
            backend,
            request_body: defaults.backend.request_body,
            max_buffered_body_bytes: defaults.backend.max_buffered_body_bytes,
            connect_timeout: Duration::from_secs(defaults.backend.connect_timeout_secs),
            public_api_base: ApiBase::parse(OutboundConfig::build_time_public_api_base())
                .unwrap_or_default(),
            loopback_base: validation::loopback_for(bind_address),
            static_dir: None,
            metrics_address: None,
        }
    }
}
