//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.
//! Addresses are kept as raw strings here; `validation` turns them into
//! [`Settings`](crate::config::Settings).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::address::{ApiBase, BackendAddress};

/// Root configuration for the relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Listener configuration (bind address, connection limit).
    pub listener: ListenerConfig,

    /// Backend the inbound proxy forwards `/api/*` to.
    pub backend: BackendConfig,

    /// Outbound rewriter settings.
    pub outbound: OutboundConfig,

    /// Fallback resolution pipeline.
    pub app: AppConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            max_connections: 10_000,
        }
    }
}

/// How request bodies of non-GET/HEAD methods reach the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestBodyMode {
    /// Pass the body through as it arrives.
    #[default]
    Stream,
    /// Read the whole body before dispatching the backend call.
    Buffer,
}

/// Backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Backend base URL (e.g., "http://backend:8080").
    pub address: String,

    /// Request body strategy.
    pub request_body: RequestBodyMode,

    /// Upper bound for `request_body = "buffer"`.
    pub max_buffered_body_bytes: usize,

    /// TCP connect timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            address: BackendAddress::DEFAULT.to_string(),
            request_body: RequestBodyMode::Stream,
            max_buffered_body_bytes: 2 * 1024 * 1024, // 2MB
            connect_timeout_secs: 5,
        }
    }
}

/// Outbound rewriter configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutboundConfig {
    /// Advertised API base matched by the browser rewriter.
    pub public_api_base: String,

    /// Where the server rewriter sends API calls: this process's own `/api`.
    /// Unset means `http://localhost:<listener port>/api`.
    pub loopback_base: Option<String>,
}

impl OutboundConfig {
    /// Public API base baked in at compile time, if `PUBLIC_API_URL` was set.
    pub fn build_time_public_api_base() -> &'static str {
        match option_env!("PUBLIC_API_URL") {
            Some(value) if !value.is_empty() => value,
            _ => ApiBase::DEFAULT,
        }
    }
}

impl Default for OutboundConfig {
    fn default() -> Self {
        Self {
            public_api_base: Self::build_time_public_api_base().to_string(),
            loopback_base: None,
        }
    }
}

/// Fallback resolution pipeline configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory served for requests outside `/api/`. Unset means 404.
    pub static_dir: Option<PathBuf>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
