//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Parse address strings into their typed forms
//! - Validate value ranges (limits > 0, socket addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RelayConfig → Result<Settings, Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use crate::config::address::{AddressError, ApiBase, BackendAddress};
use crate::config::schema::RelayConfig;
use crate::config::Settings;

/// A single problem found in a configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }

    fn address(field: &'static str, err: AddressError) -> Self {
        Self::new(field, err.to_string())
    }
}

/// Loopback API base for a relay listening on `bind_address`.
pub fn loopback_for(bind_address: SocketAddr) -> ApiBase {
    let host = if bind_address.ip().is_unspecified() {
        "localhost".to_string()
    } else {
        match bind_address {
            SocketAddr::V4(v4) => v4.ip().to_string(),
            SocketAddr::V6(v6) => format!("[{}]", v6.ip()),
        }
    };
    ApiBase::parse(&format!("http://{host}:{}/api", bind_address.port())).unwrap_or_default()
}

/// Validate a configuration and resolve it into immutable [`Settings`].
pub fn validate_config(config: &RelayConfig) -> Result<Settings, Vec<ValidationError>> {
    let mut errors = Vec::new();

    let bind_address = config
        .listener
        .bind_address
        .parse::<SocketAddr>()
        .map_err(|e| errors.push(ValidationError::new("listener.bind_address", e.to_string())))
        .ok();

    if config.listener.max_connections == 0 {
        errors.push(ValidationError::new("listener.max_connections", "must be greater than zero"));
    }

    let backend = BackendAddress::parse(&config.backend.address)
        .map_err(|e| errors.push(ValidationError::address("backend.address", e)))
        .ok();

    if config.backend.max_buffered_body_bytes == 0 {
        errors.push(ValidationError::new(
            "backend.max_buffered_body_bytes",
            "must be greater than zero",
        ));
    }
    if config.backend.connect_timeout_secs == 0 {
        errors.push(ValidationError::new("backend.connect_timeout_secs", "must be greater than zero"));
    }

    let public_api_base = ApiBase::parse(&config.outbound.public_api_base)
        .map_err(|e| errors.push(ValidationError::address("outbound.public_api_base", e)))
        .ok();

    let loopback_base = match &config.outbound.loopback_base {
        Some(literal) => match ApiBase::parse(literal) {
            Ok(base) if base.is_relative() => {
                errors.push(ValidationError::new(
                    "outbound.loopback_base",
                    "must be an absolute URL reachable from this process",
                ));
                None
            }
            Ok(base) => Some(base),
            Err(e) => {
                errors.push(ValidationError::address("outbound.loopback_base", e));
                None
            }
        },
        None => bind_address.map(loopback_for),
    };

    if let Some(dir) = &config.app.static_dir {
        if !dir.is_dir() {
            errors.push(ValidationError::new(
                "app.static_dir",
                format!("'{}' is not a directory", dir.display()),
            ));
        }
    }

    let metrics_address = if config.observability.metrics_enabled {
        config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .map_err(|e| errors.push(ValidationError::new("observability.metrics_address", e.to_string())))
            .ok()
    } else {
        None
    };

    match (bind_address, backend, public_api_base, loopback_base) {
        (Some(bind_address), Some(backend), Some(public_api_base), Some(loopback_base))
            if errors.is_empty() =>
        {
            Ok(Settings {
                bind_address,
                max_connections: config.listener.max_connections,
                backend,
                request_body: config.backend.request_body,
                max_buffered_body_bytes: config.backend.max_buffered_body_bytes,
                connect_timeout: Duration::from_secs(config.backend.connect_timeout_secs),
                public_api_base,
                loopback_base,
                static_dir: config.app.static_dir.clone(),
                metrics_address,
            })
        }
        _ => Err(errors),
    }
}
