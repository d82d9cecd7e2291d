//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::RelayConfig;
use crate::config::validation::{validate_config, ValidationError};
use crate::config::Settings;

/// Backend base URL for the inbound proxy and the server rewriter.
pub const API_URL_VAR: &str = "API_URL";

/// Public API base matched by the browser rewriter.
pub const PUBLIC_API_URL_VAR: &str = "PUBLIC_API_URL";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Read a TOML file into an unvalidated configuration.
pub fn read_config(path: &Path) -> Result<RelayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Apply environment overrides. Empty variables count as unset.
pub fn apply_env_overrides<F>(config: &mut RelayConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(value) = non_empty(API_URL_VAR) {
        config.backend.address = value;
    }
    if let Some(value) = non_empty(PUBLIC_API_URL_VAR) {
        config.outbound.public_api_base = value;
    }
}

/// Load configuration from an optional file plus the process environment.
///
/// The result is not validated yet; see [`RelayConfig::validate`].
pub fn load_config(path: Option<&Path>) -> Result<RelayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_config(path)?,
        None => RelayConfig::default(),
    };
    apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    Ok(config)
}

impl RelayConfig {
    /// Validate and resolve into runtime [`Settings`].
    pub fn validate(&self) -> Result<Settings, ConfigError> {
        validate_config(self).map_err(ConfigError::Validation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn env_overrides_replace_backend_and_public_base() {
        let env: HashMap<&str, &str> = [
            ("API_URL", "http://backend:8080"),
            ("PUBLIC_API_URL", "https://public.example/api"),
        ]
        .into_iter()
        .collect();

        let mut config = RelayConfig::default();
        apply_env_overrides(&mut config, |name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.backend.address, "http://backend:8080");
        assert_eq!(config.outbound.public_api_base, "https://public.example/api");
    }

    #[test]
    fn empty_env_values_fall_back() {
        let mut config = RelayConfig::default();
        apply_env_overrides(&mut config, |_| Some(String::new()));
        assert_eq!(config.backend.address, "http://192.168.1.162:8080");
    }

    #[test]
    fn reads_file_from_disk() {
        let path = std::env::temp_dir().join(format!("api-relay-config-{}.toml", std::process::id()));
        fs::write(
            &path,
            "[listener]\nbind_address = \"127.0.0.1:4000\"\n[backend]\naddress = \"http://10.0.0.5:8080/\"\n",
        )
        .unwrap();

        let config = read_config(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(config.listener.bind_address, "127.0.0.1:4000");
        let settings = config.validate().unwrap();
        assert_eq!(settings.backend.as_str(), "http://10.0.0.5:8080");
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let path = std::env::temp_dir().join(format!("api-relay-bad-{}.toml", std::process::id()));
        fs::write(&path, "[listener\n").unwrap();
        let err = read_config(&path).unwrap_err();
        fs::remove_file(&path).ok();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn validation_errors_are_joined() {
        let err = ConfigError::Validation(vec![
            ValidationError { field: "a", message: "x".into() },
            ValidationError { field: "b", message: "y".into() },
        ]);
        assert_eq!(err.to_string(), "Validation failed: a: x, b: y");
    }
}
