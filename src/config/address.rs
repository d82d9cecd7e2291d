//! Validated base addresses shared by the inbound proxy and the outbound rewriters.
//!
//! # Design Decisions
//! - Parsed once at startup; invalid values never reach the request path
//! - Trailing slashes are trimmed so `base + "/rest"` never yields `//rest`
//! - The original literal is kept for prefix matching, not a re-serialized `Url`

use std::fmt;

use thiserror::Error;
use url::Url;

/// Reasons a configured address is rejected.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("address is empty")]
    Empty,

    #[error("'{value}' is not an absolute URL: {reason}")]
    NotAbsolute { value: String, reason: String },

    #[error("'{value}' uses scheme '{scheme}', expected http")]
    UnsupportedScheme { value: String, scheme: String },

    #[error("'{0}' must not carry a query string or fragment")]
    HasQueryOrFragment(String),

    #[error("'{0}' must be an absolute URL or a path starting with '/'")]
    NotAPath(String),

    #[error("'{value}' is not a valid request URI: {reason}")]
    InvalidUri { value: String, reason: String },
}

/// Base URL of the backend service the inbound proxy forwards to.
///
/// Always an absolute `http` URL without query or fragment. It may carry a
/// path (`http://backend:8080/v1`), which is kept in front of the forwarded
/// path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendAddress {
    literal: String,
}

impl BackendAddress {
    /// Fallback used when `API_URL` is not set.
    pub const DEFAULT: &'static str = "http://192.168.1.162:8080";

    /// Accept an absolute `http` URL without query or fragment.
    pub fn parse(value: &str) -> Result<Self, AddressError> {
        let literal = trim_base(value)?;
        let url = Url::parse(&literal).map_err(|e| AddressError::NotAbsolute {
            value: value.to_string(),
            reason: e.to_string(),
        })?;

        if url.scheme() != "http" {
            return Err(AddressError::UnsupportedScheme {
                value: value.to_string(),
                scheme: url.scheme().to_string(),
            });
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err(AddressError::HasQueryOrFragment(value.to_string()));
        }
        // Targets are sent as `http::Uri`, which is stricter than `Url`.
        literal
            .parse::<axum::http::Uri>()
            .map_err(|e| AddressError::InvalidUri {
                value: value.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self { literal })
    }

    /// The configured base, without a trailing slash.
    pub fn as_str(&self) -> &str {
        &self.literal
    }

    /// Build the backend URL for a path that already had the API prefix removed.
    ///
    /// `rest` is either empty or starts with `/`. An empty `query` is dropped so
    /// that `/api/x?` and `/api/x` forward to the same target.
    pub fn target(&self, rest: &str, query: Option<&str>) -> String {
        let mut target = String::with_capacity(self.literal.len() + rest.len() + 16);
        target.push_str(&self.literal);
        target.push_str(rest);
        if let Some(q) = query.filter(|q| !q.is_empty()) {
            target.push('?');
            target.push_str(q);
        }
        target
    }
}

impl Default for BackendAddress {
    fn default() -> Self {
        Self {
            literal: Self::DEFAULT.to_string(),
        }
    }
}

impl fmt::Display for BackendAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.literal)
    }
}

/// An advertised API base: either an absolute URL or a same-origin path.
///
/// Used as the literal that outbound URLs are compared against, and as the
/// replacement they are rewritten to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiBase {
    literal: String,
}

impl ApiBase {
    /// Fallback used when `PUBLIC_API_URL` is not set.
    pub const DEFAULT: &'static str = "/api";

    /// Accept an absolute URL or a path starting with `/`.
    pub fn parse(value: &str) -> Result<Self, AddressError> {
        let literal = trim_base(value)?;
        if literal.starts_with('/') {
            if literal.contains(['?', '#']) {
                return Err(AddressError::HasQueryOrFragment(value.to_string()));
            }
            return Ok(Self { literal });
        }

        let url = Url::parse(&literal).map_err(|_| AddressError::NotAPath(value.to_string()))?;
        if url.query().is_some() || url.fragment().is_some() {
            return Err(AddressError::HasQueryOrFragment(value.to_string()));
        }
        Ok(Self { literal })
    }

    /// The configured base, without a trailing slash.
    pub fn as_str(&self) -> &str {
        &self.literal
    }

    /// True when the base is a same-origin path such as `/api`.
    pub fn is_relative(&self) -> bool {
        self.literal.starts_with('/')
    }
}

impl Default for ApiBase {
    fn default() -> Self {
        Self {
            literal: Self::DEFAULT.to_string(),
        }
    }
}

impl fmt::Display for ApiBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.literal)
    }
}

fn trim_base(value: &str) -> Result<String, AddressError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AddressError::Empty);
    }
    // "/" alone stays as-is; it is a valid same-origin root.
    let without_slash = trimmed.trim_end_matches('/');
    if without_slash.is_empty() {
        return Ok("/".to_string());
    }
    Ok(without_slash.to_string())
}
