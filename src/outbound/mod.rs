//! Outbound rewriting for calls the application issues itself.
//!
//! # Data Flow
//! ```text
//! application code: fetch(url, params)
//!     → OutboundRewriter (server or browser variant, picked at startup)
//!         url starts with the matched literal → prefix swapped
//!         otherwise                           → url untouched
//!     → OutboundClient issues exactly one call
//!     → response or failure returned as-is
//! ```
//!
//! # Design Decisions
//! - One trait, two implementations; no runtime type inspection
//! - Rewriting is synchronous string work done before dispatch
//! - Method, headers and body never pass through the rewriter

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::config::Settings;

pub mod client;
pub mod rewriter;

pub use client::{OutboundClient, OutboundError, OutboundRequest};
pub use rewriter::{BrowserRewriter, ServerRewriter};

/// Rewrites the URL of an outbound call for the current execution context.
pub trait OutboundRewriter: Send + Sync + fmt::Debug {
    /// Returns the URL to actually call. Non-matching URLs come back borrowed
    /// and unchanged.
    fn rewrite<'a>(&self, url: &'a str) -> Cow<'a, str>;
}

/// Where the application code is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionContext {
    /// Inside the server process (server-side rendering, data loading).
    Server,
    /// Inside a browser (the wasm32 build).
    Browser,
}

impl ExecutionContext {
    /// The context of the running binary.
    pub fn current() -> Self {
        if cfg!(target_arch = "wasm32") {
            Self::Browser
        } else {
            Self::Server
        }
    }

    /// Build the rewriter for this context.
    pub fn rewriter(self, settings: &Settings) -> Arc<dyn OutboundRewriter> {
        match self {
            Self::Server => Arc::new(ServerRewriter::new(
                settings.backend.clone(),
                settings.loopback_base.clone(),
            )),
            Self::Browser => Arc::new(BrowserRewriter::new(settings.public_api_base.clone())),
        }
    }
}

impl fmt::Display for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Server => f.write_str("server"),
            Self::Browser => f.write_str("browser"),
        }
    }
}

impl FromStr for ExecutionContext {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "server" => Ok(Self::Server),
            "browser" => Ok(Self::Browser),
            other => Err(format!("unknown execution context '{other}' (expected server or browser)")),
        }
    }
}
