//! Inbound proxy subsystem.
//!
//! # Data Flow
//! ```text
//! Request arriving at the application's entry point
//!     → matcher.rs (does the path start with /api/?)
//!         no  → resolution pipeline (axum Router), untouched
//!         yes → proxy.rs
//!               → ForwardedRequest (target = backend + rest + query)
//!               → hyper client → backend
//!               → RelayedResponse (status, headers, streamed body)
//! ```
//!
//! # Design Decisions
//! - No retries, no fallback responses: a backend failure becomes a
//!   failure of the caller's connection
//! - Dropping the request future (caller went away) drops the backend call

pub mod matcher;
pub mod proxy;

pub use matcher::{PathPrefixMatcher, API_PREFIX};
pub use proxy::{InboundProxy, InboundProxyLayer, Relay, RelayError};
