//! API relay: the forwarding layer between a browser-facing application and
//! its backend API.
//!
//! - [`inbound`]: relays `/api/*` requests arriving at the application to the
//!   backend and streams the reply back.
//! - [`outbound`]: rewrites URLs of calls the application issues itself so
//!   they reach the backend from either execution context.

pub mod config;
pub mod http;
pub mod inbound;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod outbound;

pub use config::{RelayConfig, Settings};
pub use http::RelayServer;
pub use inbound::{InboundProxy, Relay, RelayError};
pub use lifecycle::Shutdown;
pub use outbound::{ExecutionContext, OutboundClient, OutboundRewriter};
