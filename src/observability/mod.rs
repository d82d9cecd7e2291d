//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Relay, server loop and CLI produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured fields on every event (method, path, status, target)
//! - Metrics are cheap; with no recorder installed they are no-ops

pub mod logging;
pub mod metrics;
