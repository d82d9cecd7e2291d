//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (hyper-util auto connection, HTTP/1.1 or HTTP/2)
//!     → inbound proxy (/api/* only)
//!         → request.rs (ForwardedRequest, read-once body)
//!         → backend
//!         → response.rs (RelayedResponse, streamed body)
//!     → pipeline.rs (everything else)
//!     → Send to client
//! ```

pub mod pipeline;
pub mod request;
pub mod response;
pub mod server;

pub use request::ForwardedRequest;
pub use response::RelayedResponse;
pub use server::RelayServer;
