//! The backend reply on its way back to the caller.
//!
//! # Design Decisions
//! - Status and headers are passed through as received, not filtered
//! - The body stays a stream; nothing is buffered here
//! - Framing (chunked vs. content-length, connection headers) is left to hyper

use axum::body::Body;
use axum::http::{HeaderMap, Response, StatusCode};
use hyper::body::Incoming;

/// A backend response being relayed to the original caller.
#[derive(Debug)]
pub struct RelayedResponse {
    inner: Response<Incoming>,
}

impl RelayedResponse {
    /// Wrap a backend reply.
    pub fn new(inner: Response<Incoming>) -> Self {
        Self { inner }
    }

    /// Backend status code.
    pub fn status(&self) -> StatusCode {
        self.inner.status()
    }

    /// Backend headers.
    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    /// Convert into a response the server can write, keeping the body streaming.
    pub fn into_response(self) -> Response<Body> {
        let (parts, body) = self.inner.into_parts();
        Response::from_parts(parts, Body::new(body))
    }
}

impl From<Response<Incoming>> for RelayedResponse {
    fn from(inner: Response<Incoming>) -> Self {
        Self::new(inner)
    }
}
