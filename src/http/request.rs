//! The read-once envelope handed from the inbound side to the backend client.
//!
//! # Responsibilities
//! - Take ownership of the inbound request (method, headers, body)
//! - Decide whether the method carries a body (everything but GET/HEAD)
//! - Produce the backend request for the configured body strategy
//!
//! # Design Decisions
//! - The inbound request is consumed by value, so its body is read at most once
//! - GET/HEAD bodies are dropped unread; their framing headers go with them
//! - Headers are copied as received, duplicates and order included

use axum::body::Body;
use axum::http::header::{CONTENT_LENGTH, TRANSFER_ENCODING};
use axum::http::{HeaderMap, Method, Request, Uri};

use crate::config::RequestBodyMode;
use crate::inbound::RelayError;

/// True for every method except the two canonical no-body methods.
pub fn carries_body(method: &Method) -> bool {
    method != Method::GET && method != Method::HEAD
}

/// An inbound request addressed to the backend.
#[derive(Debug)]
pub struct ForwardedRequest {
    method: Method,
    headers: HeaderMap,
    target: Uri,
    body: Option<Body>,
}

impl ForwardedRequest {
    /// Consume an inbound request and point it at `target`.
    pub fn from_inbound(request: Request<Body>, target: &str) -> Result<Self, RelayError> {
        let target: Uri = target.parse().map_err(|source| RelayError::InvalidTarget {
            target: target.to_string(),
            source,
        })?;

        let (parts, body) = request.into_parts();
        let body = carries_body(&parts.method).then_some(body);

        Ok(Self {
            method: parts.method,
            headers: parts.headers,
            target,
            body,
        })
    }

    /// The inbound method, forwarded as is.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The inbound headers, forwarded as is.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Backend URI the request goes to.
    pub fn target(&self) -> &Uri {
        &self.target
    }

    /// False for GET and HEAD, whose bodies are dropped.
    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    /// Build the backend request.
    ///
    /// With [`RequestBodyMode::Buffer`] the whole body is collected first (up
    /// to `limit` bytes) and the call is not dispatched until it is complete.
    pub async fn into_backend_request(
        self,
        mode: RequestBodyMode,
        limit: usize,
    ) -> Result<Request<Body>, RelayError> {
        let mut headers = self.headers;

        let body = match (self.body, mode) {
            (None, _) => {
                headers.remove(CONTENT_LENGTH);
                headers.remove(TRANSFER_ENCODING);
                Body::empty()
            }
            (Some(body), RequestBodyMode::Stream) => body,
            (Some(body), RequestBodyMode::Buffer) => {
                let bytes = axum::body::to_bytes(body, limit)
                    .await
                    .map_err(RelayError::RequestBody)?;
                Body::from(bytes)
            }
        };

        let mut request = Request::builder()
            .method(self.method)
            .uri(self.target)
            .body(body)?;
        *request.headers_mut() = headers;
        Ok(request)
    }
}
