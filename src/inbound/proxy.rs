//! Relay of `/api/*` requests to the backend.
//!
//! # Responsibilities
//! - Compute the backend target for matching requests
//! - Forward method, headers and body through a pooled hyper client
//! - Stream the backend response back unchanged
//! - Hand every other request to the wrapped resolution pipeline

use std::convert::Infallible;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use futures_util::future::BoxFuture;
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use thiserror::Error;
use tower::{Layer, Service};

use crate::config::{BackendAddress, RequestBodyMode, Settings};
use crate::http::request::ForwardedRequest;
use crate::http::response::RelayedResponse;
use crate::inbound::matcher::PathPrefixMatcher;
use crate::observability::metrics;

/// Failures of a single relayed request.
///
/// None of these are turned into an HTTP status: the server closes the
/// caller's connection instead.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The backend base plus request path is not a valid URI.
    #[error("invalid backend target '{target}': {source}")]
    InvalidTarget {
        target: String,
        #[source]
        source: axum::http::uri::InvalidUri,
    },

    /// The inbound body could not be read (client aborted, over limit).
    #[error("failed to read request body: {0}")]
    RequestBody(#[source] axum::Error),

    /// The backend request could not be assembled.
    #[error("failed to build backend request: {0}")]
    Build(#[from] axum::http::Error),

    /// Connection refused, reset, timed out, or a malformed backend reply.
    #[error("backend request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),
}

/// Forwards matching requests to one backend.
#[derive(Clone)]
pub struct Relay {
    backend: BackendAddress,
    matcher: PathPrefixMatcher,
    body_mode: RequestBodyMode,
    max_buffered_body_bytes: usize,
    client: Client<HttpConnector, Body>,
}

impl Relay {
    /// Relay with a pooled client for the backend in `settings`.
    pub fn new(settings: &Settings) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(settings.connect_timeout));
        connector.set_nodelay(true);

        let client = Client::builder(TokioExecutor::new()).build(connector);

        Self {
            backend: settings.backend.clone(),
            matcher: PathPrefixMatcher::api(),
            body_mode: settings.request_body,
            max_buffered_body_bytes: settings.max_buffered_body_bytes,
            client,
        }
    }

    /// The backend base URL.
    pub fn backend(&self) -> &BackendAddress {
        &self.backend
    }

    /// Backend URL for a request, or `None` when it is not API traffic.
    pub fn target_for<B>(&self, request: &Request<B>) -> Option<String> {
        let uri = request.uri();
        self.matcher
            .strip(uri.path())
            .map(|rest| self.backend.target(rest, uri.query()))
    }

    /// Issue exactly one backend call for `request` and relay its response.
    pub async fn forward(
        &self,
        request: Request<Body>,
        target: String,
    ) -> Result<Response<Body>, RelayError> {
        let start_time = Instant::now();
        let method = request.method().clone();
        let path = request.uri().path().to_string();

        tracing::debug!(method = %method, path = %path, target = %target, "Relaying request");

        let forwarded = ForwardedRequest::from_inbound(request, &target)?;
        let backend_request = forwarded
            .into_backend_request(self.body_mode, self.max_buffered_body_bytes)
            .await?;

        match self.client.request(backend_request).await {
            Ok(response) => {
                let relayed = RelayedResponse::new(response);
                let status = relayed.status();
                metrics::record_request(method.as_str(), status.as_u16(), start_time);
                tracing::debug!(
                    method = %method,
                    path = %path,
                    status = status.as_u16(),
                    "Backend responded"
                );
                Ok(relayed.into_response())
            }
            Err(e) => {
                metrics::record_upstream_error(method.as_str());
                tracing::error!(method = %method, target = %target, error = %e, "Upstream error");
                Err(RelayError::Upstream(e))
            }
        }
    }
}

/// Wraps a resolution pipeline and diverts `/api/*` requests to a [`Relay`].
#[derive(Clone)]
pub struct InboundProxy<S> {
    relay: Arc<Relay>,
    inner: S,
}

impl<S> InboundProxy<S> {
    /// Divert API traffic to `relay`, everything else to `inner`.
    pub fn new(relay: Relay, inner: S) -> Self {
        Self {
            relay: Arc::new(relay),
            inner,
        }
    }

    /// The relay handling API traffic.
    pub fn relay(&self) -> &Relay {
        &self.relay
    }
}

impl<S> Service<Request<Body>> for InboundProxy<S>
where
    S: Service<Request<Body>, Response = Response<Body>, Error = Infallible>
        + Clone
        + Send
        + 'static,
    S::Future: Send + 'static,
{
    type Response = Response<Body>;
    type Error = RelayError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(|never| match never {})
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        match self.relay.target_for(&request) {
            Some(target) => {
                let relay = Arc::clone(&self.relay);
                Box::pin(async move { relay.forward(request, target).await })
            }
            None => {
                // `inner` was driven to readiness; keep that instance for this call.
                let clone = self.inner.clone();
                let mut inner = std::mem::replace(&mut self.inner, clone);
                Box::pin(async move { inner.call(request).await.map_err(|never| match never {}) })
            }
        }
    }
}

/// [`Layer`] form of [`InboundProxy`].
#[derive(Clone)]
pub struct InboundProxyLayer {
    relay: Relay,
}

impl InboundProxyLayer {
    /// Layer that wraps pipelines with `relay`.
    pub fn new(relay: Relay) -> Self {
        Self { relay }
    }
}

impl<S> Layer<S> for InboundProxyLayer {
    type Service = InboundProxy<S>;

    fn layer(&self, inner: S) -> Self::Service {
        InboundProxy::new(self.relay.clone(), inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use tower::ServiceExt;

    fn relay_to(backend: &str) -> Relay {
        let addr: SocketAddr = "127.0.0.1:3000".parse().unwrap();
        Relay::new(&Settings::new(addr, BackendAddress::parse(backend).unwrap()))
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[test]
    fn target_strips_prefix_and_keeps_query() {
        let relay = relay_to("http://backend:8080");
        assert_eq!(
            relay.target_for(&get("/api/sensors/42")).as_deref(),
            Some("http://backend:8080/sensors/42")
        );
        assert_eq!(
            relay.target_for(&get("/api/fields?page=2&sort=name")).as_deref(),
            Some("http://backend:8080/fields?page=2&sort=name")
        );
        assert_eq!(relay.target_for(&get("/index.html")), None);
        assert_eq!(relay.target_for(&get("/api")), None);
    }

    #[tokio::test]
    async fn non_api_requests_reach_the_pipeline() {
        let pipeline = tower::service_fn(|request: Request<Body>| async move {
            let body = format!("pipeline saw {}", request.uri());
            Ok::<_, Infallible>(Response::new(Body::from(body)))
        });
        let proxy = InboundProxyLayer::new(relay_to("http://backend:8080")).layer(pipeline);

        let response = proxy.oneshot(get("/dashboard?tab=1")).await.unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&bytes[..], b"pipeline saw /dashboard?tab=1");
    }

    #[tokio::test]
    async fn unreachable_backend_is_an_error() {
        // Port 1 on loopback is closed in any sane test environment.
        let pipeline = tower::service_fn(|_: Request<Body>| async move {
            Ok::<_, Infallible>(Response::new(Body::empty()))
        });
        let proxy = InboundProxy::new(relay_to("http://127.0.0.1:1"), pipeline);

        let err = proxy.oneshot(get("/api/sensors")).await.unwrap_err();
        assert!(matches!(err, RelayError::Upstream(_)));
    }
}
