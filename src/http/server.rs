//! HTTP server setup.
//!
//! # Responsibilities
//! - Compose the inbound proxy in front of the resolution pipeline
//! - Serve HTTP/1.1 and HTTP/2 per connection via hyper-util
//! - Close the caller's connection when a relay fails
//! - Drain connections on shutdown

use std::convert::Infallible;
use std::net::SocketAddr;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use hyper::body::Incoming;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tower::{Layer, Service, ServiceExt};

use crate::config::Settings;
use crate::http::pipeline::build_pipeline;
use crate::inbound::{InboundProxy, InboundProxyLayer, Relay};
use crate::net::{ConnectionTracker, Listener};

/// How long in-flight connections get to finish after shutdown.
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP server for the relay.
pub struct RelayServer<S = Router> {
    service: InboundProxy<S>,
}

impl RelayServer<Router> {
    /// Relay with the default resolution pipeline (static files or 404).
    pub fn new(settings: &Settings) -> Self {
        Self::with_pipeline(settings, build_pipeline(settings))
    }
}

impl<S> RelayServer<S>
where
    S: Service<Request<Body>, Response = Response<Body>, Error = Infallible>
        + Clone
        + Send
        + Sync
        + 'static,
    S::Future: Send + 'static,
{
    /// Relay in front of a caller-supplied resolution pipeline.
    pub fn with_pipeline(settings: &Settings, pipeline: S) -> Self {
        let relay = Relay::new(settings);
        tracing::info!(backend = %relay.backend(), "Inbound proxy configured");
        Self {
            service: InboundProxyLayer::new(relay).layer(pipeline),
        }
    }

    /// Run the server, accepting connections until `shutdown` fires.
    pub async fn run(
        self,
        listener: Listener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, peer_addr, permit) = match accepted {
                        Ok(conn) => conn,
                        Err(e) => {
                            tracing::warn!(error = %e, "Accept failed");
                            tokio::time::sleep(Duration::from_millis(50)).await;
                            continue;
                        }
                    };

                    let guard = tracker.track();
                    let service = self.service.clone();
                    let conn_shutdown = shutdown.resubscribe();

                    tokio::spawn(async move {
                        tracing::trace!(connection_id = %guard.id(), peer_addr = %peer_addr, "Serving connection");
                        serve_connection(stream, peer_addr, service, conn_shutdown).await;
                        drop(permit);
                        drop(guard);
                    });
                }
                _ = shutdown.recv() => break,
            }
        }

        // New connects must be refused while in-flight ones drain.
        drop(listener);

        tracing::info!(active = tracker.active_count(), "Draining connections");
        if !tracker.drain(DRAIN_TIMEOUT).await {
            tracing::warn!(active = tracker.active_count(), "Drain deadline passed");
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn serve_connection<S>(
    stream: TcpStream,
    peer_addr: SocketAddr,
    service: InboundProxy<S>,
    mut shutdown: broadcast::Receiver<()>,
) where
    S: Service<Request<Body>, Response = Response<Body>, Error = Infallible>
        + Clone
        + Send
        + 'static,
    S::Future: Send + 'static,
{
    let hyper_service = hyper::service::service_fn(move |request: Request<Incoming>| {
        service.clone().oneshot(request.map(Body::new))
    });

    let builder = auto::Builder::new(TokioExecutor::new());
    let connection = builder.serve_connection(TokioIo::new(stream), hyper_service);
    tokio::pin!(connection);

    let mut draining = false;
    loop {
        tokio::select! {
            result = connection.as_mut() => {
                // A relay error surfaces here: hyper has already dropped the
                // connection without writing a response.
                if let Err(e) = result {
                    tracing::debug!(peer_addr = %peer_addr, error = %e, "Connection ended with error");
                }
                break;
            }
            _ = shutdown.recv(), if !draining => {
                draining = true;
                connection.as_mut().graceful_shutdown();
            }
        }
    }
}
