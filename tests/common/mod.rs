//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use api_relay::config::{BackendAddress, RequestBodyMode, Settings};
use api_relay::net::Listener;
use api_relay::{RelayServer, Shutdown};
use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde_json::{json, Map, Value};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// What the mock backend observed.
#[derive(Clone, Default)]
pub struct BackendState {
    pub calls: Arc<AtomicUsize>,
    pub ticker_stopped: Arc<AtomicBool>,
}

impl BackendState {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

/// Start a mock backend on an ephemeral port.
///
/// - `GET /sensors/42` → 200 `{"value":1}` with caching headers
/// - `GET /ticker` → endless chunked body, one chunk every 20ms
/// - anything else → JSON echo of method, path, query, headers and body;
///   the status comes from `x-echo-status` (default 200)
pub async fn start_backend() -> (SocketAddr, BackendState) {
    let state = BackendState::default();
    let app = Router::new()
        .route("/sensors/42", get(sensor))
        .route("/ticker", get(ticker))
        .fallback(echo)
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, state)
}

async fn sensor(State(state): State<BackendState>) -> impl IntoResponse {
    state.calls.fetch_add(1, Ordering::SeqCst);
    (
        StatusCode::OK,
        [
            ("content-type", "application/json"),
            ("cache-control", "max-age=60"),
            ("x-backend", "sensors"),
        ],
        r#"{"value":1}"#,
    )
}

async fn ticker(State(state): State<BackendState>) -> Response {
    state.calls.fetch_add(1, Ordering::SeqCst);
    let (tx, rx) = mpsc::channel::<Bytes>(1);
    let stopped = state.ticker_stopped.clone();
    tokio::spawn(async move {
        let mut n = 0u64;
        while tx.send(Bytes::from(format!("tick {n}\n"))).await.is_ok() {
            n += 1;
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        stopped.store(true, Ordering::SeqCst);
    });

    let stream = futures_util::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|chunk| (Ok::<_, Infallible>(chunk), rx))
    });
    Response::new(Body::from_stream(stream))
}

async fn echo(
    State(state): State<BackendState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    state.calls.fetch_add(1, Ordering::SeqCst);

    let mut header_map = Map::new();
    for name in headers.keys() {
        let values: Vec<Value> = headers
            .get_all(name)
            .iter()
            .map(|v| Value::String(v.to_str().unwrap_or_default().to_string()))
            .collect();
        header_map.insert(name.as_str().to_string(), Value::Array(values));
    }

    let status = headers
        .get("x-echo-status")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u16>().ok())
        .and_then(|v| StatusCode::from_u16(v).ok())
        .unwrap_or(StatusCode::OK);

    let payload = json!({
        "method": method.as_str(),
        "path": uri.path(),
        "query": uri.query(),
        "headers": header_map,
        "body": String::from_utf8_lossy(&body),
    });

    (
        status,
        [("x-backend", "echo"), ("x-request-trace", "abc123")],
        axum::Json(payload),
    )
        .into_response()
}

/// Start a relay in front of `backend` on an ephemeral port.
pub async fn start_relay(backend: &str, mode: RequestBodyMode) -> (SocketAddr, Shutdown) {
    let tcp = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = tcp.local_addr().unwrap();

    let mut settings = Settings::new(addr, BackendAddress::parse(backend).unwrap());
    settings.request_body = mode;

    let shutdown = Shutdown::new();
    let server = RelayServer::new(&settings);
    let listener = Listener::from_tcp(tcp, settings.max_connections).unwrap();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        server.run(listener, rx).await.unwrap();
    });

    (addr, shutdown)
}

/// Client that never pools, so every test talks to the relay on a fresh connection.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Poll `cond` until it holds or `deadline` passes.
pub async fn eventually(deadline: Duration, cond: impl Fn() -> bool) -> bool {
    let start = std::time::Instant::now();
    while start.elapsed() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    cond()
}
