//! Outbound rewriting against a live relay and backend.

use std::sync::Arc;

use api_relay::config::{ApiBase, BackendAddress, RequestBodyMode};
use api_relay::outbound::{
    BrowserRewriter, OutboundClient, OutboundError, OutboundRequest, ServerRewriter,
};
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::Method;
use serde_json::Value;
use url::Url;

mod common;

#[tokio::test]
async fn server_context_calls_go_through_the_relay() {
    let (backend_addr, backend) = common::start_backend().await;
    let backend_base = format!("http://{backend_addr}");
    let (relay_addr, _shutdown) = common::start_relay(&backend_base, RequestBodyMode::Stream).await;

    let rewriter = ServerRewriter::new(
        BackendAddress::parse(&backend_base).unwrap(),
        ApiBase::parse(&format!("http://{relay_addr}/api")).unwrap(),
    );
    let client = OutboundClient::new(common::client(), Arc::new(rewriter));

    let res = client
        .execute(OutboundRequest::get(format!("{backend_base}/sensors/42")))
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), r#"{"value":1}"#);

    let res = client
        .execute(
            OutboundRequest::new(Method::POST, format!("{backend_base}/pipelines?dry=1"))
                .header(HeaderName::from_static("x-echo-status"), HeaderValue::from_static("201"))
                .body(r#"{"name":"x"}"#),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), 201);
    let echo: Value = res.json().await.unwrap();
    assert_eq!(echo["method"], "POST");
    assert_eq!(echo["path"], "/pipelines");
    assert_eq!(echo["query"], "dry=1");
    assert_eq!(echo["body"], r#"{"name":"x"}"#);
    // The backend was reached via the relay, not directly.
    assert_eq!(echo["headers"]["host"][0], relay_addr.to_string());

    assert_eq!(backend.calls(), 2);
}

#[tokio::test]
async fn browser_context_calls_resolve_to_same_origin_api() {
    let (backend_addr, _backend) = common::start_backend().await;
    let (relay_addr, _shutdown) =
        common::start_relay(&format!("http://{backend_addr}"), RequestBodyMode::Stream).await;

    let rewriter = BrowserRewriter::new(ApiBase::parse("https://public.example/api").unwrap());
    let client = OutboundClient::new(common::client(), Arc::new(rewriter))
        .with_origin(Url::parse(&format!("http://{relay_addr}")).unwrap());

    assert_eq!(
        client.resolve("https://public.example/api/fields").unwrap().as_str(),
        format!("http://{relay_addr}/api/fields")
    );

    let res = client
        .execute(OutboundRequest::get("https://public.example/api/fields?limit=5"))
        .await
        .unwrap();
    let echo: Value = res.json().await.unwrap();
    assert_eq!(echo["path"], "/fields");
    assert_eq!(echo["query"], "limit=5");
}

#[tokio::test]
async fn non_matching_calls_are_issued_unchanged() {
    let (backend_addr, backend) = common::start_backend().await;

    // Nothing matches: the backend is called directly, no relay involved.
    let rewriter = BrowserRewriter::new(ApiBase::parse("https://public.example/api").unwrap());
    let client = OutboundClient::new(common::client(), Arc::new(rewriter));

    let res = client
        .execute(OutboundRequest::get(format!("http://{backend_addr}/data")))
        .await
        .unwrap();
    let echo: Value = res.json().await.unwrap();
    assert_eq!(echo["path"], "/data");
    assert_eq!(echo["headers"]["host"][0], backend_addr.to_string());
    assert_eq!(backend.calls(), 1);
}

#[tokio::test]
async fn transport_failures_are_returned_as_is() {
    let dead = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead_addr = dead.local_addr().unwrap();
    drop(dead);

    let rewriter = BrowserRewriter::new(ApiBase::default());
    let client = OutboundClient::new(common::client(), Arc::new(rewriter));

    let err = client
        .execute(OutboundRequest::get(format!("http://{dead_addr}/x")))
        .await
        .unwrap_err();
    match err {
        OutboundError::Transport(e) => assert!(e.is_connect()),
        other => panic!("unexpected error: {other}"),
    }
}
