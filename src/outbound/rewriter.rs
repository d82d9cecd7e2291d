//! The two rewriter variants.

use std::borrow::Cow;

use crate::config::{ApiBase, BackendAddress};
use crate::inbound::API_PREFIX;
use crate::outbound::OutboundRewriter;

/// Replace a leading `from` in `url` with `to`.
///
/// Plain `starts_with`: `https://host/api` also matches `https://host/apiary`.
fn replace_prefix<'a>(url: &'a str, from: &str, to: &str) -> Cow<'a, str> {
    match url.strip_prefix(from) {
        Some(rest) => Cow::Owned(format!("{to}{rest}")),
        None => Cow::Borrowed(url),
    }
}

/// Server-context variant: calls to the backend go through this process's
/// own inbound proxy, like browser calls do.
#[derive(Debug, Clone)]
pub struct ServerRewriter {
    backend: BackendAddress,
    loopback: ApiBase,
}

impl ServerRewriter {
    /// Rewrite calls to `backend` onto `loopback`.
    pub fn new(backend: BackendAddress, loopback: ApiBase) -> Self {
        Self { backend, loopback }
    }
}

impl OutboundRewriter for ServerRewriter {
    fn rewrite<'a>(&self, url: &'a str) -> Cow<'a, str> {
        replace_prefix(url, self.backend.as_str(), self.loopback.as_str())
    }
}

/// Browser-context variant: calls to the public API base become same-origin
/// `/api` calls.
#[derive(Debug, Clone)]
pub struct BrowserRewriter {
    public_base: ApiBase,
}

impl BrowserRewriter {
    /// Rewrite calls to `public_base` onto `/api`.
    pub fn new(public_base: ApiBase) -> Self {
        Self { public_base }
    }
}

impl OutboundRewriter for BrowserRewriter {
    fn rewrite<'a>(&self, url: &'a str) -> Cow<'a, str> {
        replace_prefix(url, self.public_base.as_str(), API_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn browser(base: &str) -> BrowserRewriter {
        BrowserRewriter::new(ApiBase::parse(base).unwrap())
    }

    fn server(backend: &str, loopback: &str) -> ServerRewriter {
        ServerRewriter::new(
            BackendAddress::parse(backend).unwrap(),
            ApiBase::parse(loopback).unwrap(),
        )
    }

    #[test]
    fn browser_rewrites_public_base_to_local_prefix() {
        let rewriter = browser("https://public.example/api");
        assert_eq!(rewriter.rewrite("https://public.example/api/fields"), "/api/fields");
        assert_eq!(
            rewriter.rewrite("https://public.example/api/fields?limit=5"),
            "/api/fields?limit=5"
        );
    }

    #[test]
    fn browser_leaves_other_urls_alone() {
        let rewriter = browser("https://public.example/api");
        let url = "https://other.example/data";
        assert!(matches!(rewriter.rewrite(url), Cow::Borrowed(u) if u == url));
        assert_eq!(rewriter.rewrite("/static/app.js"), "/static/app.js");
    }

    #[test]
    fn browser_default_base_is_identity_on_api_paths() {
        let rewriter = browser("/api");
        assert_eq!(rewriter.rewrite("/api/sensors/42"), "/api/sensors/42");
    }

    #[test]
    fn server_routes_backend_calls_through_loopback() {
        let rewriter = server("http://192.168.1.162:8080", "http://localhost:3000/api");
        assert_eq!(
            rewriter.rewrite("http://192.168.1.162:8080/sensors/42?window=1h"),
            "http://localhost:3000/api/sensors/42?window=1h"
        );
        assert_eq!(
            rewriter.rewrite("https://other.example/data"),
            "https://other.example/data"
        );
    }

    #[test]
    fn rewrite_only_touches_the_leading_occurrence() {
        let rewriter = server("http://backend:8080", "http://localhost:3000/api");
        assert_eq!(
            rewriter.rewrite("http://backend:8080/proxy?to=http://backend:8080/x"),
            "http://localhost:3000/api/proxy?to=http://backend:8080/x"
        );
        // Not a prefix: untouched.
        assert_eq!(
            rewriter.rewrite("http://cdn/?u=http://backend:8080"),
            "http://cdn/?u=http://backend:8080"
        );
    }
}
