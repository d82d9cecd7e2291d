//! HTTP client that applies an [`OutboundRewriter`] before every call.

use std::sync::Arc;

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use thiserror::Error;
use url::Url;

use crate::outbound::OutboundRewriter;

/// Errors from [`OutboundClient::execute`].
#[derive(Debug, Error)]
pub enum OutboundError {
    /// The (rewritten) URL does not parse.
    #[error("invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// A same-origin path was produced but the client has no origin to resolve it against.
    #[error("relative URL '{0}' needs an origin")]
    MissingOrigin(String),

    /// The call itself failed.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

/// An outbound call as the application describes it.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl OutboundRequest {
    /// Call with no headers and no body.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    /// Append a header. Repeated names are kept.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Set the request body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// Issues application calls after rewriting their URL.
#[derive(Debug, Clone)]
pub struct OutboundClient {
    http: reqwest::Client,
    rewriter: Arc<dyn OutboundRewriter>,
    origin: Option<Url>,
}

impl OutboundClient {
    /// Client issuing calls through `rewriter`.
    pub fn new(http: reqwest::Client, rewriter: Arc<dyn OutboundRewriter>) -> Self {
        Self {
            http,
            rewriter,
            origin: None,
        }
    }

    /// Origin that same-origin paths such as `/api/fields` resolve against.
    pub fn with_origin(mut self, origin: Url) -> Self {
        self.origin = Some(origin);
        self
    }

    /// The concrete URL a call to `target` goes to.
    pub fn resolve(&self, target: &str) -> Result<Url, OutboundError> {
        let rewritten = self.rewriter.rewrite(target);
        let invalid = |source: url::ParseError| OutboundError::InvalidUrl {
            url: rewritten.to_string(),
            source,
        };

        match Url::parse(&rewritten) {
            Ok(resolved) => Ok(resolved),
            Err(url::ParseError::RelativeUrlWithoutBase) => match &self.origin {
                Some(origin) => origin.join(&rewritten).map_err(invalid),
                None => Err(OutboundError::MissingOrigin(rewritten.to_string())),
            },
            Err(e) => Err(invalid(e)),
        }
    }

    /// Issue exactly one call. Method, headers and body are passed through;
    /// the response or transport error is returned unchanged.
    pub async fn execute(&self, request: OutboundRequest) -> Result<reqwest::Response, OutboundError> {
        let url = self.resolve(&request.url)?;
        if url.as_str() != request.url {
            tracing::debug!(from = %request.url, to = %url, "Rewrote outbound URL");
        }

        let mut builder = self
            .http
            .request(request.method, url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        Ok(builder.send().await?)
    }
}
