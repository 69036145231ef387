//! The request-issuing primitive and its recording decorator.
//!
//! A [`Transport`] issues one request and returns the completed exchange.
//! [`RecordingTransport`] wraps another transport, delegates every call
//! unchanged, and appends a [`RawRecord`] for each exchange that completes.
//! Requests that fail before a response arrives are passed through and not
//! recorded, matching what a page-level `load` listener would see.

use crate::error::{AjaxError, Result};
use crate::record::RawRecord;
use crate::store::RecorderStore;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// An outbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    /// HTTP method, any case
    pub method: String,
    /// Absolute or context-relative URL
    pub url: String,
    /// Request headers in send order
    pub headers: Vec<(String, String)>,
    /// Optional request body
    pub body: Option<String>,
}

impl OutboundRequest {
    /// Creates a request with no headers and no body.
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Shorthand for a `GET` request.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new("GET", url)
    }

    /// Adds a request header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets the request body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// A completed request/response exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    /// Method the request was issued with
    pub method: String,
    /// Final URL after redirects
    pub url: String,
    /// Response status code
    pub status: u16,
    /// Response headers in wire order
    pub headers: Vec<(String, String)>,
    /// Response body text
    pub body: String,
}

impl Exchange {
    /// Renders the response headers as a wire-format block.
    ///
    /// Repeated names are folded into one line with their values joined by
    /// `", "`, in first-seen order, the way `getAllResponseHeaders` reports
    /// them.
    #[must_use]
    pub fn raw_headers(&self) -> String {
        let mut folded: Vec<(&str, String)> = Vec::with_capacity(self.headers.len());
        for (name, value) in &self.headers {
            match folded
                .iter_mut()
                .find(|(seen, _)| seen.eq_ignore_ascii_case(name))
            {
                Some((_, joined)) => {
                    joined.push_str(", ");
                    joined.push_str(value);
                }
                None => folded.push((name.as_str(), value.clone())),
            }
        }
        folded
            .iter()
            .map(|(name, value)| format!("{name}: {value}\r\n"))
            .collect()
    }

    /// Builds the record the interceptor stores for this exchange.
    #[must_use]
    pub fn to_record(&self) -> RawRecord {
        RawRecord {
            url: self.url.clone(),
            method: self.method.clone(),
            status_code: self.status,
            headers: self.raw_headers(),
            body: self.body.clone(),
        }
    }
}

/// A capability that issues requests.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issues `request` and waits for the response to complete.
    ///
    /// # Errors
    ///
    /// Returns `Transport` if no response could be obtained.
    async fn send(&self, request: OutboundRequest) -> Result<Exchange>;
}

impl fmt::Debug for dyn Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("dyn Transport")
    }
}

/// Wraps a transport and records every completed exchange.
#[derive(Debug, Clone)]
pub struct RecordingTransport {
    inner: Arc<dyn Transport>,
    store: RecorderStore,
}

impl RecordingTransport {
    /// Wraps `inner`, appending to `store`.
    #[must_use]
    pub fn new(inner: Arc<dyn Transport>, store: RecorderStore) -> Self {
        Self { inner, store }
    }

    /// The store this transport appends to.
    #[must_use]
    pub fn store(&self) -> &RecorderStore {
        &self.store
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, request: OutboundRequest) -> Result<Exchange> {
        let exchange = self.inner.send(request).await?;
        self.store.push(exchange.to_record());
        debug!(
            method = %exchange.method,
            url = %exchange.url,
            status = exchange.status,
            index = self.store.len() - 1,
            "recorded request"
        );
        Ok(exchange)
    }
}

/// Issues real HTTP requests through a `reqwest` client.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Creates a transport with a default client.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transport around an existing client.
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: OutboundRequest) -> Result<Exchange> {
        let failed = |reason: String| AjaxError::Transport {
            url: request.url.clone(),
            reason,
        };

        let method = reqwest::Method::from_bytes(request.method.to_uppercase().as_bytes())
            .map_err(|e| failed(e.to_string()))?;

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(|e| failed(e.to_string()))?;
        let status = response.status().as_u16();
        let url = response.url().to_string();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response.text().await.map_err(|e| failed(e.to_string()))?;

        Ok(Exchange {
            method: request.method.clone(),
            url,
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Answers every request with the same status, or fails for `/down`.
    struct Echo(u16);

    #[async_trait]
    impl Transport for Echo {
        async fn send(&self, request: OutboundRequest) -> Result<Exchange> {
            if request.url == "/down" {
                return Err(AjaxError::Transport {
                    url: request.url,
                    reason: "connection refused".into(),
                });
            }
            Ok(Exchange {
                method: request.method,
                url: request.url,
                status: self.0,
                headers: vec![("Content-Type".into(), "text/plain".into())],
                body: request.body.unwrap_or_default(),
            })
        }
    }

    #[test]
    fn raw_headers_use_wire_format() {
        let exchange = Exchange {
            method: "GET".into(),
            url: "/a".into(),
            status: 200,
            headers: vec![
                ("Content-Type".into(), "application/json".into()),
                ("Content-Length".into(), "15".into()),
            ],
            body: String::new(),
        };
        assert_eq!(
            exchange.raw_headers(),
            "Content-Type: application/json\r\nContent-Length: 15\r\n"
        );
    }

    #[test]
    fn repeated_headers_are_folded() {
        let exchange = Exchange {
            method: "GET".into(),
            url: "/a".into(),
            status: 200,
            headers: vec![
                ("Vary".into(), "Accept".into()),
                ("Content-Type".into(), "text/plain".into()),
                ("vary".into(), "Origin".into()),
            ],
            body: String::new(),
        };
        assert_eq!(
            exchange.raw_headers(),
            "Vary: Accept, Origin\r\nContent-Type: text/plain\r\n"
        );

        let record = crate::record::RequestRecord::from(exchange.to_record());
        assert_eq!(record.header("vary"), Some("Accept, Origin"));
    }

    #[tokio::test]
    async fn records_and_passes_the_exchange_through() {
        let store = RecorderStore::new();
        let transport = RecordingTransport::new(Arc::new(Echo(201)), store.clone());
        assert!(transport.store().same_store(&store));

        let exchange = transport
            .send(OutboundRequest::new("post", "/items").with_body("hi"))
            .await
            .unwrap();

        assert_eq!(exchange.status, 201);
        assert_eq!(exchange.body, "hi");

        let records = store.snapshot();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].method, "post");
        assert_eq!(records[0].url, "/items");
        assert_eq!(records[0].status_code, 201);
        assert_eq!(records[0].headers, "Content-Type: text/plain\r\n");
    }

    #[tokio::test]
    async fn failed_requests_are_not_recorded() {
        let store = RecorderStore::new();
        let transport = RecordingTransport::new(Arc::new(Echo(200)), store.clone());

        let result = transport.send(OutboundRequest::get("/down")).await;

        assert!(matches!(result, Err(AjaxError::Transport { .. })));
        assert!(store.is_empty());
    }
}
