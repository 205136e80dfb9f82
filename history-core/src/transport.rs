//! HTTP transport used by the historical client.
//!
//! The client only ever issues a GET with query pairs, so the seam is kept
//! that narrow. [`ReqwestTransport`] is the default; callers can supply their
//! own implementation (a proxy, a recorder, a canned test double).

use std::{fmt::Debug, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Failed to build HTTP client")]
    Build(#[source] reqwest::Error),

    #[error("Failed to send request")]
    Request(#[source] reqwest::Error),

    #[error("Failed to read response body")]
    Body(#[source] reqwest::Error),

    #[error("{0}")]
    Other(String),
}

/// Raw response handed back to the client before any status check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait HttpTransport: Send + Sync + Debug {
    async fn get(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<TransportResponse, TransportError>;

    /// Request timeout applied by this transport, if any.
    fn timeout(&self) -> Option<Duration>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: Client,
    timeout: Option<Duration>,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self { http: Client::new(), timeout: None }
    }

    pub fn builder() -> ReqwestTransportBuilder {
        ReqwestTransportBuilder::default()
    }

    /// Wrap an already configured client. reqwest does not expose the timeout
    /// of a built client, so the caller passes the one it configured.
    pub fn from_client(http: Client, timeout: Option<Duration>) -> Self {
        Self { http, timeout }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default)]
pub struct ReqwestTransportBuilder {
    timeout: Option<Duration>,
}

impl ReqwestTransportBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<ReqwestTransport, TransportError> {
        let mut builder = Client::builder();
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(TransportError::Build)?;

        Ok(ReqwestTransport { http, timeout: self.timeout })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<TransportResponse, TransportError> {
        let res = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(TransportError::Request)?;

        let status = res.status().as_u16();
        let body = res.text().await.map_err(TransportError::Body)?;

        Ok(TransportResponse { status, body })
    }

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}
