//! Remote byte-fetch capability
//!
//! The engine consumes raw bytes keyed by resource identifier and bearer
//! credential; the HTTP implementation lives behind a trait so tests can
//! script responses and failures.

use crate::error::SyncError;
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

/// Raw response from the byte source: HTTP-equivalent status plus body.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    /// Fetch the bytes of one resource. `Err` is reserved for transport
    /// failures; a non-success status comes back as a normal response.
    async fn fetch(
        &self,
        resource_id: &str,
        token: &SecretString,
    ) -> Result<FetchResponse, SyncError>;
}

/// Reqwest-backed fetcher against `<base>/file/<id>`.
pub struct HttpResourceFetcher {
    client: reqwest::Client,
    base: String,
}

impl HttpResourceFetcher {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base: base.into(),
        }
    }
}

#[async_trait]
impl ResourceFetcher for HttpResourceFetcher {
    async fn fetch(
        &self,
        resource_id: &str,
        token: &SecretString,
    ) -> Result<FetchResponse, SyncError> {
        let url = format!("{}/file/{}", self.base, resource_id);
        let response = self
            .client
            .get(&url)
            .bearer_auth(token.expose_secret())
            .send()
            .await
            .map_err(|e| SyncError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| SyncError::Transport(e.to_string()))?
            .to_vec();
        Ok(FetchResponse { status, body })
    }
}
