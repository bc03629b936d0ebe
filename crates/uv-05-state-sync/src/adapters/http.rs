//! `reqwest`-backed [`HttpFetcher`].

use async_trait::async_trait;
use std::time::Duration;

use crate::domain::StateSyncError;
use crate::ports::{HttpFetcher, HttpReply};

/// Production HTTP client.
#[derive(Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    /// Client with a per-request timeout.
    pub fn new(timeout: Duration) -> Result<Self, StateSyncError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StateSyncError::InvalidConfig(format!("http client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn get(&self, url: &str) -> Result<HttpReply, StateSyncError> {
        let http_err = |e: reqwest::Error| StateSyncError::Http {
            url: url.to_string(),
            reason: e.to_string(),
        };
        let response = self.client.get(url).send().await.map_err(http_err)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(http_err)?;
        Ok(HttpReply {
            status,
            body: body.to_vec(),
        })
    }
}
