//! # Outbound Ports
//!
//! HTTP GET against the remote RPC endpoint.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

use crate::domain::StateSyncError;

/// Status and body of an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    /// Status code.
    pub status: u16,
    /// Raw body.
    pub body: Vec<u8>,
}

impl HttpReply {
    /// 200 with `body`.
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    /// 404 with an empty body.
    pub fn not_found() -> Self {
        Self {
            status: 404,
            body: Vec::new(),
        }
    }

    /// 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Minimal HTTP client.
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    /// GET `url`. Transport failures are errors; any status is a reply.
    async fn get(&self, url: &str) -> Result<HttpReply, StateSyncError>;
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// Route table keyed by path plus query (`/block?height=4000`). Unknown
/// routes answer 404.
#[derive(Default)]
pub struct MockHttpFetcher {
    routes: Mutex<HashMap<String, HttpReply>>,
    requests: Mutex<Vec<String>>,
}

impl MockHttpFetcher {
    /// Empty route table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `route` with `reply`.
    pub fn route(&self, route: &str, reply: HttpReply) -> &Self {
        self.routes.lock().insert(route.to_string(), reply);
        self
    }

    /// Routes requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }
}

fn route_of(url: &str) -> &str {
    // Drop scheme and authority: "http://host:1/block?height=1" -> "/block?height=1".
    let rest = url.split_once("://").map(|(_, r)| r).unwrap_or(url);
    match rest.find('/') {
        Some(i) => &rest[i..],
        None => "/",
    }
}

#[async_trait]
impl HttpFetcher for MockHttpFetcher {
    async fn get(&self, url: &str) -> Result<HttpReply, StateSyncError> {
        let route = route_of(url).to_string();
        self.requests.lock().push(route.clone());
        Ok(self
            .routes
            .lock()
            .get(&route)
            .cloned()
            .unwrap_or_else(HttpReply::not_found))
    }
}
