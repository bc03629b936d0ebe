//! # Trust Provider
//!
//! Cascading fallback search for a trust point.

use shared_types::RunContext;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::algorithms::{candidate_heights, parse_block_hash, parse_commit_hash, parse_latest_height};
use crate::config::StateSyncConfig;
use crate::domain::{StateSyncError, TrustPoint};
use crate::ports::HttpFetcher;

type Parser = fn(&[u8]) -> Result<String, String>;

/// Computes trust points against a remote RPC endpoint.
pub struct TrustProvider {
    fetcher: Arc<dyn HttpFetcher>,
    config: StateSyncConfig,
}

impl TrustProvider {
    /// New provider.
    pub fn new(fetcher: Arc<dyn HttpFetcher>, config: StateSyncConfig) -> Result<Self, StateSyncError> {
        config.validate()?;
        Ok(Self { fetcher, config })
    }

    /// Search `base_url` for a trust point.
    ///
    /// # Errors
    ///
    /// `/status` failures, [`StateSyncError::NoCandidates`] when the chain is
    /// younger than one snapshot interval, [`StateSyncError::Exhausted`] when
    /// every candidate failed on both endpoints.
    pub async fn compute_trust(
        &self,
        ctx: &RunContext,
        base_url: &str,
    ) -> Result<TrustPoint, StateSyncError> {
        let _timer = uv_telemetry::TRUST_SEARCH_DURATION.start_timer();
        let result = self.search(ctx, base_url.trim_end_matches('/')).await;
        let outcome = match &result {
            Ok(_) => "found",
            Err(StateSyncError::Exhausted { .. }) | Err(StateSyncError::NoCandidates { .. }) => {
                "exhausted"
            }
            Err(_) => "error",
        };
        uv_telemetry::TRUST_SEARCHES
            .with_label_values(&[outcome])
            .inc();
        result
    }

    async fn search(&self, ctx: &RunContext, base: &str) -> Result<TrustPoint, StateSyncError> {
        let latest = self
            .fetch(ctx, &format!("{}/status", base), parse_latest_height)
            .await?;

        let interval = self.config.snapshot_interval;
        let candidates = candidate_heights(latest, interval, self.config.max_candidates);
        if candidates.is_empty() {
            return Err(StateSyncError::NoCandidates { latest, interval });
        }
        debug!(latest, ?candidates, "[uv-05] trust point candidates");

        let endpoints: [(&str, Parser); 2] =
            [("block", parse_block_hash), ("commit", parse_commit_hash)];
        let mut last_error = String::new();

        for &height in &candidates {
            for (endpoint, parser) in endpoints {
                let url = format!("{}/{}?height={}", base, endpoint, height);
                match self.fetch(ctx, &url, parser).await {
                    Ok(hash) => {
                        info!(height, hash = %hash, endpoint, "[uv-05] trust point found");
                        return Ok(TrustPoint {
                            height,
                            hash,
                        });
                    }
                    Err(e @ StateSyncError::Interrupted(_)) => return Err(e),
                    Err(e) => {
                        debug!(height, endpoint, error = %e, "[uv-05] candidate failed");
                        last_error = e.to_string();
                    }
                }
            }
        }

        warn!(tried = candidates.len(), error = %last_error, "[uv-05] no trust point found");
        Err(StateSyncError::Exhausted {
            tried: candidates.len(),
            last_error,
        })
    }

    async fn fetch<T>(
        &self,
        ctx: &RunContext,
        url: &str,
        parse: fn(&[u8]) -> Result<T, String>,
    ) -> Result<T, StateSyncError> {
        let reply = ctx
            .run(self.config.request_timeout(), self.fetcher.get(url))
            .await??;
        if !reply.is_success() {
            return Err(StateSyncError::Status {
                url: url.to_string(),
                status: reply.status,
            });
        }
        parse(&reply.body).map_err(|reason| StateSyncError::Malformed {
            url: url.to_string(),
            reason,
        })
    }
}
