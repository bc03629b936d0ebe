//! # Chain Cache Job
//!
//! Periodically re-populates the [`ChainCache`] from the upstream
//! [`ChainConfigSource`].
//!
//! ## Lifecycle
//!
//! `idle → running` on [`ChainCacheJob::start`], `running → idle` on
//! [`ChainCacheJob::stop`]; both are idempotent and `stop` waits for the
//! worker to exit.
//!
//! On start the worker performs an initial sync (3 attempts, backoff 1s,
//! 2s, 4s). Failure is logged and the job keeps running on its ticker.
//! A refresh returning zero chains is an error and never empties the cache.

use shared_types::RunContext;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::job::{tick_loop, JobSlot, Trigger};
use crate::config::ChainCacheJobConfig;
use crate::domain::{ChainCache, ChainSyncError};
use crate::ports::ChainConfigSource;

/// Background refresher for the chain cache.
pub struct ChainCacheJob {
    cache: Option<Arc<ChainCache>>,
    source: Option<Arc<dyn ChainConfigSource>>,
    config: ChainCacheJobConfig,
    slot: JobSlot,
}

/// Builder for [`ChainCacheJob`].
#[derive(Default)]
pub struct ChainCacheJobBuilder {
    cache: Option<Arc<ChainCache>>,
    source: Option<Arc<dyn ChainConfigSource>>,
    config: ChainCacheJobConfig,
}

impl ChainCacheJobBuilder {
    /// Cache to populate.
    pub fn cache(mut self, cache: Arc<ChainCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Upstream config source.
    pub fn source(mut self, source: Arc<dyn ChainConfigSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Job configuration.
    pub fn config(mut self, config: ChainCacheJobConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the job. Missing dependencies are reported by `start`.
    pub fn build(self) -> ChainCacheJob {
        ChainCacheJob {
            cache: self.cache,
            source: self.source,
            config: self.config,
            slot: JobSlot::new("chain cache job"),
        }
    }
}

impl ChainCacheJob {
    /// Job with all dependencies supplied.
    pub fn new(
        cache: Arc<ChainCache>,
        source: Arc<dyn ChainConfigSource>,
        config: ChainCacheJobConfig,
    ) -> Self {
        Self::builder().cache(cache).source(source).config(config).build()
    }

    /// Start building a job.
    pub fn builder() -> ChainCacheJobBuilder {
        ChainCacheJobBuilder::default()
    }

    /// Spawn the worker. No-op when already running.
    ///
    /// # Errors
    ///
    /// Fails fast when the cache or source is missing or the config is invalid.
    pub fn start(&self, ctx: RunContext) -> Result<(), ChainSyncError> {
        let cache = self
            .cache
            .clone()
            .ok_or(ChainSyncError::MissingDependency("chain cache"))?;
        let source = self
            .source
            .clone()
            .ok_or(ChainSyncError::MissingDependency("chain config source"))?;
        self.config.validate()?;

        let worker = CacheWorker {
            cache,
            source,
            config: self.config.clone(),
        };
        self.slot
            .start(move |stop, force_rx| worker.run(ctx, stop, force_rx));
        Ok(())
    }

    /// Stop the worker and wait for it to exit. No-op when idle.
    pub async fn stop(&self) {
        self.slot.stop().await;
    }

    /// Request an immediate refresh. Returns `false` when a request is
    /// already pending or the job is not running.
    pub fn force_sync(&self) -> bool {
        self.slot.force()
    }

    /// True while the worker is alive.
    pub fn is_running(&self) -> bool {
        self.slot.is_running()
    }
}

struct CacheWorker {
    cache: Arc<ChainCache>,
    source: Arc<dyn ChainConfigSource>,
    config: ChainCacheJobConfig,
}

impl CacheWorker {
    async fn run(self, parent: RunContext, stop: RunContext, mut force_rx: mpsc::Receiver<()>) {
        tokio::select! {
            _ = stop.cancelled() => return,
            res = self.initial_sync(&parent) => {
                if let Err(e) = res {
                    warn!(error = %e, "[uv-02] initial chain config sync failed; continuing with empty/stale cache");
                }
            }
        }

        tick_loop(
            "chain cache job",
            self.config.interval(),
            &parent,
            &stop,
            &mut force_rx,
            |trigger| self.refresh(&parent, trigger),
        )
        .await;
    }

    async fn refresh(&self, ctx: &RunContext, trigger: Trigger) {
        if let Err(e) = self.sync_once(ctx).await {
            warn!(
                trigger = trigger.as_str(),
                error = %e,
                "[uv-02] chain config refresh failed; keeping previous cache"
            );
        }
    }

    async fn initial_sync(&self, ctx: &RunContext) -> Result<usize, ChainSyncError> {
        let attempts = self.config.initial_sync_attempts;
        let mut backoff = self.config.initial_backoff();
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            match self.sync_once(ctx).await {
                Ok(count) => {
                    info!(attempt, chains = count, "[uv-02] initial chain config sync successful");
                    return Ok(count);
                }
                Err(e) => {
                    warn!(attempt, error = %e, "[uv-02] initial chain config sync attempt failed");
                    last_error = e.to_string();
                }
            }
            ctx.sleep(backoff).await?;
            backoff *= 2;
        }

        Err(ChainSyncError::InitialSyncFailed {
            attempts,
            last_error,
        })
    }

    async fn sync_once(&self, ctx: &RunContext) -> Result<usize, ChainSyncError> {
        let fetched = ctx
            .run(self.config.per_sync_timeout(), self.source.get_all_chain_configs())
            .await
            .map_err(ChainSyncError::from)
            .and_then(|res| res);

        let configs = match fetched {
            Ok(configs) => configs,
            Err(e) => {
                uv_telemetry::CACHE_SYNCS.with_label_values(&["error"]).inc();
                return Err(e);
            }
        };
        if configs.is_empty() {
            uv_telemetry::CACHE_SYNCS.with_label_values(&["empty"]).inc();
            return Err(ChainSyncError::EmptySnapshot);
        }

        let count = self.cache.update_chains(configs);
        uv_telemetry::CACHE_SYNCS.with_label_values(&["success"]).inc();
        uv_telemetry::CACHED_CHAINS.set(count as f64);
        debug!(chains = count, "[uv-02] chain cache updated");
        Ok(count)
    }
}
