//! # UV Manager
//!
//! Caches the validator set and answers coordinator queries from the cache
//! alone. The refresh loop is started explicitly with [`UvManager::start`]
//! and ends on context cancellation or [`UvManager::stop`].

use parking_lot::{Mutex, RwLock};
use shared_types::{RunContext, RunHandle, UniversalValidator};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::algorithms::select_coordinator;
use crate::config::CoordinatorConfig;
use crate::domain::CoordinatorError;
use crate::ports::ValidatorSetSource;

/// Validator set cache and coordinator oracle.
pub struct UvManager {
    config: CoordinatorConfig,
    source: Arc<dyn ValidatorSetSource>,
    validators: RwLock<Vec<UniversalValidator>>,
    refresher: Mutex<Option<(RunHandle, JoinHandle<()>)>>,
}

impl UvManager {
    /// New manager with an empty cache. Does not start the refresh loop.
    pub fn new(
        config: CoordinatorConfig,
        source: Arc<dyn ValidatorSetSource>,
    ) -> Result<Self, CoordinatorError> {
        config.validate()?;
        Ok(Self {
            config,
            source,
            validators: RwLock::new(Vec::new()),
            refresher: Mutex::new(None),
        })
    }

    /// Address of the local validator.
    pub fn my_validator_address(&self) -> &str {
        &self.config.my_validator_address
    }

    /// Copy of the cached validator set.
    pub fn get_uvs(&self) -> Vec<UniversalValidator> {
        self.validators.read().clone()
    }

    /// Replace the cached set wholesale.
    pub fn set_validators(&self, validators: Vec<UniversalValidator>) {
        uv_telemetry::VALIDATOR_SET_SIZE.set(validators.len() as f64);
        *self.validators.write() = validators;
    }

    /// Query the source once and replace the cache. On failure the previous
    /// set is kept.
    pub async fn refresh(&self, ctx: &RunContext) -> Result<usize, CoordinatorError> {
        let fetched = ctx
            .run(self.config.refresh_timeout(), self.source.get_eligible_validators())
            .await
            .map_err(|e| CoordinatorError::Source(e.to_string()))
            .and_then(|r| r)?;
        let count = fetched.len();
        self.set_validators(fetched);
        debug!(validators = count, "[uv-03] validator set refreshed");
        Ok(count)
    }

    /// Elect the coordinator for `block_num` from the cached set.
    pub fn get_coordinator(&self, block_num: i64) -> Result<UniversalValidator, CoordinatorError> {
        let validators = self.validators.read();
        let coordinator =
            select_coordinator(block_num, &validators, self.config.coordinator_range_size)?
                .clone();
        uv_telemetry::COORDINATOR_ELECTIONS.inc();
        Ok(coordinator)
    }

    /// True when the local validator coordinates `block_num`.
    pub fn is_coordinator(&self, block_num: i64) -> Result<bool, CoordinatorError> {
        let coordinator = self.get_coordinator(block_num)?;
        Ok(coordinator.validator_address == self.config.my_validator_address)
    }

    /// Spawn the refresh loop (immediate refresh, then every interval).
    /// Returns `false` when it is already running.
    pub fn start(self: &Arc<Self>, ctx: RunContext) -> bool {
        let mut refresher = self.refresher.lock();
        if let Some((_, handle)) = refresher.as_ref() {
            if !handle.is_finished() {
                return false;
            }
        }

        let (stop, stop_ctx) = RunContext::new();
        let manager = self.clone();
        let handle = tokio::spawn(async move { manager.refresh_loop(ctx, stop_ctx).await });
        *refresher = Some((stop, handle));
        info!(
            interval_secs = self.config.refresh_interval_secs,
            "[uv-03] validator refresh loop started"
        );
        true
    }

    /// Stop the refresh loop and wait for it to exit.
    pub async fn stop(&self) {
        let running = self.refresher.lock().take();
        if let Some((stop, handle)) = running {
            stop.cancel();
            let _ = handle.await;
            info!("[uv-03] validator refresh loop stopped");
        }
    }

    async fn refresh_loop(&self, parent: RunContext, stop: RunContext) {
        let mut ticker = tokio::time::interval(self.config.refresh_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = parent.cancelled() => return,
                _ = stop.cancelled() => return,
                _ = ticker.tick() => {
                    if let Err(e) = self.refresh(&parent).await {
                        warn!(error = %e, "[uv-03] validator set refresh failed; keeping cached set");
                    }
                }
            }
        }
    }
}
