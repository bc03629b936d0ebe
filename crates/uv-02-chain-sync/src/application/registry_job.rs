//! # Chain Registry Job
//!
//! Reconciles the live chain client registry against the current cache
//! snapshot on every tick (mark-and-sweep):
//!
//! 1. Active chains are added or updated.
//! 2. Chains with both directions disabled (or no switches) are removed.
//! 3. Registry entries not seen in the snapshot are removed.
//!
//! The job only reads the cache; it never triggers a cache refresh.
//! One chain failing to add does not stop the rest of the pass.

use shared_types::RunContext;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use super::job::{tick_loop, JobSlot, Trigger};
use crate::config::ChainRegistryJobConfig;
use crate::domain::{ChainCache, ChainSyncError};
use crate::ports::ChainClientRegistry;

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Chains added or confirmed up to date.
    pub upserted: usize,
    /// Chains removed (disabled or absent from the snapshot).
    pub removed: Vec<String>,
    /// Chains whose add/update failed.
    pub failed: Vec<String>,
}

/// Background reconciler for the chain registry.
pub struct ChainRegistryJob {
    worker: Arc<RegistryWorker>,
    slot: JobSlot,
}

struct RegistryWorker {
    cache: Arc<ChainCache>,
    registry: Arc<dyn ChainClientRegistry>,
    config: ChainRegistryJobConfig,
}

impl ChainRegistryJob {
    /// New idle job.
    pub fn new(
        cache: Arc<ChainCache>,
        registry: Arc<dyn ChainClientRegistry>,
        config: ChainRegistryJobConfig,
    ) -> Self {
        Self {
            worker: Arc::new(RegistryWorker {
                cache,
                registry,
                config,
            }),
            slot: JobSlot::new("chain registry job"),
        }
    }

    /// Spawn the worker. No-op when already running.
    pub fn start(&self, ctx: RunContext) -> Result<(), ChainSyncError> {
        self.worker.config.validate()?;
        let worker = self.worker.clone();
        self.slot
            .start(move |stop, force_rx| async move { worker.run(ctx, stop, force_rx).await });
        Ok(())
    }

    /// Stop the worker and wait for it to exit. No-op when idle.
    pub async fn stop(&self) {
        self.slot.stop().await;
    }

    /// Request an immediate reconciliation.
    pub fn force_sync(&self) -> bool {
        self.slot.force()
    }

    /// True while the worker is alive.
    pub fn is_running(&self) -> bool {
        self.slot.is_running()
    }

    /// Run one reconciliation pass inline.
    pub async fn sync_once(&self, ctx: &RunContext) -> ReconcileReport {
        self.worker.sync_once(ctx).await
    }
}

impl RegistryWorker {
    async fn run(&self, parent: RunContext, stop: RunContext, mut force_rx: mpsc::Receiver<()>) {
        tick_loop(
            "chain registry job",
            self.config.interval(),
            &parent,
            &stop,
            &mut force_rx,
            |trigger| self.reconcile(&parent, trigger),
        )
        .await;
    }

    async fn reconcile(&self, ctx: &RunContext, trigger: Trigger) {
        let report = self.sync_once(ctx).await;
        debug!(
            trigger = trigger.as_str(),
            upserted = report.upserted,
            removed = report.removed.len(),
            failed = report.failed.len(),
            "[uv-02] chain registry reconciled"
        );
    }

    async fn sync_once(&self, ctx: &RunContext) -> ReconcileReport {
        let snapshot = self.cache.get_all_chains();
        let registered: HashSet<String> = self.registry.get_all_chains().into_keys().collect();
        let mut seen = HashSet::with_capacity(snapshot.len());
        let mut report = ReconcileReport::default();

        for (chain_id, data) in snapshot {
            if ctx.is_cancelled() {
                return report;
            }
            if chain_id.is_empty() {
                continue;
            }
            seen.insert(chain_id.clone());

            if !data.config.is_active() {
                if registered.contains(&chain_id) {
                    info!(chain = %chain_id, "[uv-02] chain disabled; removing client");
                    self.registry.remove_chain(&chain_id).await;
                    report.removed.push(chain_id);
                }
                continue;
            }

            let res = ctx
                .run(
                    self.config.per_sync_timeout(),
                    self.registry.add_or_update_chain(&data.config),
                )
                .await
                .map_err(ChainSyncError::from)
                .and_then(|r| r);
            match res {
                Ok(()) => report.upserted += 1,
                Err(e) => {
                    error!(chain = %chain_id, error = %e, "[uv-02] failed to add/update chain");
                    uv_telemetry::REGISTRY_FAILURES.inc();
                    report.failed.push(chain_id);
                }
            }
        }

        let stale: Vec<String> = self
            .registry
            .get_all_chains()
            .into_keys()
            .filter(|id| !seen.contains(id))
            .collect();
        for chain_id in stale {
            info!(chain = %chain_id, "[uv-02] chain no longer in cache; removing client");
            self.registry.remove_chain(&chain_id).await;
            report.removed.push(chain_id);
        }

        uv_telemetry::REGISTRY_RECONCILIATIONS.inc();
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ChainRegistry;
    use crate::ports::MockChainClientFactory;
    use shared_types::{ChainConfig, ChainEnabled, VmType};
    use std::time::Duration;

    struct Fixture {
        cache: Arc<ChainCache>,
        factory: Arc<MockChainClientFactory>,
        registry: Arc<ChainRegistry>,
        job: ChainRegistryJob,
    }

    fn fixture() -> Fixture {
        let cache = Arc::new(ChainCache::new());
        let factory = Arc::new(MockChainClientFactory::new());
        let registry = Arc::new(ChainRegistry::new(factory.clone()));
        let job = ChainRegistryJob::new(
            cache.clone(),
            registry.clone(),
            ChainRegistryJobConfig::default(),
        );
        Fixture {
            cache,
            factory,
            registry,
            job,
        }
    }

    fn disabled(id: &str) -> ChainConfig {
        let mut cfg = ChainConfig::new(id, VmType::Evm);
        cfg.enabled = Some(ChainEnabled::default());
        cfg
    }

    #[tokio::test]
    async fn test_adds_active_chains() {
        let f = fixture();
        f.cache.update_chains(vec![
            ChainConfig::new("eip155:1", VmType::Evm),
            ChainConfig::new("solana:devnet", VmType::Svm),
        ]);

        let report = f.job.sync_once(&RunContext::background()).await;
        assert_eq!(report.upserted, 2);
        assert_eq!(f.registry.len(), 2);
    }

    #[tokio::test]
    async fn test_absent_chain_swept() {
        let f = fixture();
        let ctx = RunContext::background();
        f.cache.update_chains(vec![
            ChainConfig::new("a", VmType::Evm),
            ChainConfig::new("b", VmType::Evm),
        ]);
        f.job.sync_once(&ctx).await;

        f.cache.update_chains(vec![ChainConfig::new("a", VmType::Evm)]);
        let report = f.job.sync_once(&ctx).await;

        assert_eq!(report.removed, vec!["b".to_string()]);
        let all = f.registry.get_all_chains();
        assert!(all.contains_key("a"));
        assert!(!all.contains_key("b"));
        assert_eq!(f.factory.clients_for("b")[0].stop_calls(), 1);
    }

    #[tokio::test]
    async fn test_disabled_chain_removed() {
        let f = fixture();
        let ctx = RunContext::background();
        f.cache.update_chains(vec![ChainConfig::new("a", VmType::Evm)]);
        f.job.sync_once(&ctx).await;

        f.cache.update_chains(vec![disabled("a")]);
        let report = f.job.sync_once(&ctx).await;

        assert_eq!(report.removed, vec!["a".to_string()]);
        assert!(f.registry.is_empty());
    }

    #[tokio::test]
    async fn test_missing_switches_treated_as_disabled() {
        let f = fixture();
        let mut cfg = ChainConfig::new("a", VmType::Evm);
        cfg.enabled = None;
        f.cache.update_chains(vec![cfg]);

        let report = f.job.sync_once(&RunContext::background()).await;
        assert_eq!(report.upserted, 0);
        assert!(report.removed.is_empty());
        assert!(f.registry.is_empty());
    }

    #[tokio::test]
    async fn test_one_failure_does_not_abort_pass() {
        let f = fixture();
        f.factory.fail_for("bad");
        f.cache.update_chains(vec![
            ChainConfig::new("bad", VmType::Evm),
            ChainConfig::new("good", VmType::Evm),
        ]);

        let report = f.job.sync_once(&RunContext::background()).await;
        assert_eq!(report.failed, vec!["bad".to_string()]);
        assert_eq!(report.upserted, 1);
        assert!(f.registry.get_all_chains().contains_key("good"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_job_reconciles_on_tick() {
        let f = fixture();
        f.cache.update_chains(vec![ChainConfig::new("a", VmType::Evm)]);
        f.job.start(RunContext::background()).unwrap();

        // No initial pass; first reconciliation happens on the first tick.
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(f.registry.is_empty());

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(f.registry.len(), 1);

        f.cache.update_chains(vec![ChainConfig::new("b", VmType::Evm)]);
        assert!(f.job.force_sync());
        tokio::time::sleep(Duration::from_millis(10)).await;
        let all = f.registry.get_all_chains();
        assert!(all.contains_key("b"));
        assert!(!all.contains_key("a"));

        f.job.stop().await;
        assert!(!f.job.is_running());
    }
}
