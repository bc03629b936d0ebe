//! # Chain Cache
//!
//! Read-optimized snapshot of chain configuration keyed by chain id.
//!
//! Every update builds a complete new map and swaps it in under the write
//! lock, so readers observe either the old snapshot or the new one, never a
//! mix of both.

use parking_lot::RwLock;
use shared_types::ChainConfig;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;

/// One cached chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainData {
    /// Chain configuration as fetched.
    pub config: ChainConfig,
    /// When the snapshot containing this entry was built.
    pub updated_at: SystemTime,
}

#[derive(Default)]
struct Snapshot {
    chains: Arc<HashMap<String, ChainData>>,
    last_updated: Option<SystemTime>,
}

/// Chain config cache.
#[derive(Default)]
pub struct ChainCache {
    inner: RwLock<Snapshot>,
}

impl ChainCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole snapshot. Configs with an empty chain id are dropped.
    ///
    /// Returns the number of chains in the new snapshot.
    pub fn update_chains<I>(&self, configs: I) -> usize
    where
        I: IntoIterator<Item = ChainConfig>,
    {
        let now = SystemTime::now();
        let chains: HashMap<String, ChainData> = configs
            .into_iter()
            .filter(|cfg| !cfg.chain.is_empty())
            .map(|config| {
                (
                    config.chain.clone(),
                    ChainData {
                        config,
                        updated_at: now,
                    },
                )
            })
            .collect();
        let count = chains.len();

        let mut inner = self.inner.write();
        inner.chains = Arc::new(chains);
        inner.last_updated = Some(now);
        count
    }

    /// Copy of one chain entry.
    pub fn get_chain_data(&self, chain_id: &str) -> Option<ChainData> {
        self.inner.read().chains.get(chain_id).cloned()
    }

    /// Copy of every entry.
    pub fn get_all_chains(&self) -> HashMap<String, ChainData> {
        let chains = self.snapshot();
        (*chains).clone()
    }

    /// Copy of every config.
    pub fn get_all_chain_configs(&self) -> Vec<ChainConfig> {
        self.snapshot()
            .values()
            .map(|data| data.config.clone())
            .collect()
    }

    /// Number of cached chains.
    pub fn chain_count(&self) -> usize {
        self.inner.read().chains.len()
    }

    /// When the cache was last replaced; `None` before the first update.
    pub fn last_updated(&self) -> Option<SystemTime> {
        self.inner.read().last_updated
    }

    fn snapshot(&self) -> Arc<HashMap<String, ChainData>> {
        self.inner.read().chains.clone()
    }
}
