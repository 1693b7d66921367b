use std::sync::Arc;

use anyhow::Result;

use crate::config::EngineConfig;
use crate::engine::cache::ReadingCache;
use crate::engine::scheduler::PriorityScheduler;
use crate::source::build_store;
use crate::source::traits::ReadingStore;

/// Engines shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<ReadingCache>,
    pub scheduler: Arc<PriorityScheduler>,
}

impl AppState {
    pub fn new(cache: ReadingCache, scheduler: PriorityScheduler) -> Self {
        Self {
            cache: Arc::new(cache),
            scheduler: Arc::new(scheduler),
        }
    }

    /// Build both engines over an explicit reading store.
    pub fn with_store(config: &EngineConfig, store: Arc<dyn ReadingStore>) -> Result<Self> {
        config.validate()?;
        let cache = ReadingCache::new(config.cache_capacity, store)?;
        let scheduler = PriorityScheduler::new(config.max_run_ticks);
        Ok(Self::new(cache, scheduler))
    }

    /// Build both engines, with the reading store the config selects.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let store = build_store(&config.store)?;
        Self::with_store(config, store)
    }
}
