// Reading store abstraction: pluggable backends the cache reads through on a miss.

pub mod file_store;
pub mod http_store;
pub mod memory_store;
pub mod traits;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use crate::config::StoreConfig;
use file_store::FileReadingStore;
use http_store::HttpReadingStore;
use memory_store::MemoryReadingStore;
use traits::ReadingStore;

/// Build the reading store selected by the config.
pub fn build_store(config: &StoreConfig) -> Result<Arc<dyn ReadingStore>> {
    let store: Arc<dyn ReadingStore> = match config {
        StoreConfig::Sample => Arc::new(MemoryReadingStore::sample()),
        StoreConfig::File { path } => Arc::new(FileReadingStore::new(path)),
        StoreConfig::Http {
            base_url,
            timeout_ms,
        } => Arc::new(HttpReadingStore::new(
            base_url.clone(),
            Duration::from_millis(*timeout_ms),
        )?),
    };
    Ok(store)
}
