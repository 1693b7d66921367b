use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::traits::{Reading, ReadingId, ReadingStore};
use crate::error::{EngineError, Result};

/// Reading store backed by a JSON array file, re-read on every lookup so
/// external writers are picked up without a restart.
pub struct FileReadingStore {
    path: PathBuf,
}

impl FileReadingStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn load(&self) -> Result<Vec<Reading>> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            // Missing file is an empty store.
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                warn!("reading store {} unreadable: {}", self.path.display(), e);
                return Err(EngineError::Unavailable(format!(
                    "reading store unreadable: {}",
                    e
                )));
            }
        };

        serde_json::from_slice(&raw).map_err(|e| {
            warn!("reading store {} malformed: {}", self.path.display(), e);
            EngineError::Unavailable(format!("reading store malformed: {}", e))
        })
    }
}

#[async_trait]
impl ReadingStore for FileReadingStore {
    async fn fetch_reading(&self, id: ReadingId) -> Result<Reading> {
        let readings = self.load().await?;
        debug!(
            "file store {} loaded {} readings",
            self.path.display(),
            readings.len()
        );
        readings
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| EngineError::NotFound(format!("reading {} not found", id)))
    }
}
