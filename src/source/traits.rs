use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

/// Positive integer identifying a reading in the external store.
pub type ReadingId = u64;

/// A glucose reading as served by the reading store. Opaque to the cache:
/// only the fields below are typed, everything else rides along in `extra`
/// and is served back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub id: ReadingId,
    pub glucose: f64,
    pub context: String,
    /// Kept verbatim; the store decides the timestamp format.
    pub created_at: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Reading {
    /// Untyped field carried by the store, e.g. `meal`, `note`, `date`.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.extra.get(name)
    }
}

#[async_trait]
pub trait ReadingStore: Send + Sync {
    /// Look up a reading by id. Absent ids fail with `NotFound`, transport
    /// problems with `Unavailable`.
    async fn fetch_reading(&self, id: ReadingId) -> Result<Reading>;
}
