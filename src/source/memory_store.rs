// In-process reading store: demo seed data and test fixtures.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{json, Map, Value};

use super::traits::{Reading, ReadingId, ReadingStore};
use crate::error::{EngineError, Result};

#[derive(Default)]
pub struct MemoryReadingStore {
    readings: RwLock<HashMap<ReadingId, Reading>>,
}

impl MemoryReadingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_readings(readings: impl IntoIterator<Item = Reading>) -> Self {
        let store = Self::new();
        for reading in readings {
            store.insert(reading);
        }
        store
    }

    /// Store seeded with the six demo readings (ids 1 to 6).
    pub fn sample() -> Self {
        Self::with_readings(sample_readings())
    }

    /// Insert or replace a reading under its own id.
    pub fn insert(&self, reading: Reading) {
        self.readings.write().insert(reading.id, reading);
    }
}

#[async_trait]
impl ReadingStore for MemoryReadingStore {
    async fn fetch_reading(&self, id: ReadingId) -> Result<Reading> {
        self.readings
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(format!("reading {} not found", id)))
    }
}

fn sample(
    id: ReadingId,
    (date, time): (&str, &str),
    glucose: f64,
    context: &str,
    meal: &str,
    note: &str,
) -> Reading {
    let extra: Map<String, Value> = [
        ("user_id", json!(1)),
        ("date", json!(date)),
        ("time", json!(time)),
        ("meal", json!(meal)),
        ("note", json!(note)),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();

    Reading {
        id,
        glucose,
        context: context.to_string(),
        created_at: format!("{}T{}:00Z", date, time),
        extra,
    }
}

/// Demo readings from 2025-11-25 to 2025-11-27.
pub fn sample_readings() -> Vec<Reading> {
    vec![
        sample(1, ("2025-11-25", "08:00"), 95.0, "fasting", "water", "morning check"),
        sample(2, ("2025-11-25", "12:30"), 142.0, "pre-meal", "lunch", "before eating"),
        sample(3, ("2025-11-25", "15:00"), 185.0, "post-meal", "snack", "high reading"),
        sample(4, ("2025-11-26", "06:30"), 65.0, "fasting", "water", "low reading"),
        sample(5, ("2025-11-26", "11:00"), 115.0, "pre-meal", "breakfast", "normal"),
        sample(6, ("2025-11-27", "14:00"), 220.0, "post-meal", "dinner", "elevated"),
    ]
}
