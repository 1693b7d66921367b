use std::time::Duration;

use anyhow::Result as AnyResult;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use super::traits::{Reading, ReadingId, ReadingStore};
use crate::error::{EngineError, Result};

/// Reading store reached over HTTP at `GET {base_url}/api/readings/{id}`.
pub struct HttpReadingStore {
    client: Client,
    base_url: String,
}

/// Response envelope of the reading service.
#[derive(Debug, Deserialize)]
struct ReadingEnvelope {
    ok: bool,
    #[serde(default)]
    reading: Option<Reading>,
    #[serde(default)]
    error: Option<String>,
}

impl HttpReadingStore {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> AnyResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn reading_url(&self, id: ReadingId) -> String {
        format!("{}/api/readings/{}", self.base_url, id)
    }
}

#[async_trait]
impl ReadingStore for HttpReadingStore {
    async fn fetch_reading(&self, id: ReadingId) -> Result<Reading> {
        let url = self.reading_url(id);
        let resp = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                warn!("reading fetch timed out url={}", url);
                EngineError::Unavailable(format!("reading service timed out: {}", e))
            } else {
                warn!("reading fetch failed url={}: {}", url, e);
                EngineError::Unavailable(format!("reading service unreachable: {}", e))
            }
        })?;

        let status = resp.status();
        debug!("reading fetch status={} url={}", status.as_u16(), url);
        if status == StatusCode::NOT_FOUND {
            return Err(EngineError::NotFound(format!("reading {} not found", id)));
        }
        if !status.is_success() {
            warn!("reading fetch failed status={} url={}", status.as_u16(), url);
            return Err(EngineError::Unavailable(format!(
                "reading service returned HTTP {}",
                status.as_u16()
            )));
        }

        let envelope: ReadingEnvelope = resp.json().await.map_err(|e| {
            warn!("reading fetch returned malformed body url={}: {}", url, e);
            EngineError::Unavailable(format!("malformed reading payload: {}", e))
        })?;

        match envelope {
            ReadingEnvelope {
                ok: true,
                reading: Some(reading),
                ..
            } => Ok(reading),
            ReadingEnvelope { error, .. } => Err(EngineError::NotFound(
                error.unwrap_or_else(|| format!("reading {} not found", id)),
            )),
        }
    }
}
