//! Progress store adapter
//!
//! Typed access to the host's key-value storage:
//! - `watchProgress:{contentId}:{episodeId|_}` -> `{currentTime, duration, lastUpdated}`
//! - `resumePreference` -> one of three preference strings

use crate::{types::ContentKey, Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Key of the global resume preference
pub const RESUME_PREFERENCE_KEY: &str = "resumePreference";

/// External persisted key-value storage
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    async fn set(&self, key: &str, value: String) -> anyhow::Result<()>;
    async fn remove(&self, key: &str) -> anyhow::Result<()>;
}

/// In-process store, used by tests and hosts without persistent storage
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> anyhow::Result<()> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> anyhow::Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

/// Saved playback position for one content item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchProgress {
    /// Position in seconds
    pub current_time: f64,
    /// Content duration in seconds
    pub duration: f64,
    /// When the record was written
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_updated: DateTime<Utc>,
}

impl WatchProgress {
    /// Create a record stamped now, clamping the position into `[0, duration]`
    pub fn new(current_time: f64, duration: f64) -> Self {
        Self::at(current_time, duration, Utc::now())
    }

    pub fn at(current_time: f64, duration: f64, last_updated: DateTime<Utc>) -> Self {
        let duration = duration.max(0.0);
        Self {
            current_time: current_time.clamp(0.0, duration),
            duration,
            last_updated,
        }
    }

    /// Fraction of the content watched, `None` when the duration is unknown
    pub fn watched_fraction(&self) -> Option<f64> {
        (self.duration > 0.0).then(|| self.current_time / self.duration)
    }
}

/// Process-wide answer to "resume where you left off?"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResumePreference {
    #[default]
    AlwaysAsk,
    AlwaysResume,
    AlwaysStartOver,
}

impl ResumePreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResumePreference::AlwaysAsk => "alwaysAsk",
            ResumePreference::AlwaysResume => "alwaysResume",
            ResumePreference::AlwaysStartOver => "alwaysStartOver",
        }
    }
}

impl std::fmt::Display for ResumePreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ResumePreference {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "alwaysAsk" => Ok(ResumePreference::AlwaysAsk),
            "alwaysResume" => Ok(ResumePreference::AlwaysResume),
            "alwaysStartOver" => Ok(ResumePreference::AlwaysStartOver),
            other => Err(Error::Storage(format!("unknown resume preference {other:?}"))),
        }
    }
}

/// Typed wrapper over a [`KeyValueStore`]
#[derive(Clone)]
pub struct ProgressStore {
    backend: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for ProgressStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressStore").finish_non_exhaustive()
    }
}

impl ProgressStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    /// Store backed by a fresh [`MemoryStore`]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Load saved progress for a content item
    pub async fn load_progress(&self, key: &ContentKey) -> Result<Option<WatchProgress>> {
        let storage_key = key.storage_key();
        let Some(raw) = self.backend.get(&storage_key).await.map_err(Error::storage)? else {
            return Ok(None);
        };
        let progress: WatchProgress = serde_json::from_str(&raw)?;
        debug!(key = %storage_key, current_time = progress.current_time, "Loaded watch progress");
        Ok(Some(progress))
    }

    /// Upsert progress, returning `false` when the record was not worth writing
    pub async fn save_progress(&self, key: &ContentKey, progress: &WatchProgress) -> Result<bool> {
        if progress.duration <= 0.0 {
            debug!(key = %key, "Skipping progress save without a known duration");
            return Ok(false);
        }

        let storage_key = key.storage_key();
        let record = WatchProgress::at(progress.current_time, progress.duration, progress.last_updated);
        let payload = serde_json::to_string(&record)?;
        self.backend
            .set(&storage_key, payload)
            .await
            .map_err(|err| Error::Persistence {
                key: storage_key.clone(),
                reason: format!("{err:#}"),
            })?;

        debug!(key = %storage_key, current_time = record.current_time, "Saved watch progress");
        Ok(true)
    }

    /// Forget saved progress for a content item
    pub async fn remove_progress(&self, key: &ContentKey) -> Result<()> {
        self.backend
            .remove(&key.storage_key())
            .await
            .map_err(Error::storage)
    }

    /// Read the resume preference, falling back to the default for unknown values
    pub async fn load_preference(&self) -> Result<ResumePreference> {
        let raw = self
            .backend
            .get(RESUME_PREFERENCE_KEY)
            .await
            .map_err(Error::storage)?;

        Ok(match raw {
            None => ResumePreference::default(),
            Some(value) => value.parse().unwrap_or_else(|err: Error| {
                warn!(error = %err, "Ignoring stored resume preference");
                ResumePreference::default()
            }),
        })
    }

    pub async fn save_preference(&self, preference: ResumePreference) -> Result<()> {
        self.backend
            .set(RESUME_PREFERENCE_KEY, preference.as_str().to_string())
            .await
            .map_err(Error::storage)?;
        debug!(preference = %preference, "Saved resume preference");
        Ok(())
    }
}
