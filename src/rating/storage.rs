//! Aggregation state storage interface and implementations
//!
//! This module defines the interface for persisting and retrieving the whole
//! aggregation state, with a JSON file implementation for production and
//! in-memory implementations for tests.

use crate::error::RankingError;
use crate::rating::state::AggregationState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, info};

/// Format version written into every snapshot
pub const SNAPSHOT_VERSION: u32 = 1;

/// On-disk envelope around the aggregation state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateFile {
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    pub state: AggregationState,
}

/// Trait for whole-state storage operations
pub trait StateStore: Send + Sync {
    /// Load the last saved state; `None` when nothing was saved yet
    fn load(&self) -> crate::error::Result<Option<AggregationState>>;

    /// Replace the stored state with `state`
    fn save(&self, state: &AggregationState) -> crate::error::Result<()>;
}

/// JSON snapshot on the local filesystem
///
/// Saves go to a sibling temp file that is synced and then renamed over the
/// target, so a crash mid-save leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct JsonFileStateStore {
    path: PathBuf,
}

impl JsonFileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "state.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl StateStore for JsonFileStateStore {
    fn load(&self) -> crate::error::Result<Option<AggregationState>> {
        let raw = match std::fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No state file at {}", self.path.display());
                return Ok(None);
            }
            Err(e) => return Err(RankingError::persistence(&self.path, e).into()),
        };

        let file: StateFile = serde_json::from_slice(&raw)
            .map_err(|e| RankingError::persistence(&self.path, format!("corrupt snapshot: {}", e)))?;

        if file.version != SNAPSHOT_VERSION {
            return Err(RankingError::persistence(
                &self.path,
                format!("unsupported snapshot version {}", file.version),
            )
            .into());
        }

        file.state
            .check_consistency()
            .map_err(|e| RankingError::persistence(&self.path, format!("corrupt snapshot: {}", e)))?;

        info!(
            "Loaded state from {} ({} players, {} tournaments, saved {})",
            self.path.display(),
            file.state.len(),
            file.state.imported_tournaments().len(),
            file.saved_at
        );
        Ok(Some(file.state))
    }

    fn save(&self, state: &AggregationState) -> crate::error::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| RankingError::persistence(parent, e))?;
        }

        let file = StateFile {
            version: SNAPSHOT_VERSION,
            saved_at: Utc::now(),
            state: state.clone(),
        };
        let bytes = serde_json::to_vec_pretty(&file)
            .map_err(|e| RankingError::persistence(&self.path, e))?;

        let temp_path = self.temp_path();
        {
            let mut temp = std::fs::File::create(&temp_path)
                .map_err(|e| RankingError::persistence(&temp_path, e))?;
            temp.write_all(&bytes)
                .and_then(|_| temp.sync_all())
                .map_err(|e| RankingError::persistence(&temp_path, e))?;
        }
        std::fs::rename(&temp_path, &self.path)
            .map_err(|e| RankingError::persistence(&self.path, e))?;

        info!(
            "Saved state to {} ({} players, {} bytes)",
            self.path.display(),
            state.len(),
            bytes.len()
        );
        Ok(())
    }
}

/// In-memory state storage implementation
#[derive(Debug, Default)]
pub struct InMemoryStateStore {
    state: RwLock<Option<AggregationState>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `state`
    pub fn with_state(state: AggregationState) -> Self {
        Self {
            state: RwLock::new(Some(state)),
        }
    }
}

impl StateStore for InMemoryStateStore {
    fn load(&self) -> crate::error::Result<Option<AggregationState>> {
        let state = self
            .state
            .read()
            .map_err(|_| RankingError::PersistenceFailure {
                path: "<memory>".to_string(),
                reason: "Failed to acquire state read lock".to_string(),
            })?;

        Ok(state.clone())
    }

    fn save(&self, state: &AggregationState) -> crate::error::Result<()> {
        let mut stored = self
            .state
            .write()
            .map_err(|_| RankingError::PersistenceFailure {
                path: "<memory>".to_string(),
                reason: "Failed to acquire state write lock".to_string(),
            })?;

        *stored = Some(state.clone());
        Ok(())
    }
}

/// Mock state storage for testing
///
/// Records every save and can be told to fail saves.
#[derive(Debug, Default)]
pub struct MockStateStore {
    inner: InMemoryStateStore,
    save_calls: RwLock<Vec<AggregationState>>,
    fail_saves: RwLock<bool>,
}

impl MockStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all saved states (for testing)
    pub fn get_save_calls(&self) -> Vec<AggregationState> {
        self.save_calls
            .read()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    /// Make subsequent saves fail with a persistence error
    pub fn set_fail_saves(&self, fail: bool) {
        if let Ok(mut flag) = self.fail_saves.write() {
            *flag = fail;
        }
    }

    /// Preset the stored state for testing
    pub fn preset_state(&self, state: AggregationState) -> crate::error::Result<()> {
        self.inner.save(&state)
    }
}

impl StateStore for MockStateStore {
    fn load(&self) -> crate::error::Result<Option<AggregationState>> {
        self.inner.load()
    }

    fn save(&self, state: &AggregationState) -> crate::error::Result<()> {
        if self.fail_saves.read().map(|f| *f).unwrap_or(false) {
            return Err(RankingError::PersistenceFailure {
                path: "<mock>".to_string(),
                reason: "save disabled".to_string(),
            }
            .into());
        }

        if let Ok(mut calls) = self.save_calls.write() {
            calls.push(state.clone());
        }
        self.inner.save(state)
    }
}
