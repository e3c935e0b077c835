//! JSON file storage implementation.
//!
//! Stores every goal's history in a single `snapshots.json` file mapping goal
//! id to an array of snapshots, and keeps per-goal version markers
//! (version + updated_at) in `snapshots.meta.json`.
//!
//! Reads never fail on bad data: a missing, unreadable or malformed file
//! degrades to empty histories. Writes are serialised in-process and checked
//! against the per-goal version, so a writer holding a stale history gets a
//! `Conflict` instead of silently clobbering a newer one.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use goalpace_core::{GoalId, History, Snapshot, Time};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{Result, SnapshotStore, StorageError};

const DATA_FILE: &str = "snapshots.json";
const META_FILE: &str = "snapshots.meta.json";

/// Per-goal version marker.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct GoalMeta {
    version: u64,
    updated_at: Time,
}

/// Raw contents of the data file.
enum DataFile {
    /// File absent
    Missing,
    /// Goal id -> raw snapshot array
    Parsed(BTreeMap<String, serde_json::Value>),
    /// File present but unreadable or not a JSON object
    Corrupt(String),
}

/// File-based JSON snapshot store.
pub struct JsonSnapshotStore {
    root: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl JsonSnapshotStore {
    /// Create storage rooted at `root`, creating the directory if needed.
    pub async fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;

        Ok(Self {
            root,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Directory holding the store files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn data_path(&self) -> PathBuf {
        self.root.join(DATA_FILE)
    }

    fn meta_path(&self) -> PathBuf {
        self.root.join(META_FILE)
    }

    async fn read_data(&self) -> DataFile {
        let path = self.data_path();
        let raw = match fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return DataFile::Missing,
            Err(e) => return DataFile::Corrupt(e.to_string()),
        };

        if raw.trim().is_empty() {
            return DataFile::Parsed(BTreeMap::new());
        }

        match serde_json::from_str(&raw) {
            Ok(map) => DataFile::Parsed(map),
            Err(e) => DataFile::Corrupt(e.to_string()),
        }
    }

    async fn read_meta(&self) -> BTreeMap<String, GoalMeta> {
        match fs::read_to_string(self.meta_path()).await {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!("Ignoring malformed snapshot meta file: {}", e);
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        }
    }

    /// Version-checked write of one goal's history. Caller holds `write_lock`.
    ///
    /// The meta file is bumped before the data file, so a failure between the
    /// two leaves a newer version over unchanged data and stale writers still
    /// get a `Conflict`.
    async fn write_history(
        &self,
        goal_id: &GoalId,
        snapshots: &[Snapshot],
        expected_version: u64,
    ) -> Result<u64> {
        let mut meta = self.read_meta().await;
        let found = meta.get(goal_id.as_str()).map(|m| m.version).unwrap_or(0);
        if found != expected_version {
            return Err(StorageError::Conflict {
                goal: goal_id.clone(),
                expected: expected_version,
                found,
            });
        }

        let mut data = match self.read_data().await {
            DataFile::Missing => BTreeMap::new(),
            DataFile::Parsed(map) => map,
            DataFile::Corrupt(reason) => {
                // Keep the unreadable file around instead of overwriting it
                let backup = self.root.join(format!("{}.corrupt", DATA_FILE));
                warn!(
                    "Snapshot file is unreadable ({}), moving it to {}",
                    reason,
                    backup.display()
                );
                fs::rename(self.data_path(), &backup).await?;
                BTreeMap::new()
            }
        };
        data.insert(goal_id.to_string(), serde_json::to_value(snapshots)?);

        let version = found + 1;
        meta.insert(
            goal_id.to_string(),
            GoalMeta {
                version,
                updated_at: chrono::Utc::now(),
            },
        );
        write_json(&self.meta_path(), &meta).await?;
        write_json(&self.data_path(), &data).await?;

        debug!("Saved {} snapshots for goal {} at version {}", snapshots.len(), goal_id, version);
        Ok(version)
    }

    /// Parse one goal's raw entry, degrading to empty on malformed content.
    fn parse_goal(goal_id: &GoalId, raw: serde_json::Value) -> Vec<Snapshot> {
        serde_json::from_value(raw).unwrap_or_else(|e| {
            warn!("Malformed history for goal {}, treating as empty: {}", goal_id, e);
            Vec::new()
        })
    }
}

#[async_trait::async_trait]
impl SnapshotStore for JsonSnapshotStore {
    async fn load_history(&self, goal_id: &GoalId) -> Result<History> {
        let mut data = match self.read_data().await {
            DataFile::Missing => return Ok(History::empty(goal_id.clone())),
            DataFile::Corrupt(reason) => {
                warn!(
                    "Snapshot file {} is unreadable, treating history as empty: {}",
                    self.data_path().display(),
                    reason
                );
                BTreeMap::new()
            }
            DataFile::Parsed(map) => map,
        };

        let version = self
            .read_meta()
            .await
            .get(goal_id.as_str())
            .map(|m| m.version)
            .unwrap_or(0);

        let snapshots = data
            .remove(goal_id.as_str())
            .map(|raw| Self::parse_goal(goal_id, raw))
            .unwrap_or_default();

        debug!(
            "Loaded {} snapshots for goal {} (version {})",
            snapshots.len(),
            goal_id,
            version
        );
        Ok(History::from_snapshots(goal_id.clone(), snapshots, version))
    }

    async fn save_history(
        &self,
        goal_id: &GoalId,
        snapshots: &[Snapshot],
        expected_version: u64,
    ) -> Result<u64> {
        let _guard = self.write_lock.lock().await;
        self.write_history(goal_id, snapshots, expected_version).await
    }

    async fn record_snapshot(&self, goal_id: &GoalId, snapshot: Snapshot) -> Result<History> {
        // Held across the whole read-modify-write so in-process writers queue
        let _guard = self.write_lock.lock().await;

        let mut history = self.load_history(goal_id).await?;
        let replaced = history.upsert(snapshot);
        history.version = self
            .write_history(goal_id, &history.snapshots, history.version)
            .await?;

        info!(
            "Recorded snapshot for goal {} on {} ({})",
            goal_id,
            snapshot.date,
            if replaced { "overwrote" } else { "appended" }
        );
        Ok(history)
    }

    async fn list_goals(&self) -> Result<Vec<GoalId>> {
        Ok(match self.read_data().await {
            DataFile::Parsed(map) => map
                .into_iter()
                .filter(|(_, raw)| raw.as_array().map(|a| !a.is_empty()).unwrap_or(false))
                .map(|(id, _)| GoalId::new(id))
                .collect(),
            DataFile::Missing | DataFile::Corrupt(_) => Vec::new(),
        })
    }
}

/// Write pretty JSON via a temp file + rename so readers never see a partial file.
async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json.as_bytes()).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}
