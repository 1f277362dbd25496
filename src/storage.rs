// WAF Monitor - Storage
// Copyright (C) 2026 Christos Daggas
// SPDX-License-Identifier: MIT

//! Persistent storage for the dashboard snapshot.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::error::SyncError;
use crate::models::Snapshot;

/// Fixed key the snapshot is stored under.
pub const SESSION_KEY: &str = "dashboard_snapshot";

/// Durable home for the snapshot.
///
/// `save` overwrites whatever was stored before; `load` returns `None` when
/// nothing has been saved.
pub trait SnapshotStore: Send {
    fn save(&self, snapshot: &Snapshot) -> Result<(), SyncError>;
    fn load(&self) -> Result<Option<Snapshot>, SyncError>;
    fn clear(&self) -> Result<(), SyncError>;
}

impl<T: SnapshotStore + Sync + ?Sized> SnapshotStore for std::sync::Arc<T> {
    fn save(&self, snapshot: &Snapshot) -> Result<(), SyncError> {
        (**self).save(snapshot)
    }

    fn load(&self) -> Result<Option<Snapshot>, SyncError> {
        (**self).load()
    }

    fn clear(&self) -> Result<(), SyncError> {
        (**self).clear()
    }
}

/// Read the initial snapshot.
///
/// With `resume` off, anything stored by a previous session is discarded
/// first so the dashboard starts empty and fully resynchronizes. Read errors
/// fall back to an empty snapshot.
pub fn restore(store: &dyn SnapshotStore, resume: bool) -> Snapshot {
    if !resume {
        if let Err(e) = store.clear() {
            warn!("Failed to clear persisted snapshot: {}", e);
        }
        return Snapshot::default();
    }

    match store.load() {
        Ok(Some(mut snapshot)) => {
            snapshot.normalize();
            debug!("Resumed snapshot from previous session");
            snapshot
        }
        Ok(None) => Snapshot::default(),
        Err(e) => {
            warn!("Failed to load persisted snapshot: {}", e);
            Snapshot::default()
        }
    }
}

/// Snapshot stored as a JSON file named after the session key.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Store under the default data directory.
    pub fn new() -> Self {
        let dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("waf-monitor");
        Self::in_dir(&dir)
    }

    /// Store inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            path: dir.join(format!("{}.json", SESSION_KEY)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for JsonFileStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotStore for JsonFileStore {
    fn save(&self, snapshot: &Snapshot) -> Result<(), SyncError> {
        use std::io::Write;
        #[cfg(unix)]
        use std::os::unix::fs::PermissionsExt;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(snapshot)?;

        // Write to a sibling file first so a crash never leaves a torn record.
        let tmp = self.path.with_extension("json.tmp");
        let mut file = fs::File::create(&tmp)?;
        #[cfg(unix)]
        {
            if let Err(e) = file.set_permissions(fs::Permissions::from_mode(0o600)) {
                warn!("Failed to set snapshot file permissions: {}", e);
            }
        }
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn load(&self) -> Result<Option<Snapshot>, SyncError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn clear(&self) -> Result<(), SyncError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Snapshot kept in process memory, serialized the same way as on disk.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemoryStore {
    fn save(&self, snapshot: &Snapshot) -> Result<(), SyncError> {
        let content = serde_json::to_string(snapshot)?;
        let mut data = self
            .data
            .lock()
            .map_err(|_| SyncError::Persistence("memory store poisoned".to_string()))?;
        data.insert(SESSION_KEY.to_string(), content);
        Ok(())
    }

    fn load(&self) -> Result<Option<Snapshot>, SyncError> {
        let data = self
            .data
            .lock()
            .map_err(|_| SyncError::Persistence("memory store poisoned".to_string()))?;
        match data.get(SESSION_KEY) {
            Some(content) => Ok(Some(serde_json::from_str(content)?)),
            None => Ok(None),
        }
    }

    fn clear(&self) -> Result<(), SyncError> {
        let mut data = self
            .data
            .lock()
            .map_err(|_| SyncError::Persistence("memory store poisoned".to_string()))?;
        data.remove(SESSION_KEY);
        Ok(())
    }
}
