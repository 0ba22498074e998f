// In-memory snapshot repository for ephemeral runs and tests
use crate::application::snapshot_repository::{SnapshotKey, SnapshotRepository};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Clones share the same storage
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshotRepository {
    blobs: Arc<Mutex<HashMap<SnapshotKey, String>>>,
}

impl MemorySnapshotRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn blob(&self, key: SnapshotKey) -> Option<String> {
        self.lock().get(&key).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<SnapshotKey, String>> {
        // A panic while holding the lock cannot leave a half-written blob.
        self.blobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SnapshotRepository for MemorySnapshotRepository {
    fn load(&self, key: SnapshotKey) -> anyhow::Result<Option<String>> {
        Ok(self.blob(key))
    }

    fn save(&self, key: SnapshotKey, blob: &str) -> anyhow::Result<()> {
        self.lock().insert(key, blob.to_string());
        Ok(())
    }

    fn clear(&self, key: SnapshotKey) -> anyhow::Result<()> {
        self.lock().remove(&key);
        Ok(())
    }
}
