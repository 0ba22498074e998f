// Repository trait for persisted dashboard snapshots
use std::fmt;

/// Independently stored blobs of a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapshotKey {
    Widgets,
    Layouts,
}

impl SnapshotKey {
    pub const ALL: [SnapshotKey; 2] = [SnapshotKey::Widgets, SnapshotKey::Layouts];

    pub fn as_str(self) -> &'static str {
        match self {
            SnapshotKey::Widgets => "widgets",
            SnapshotKey::Layouts => "layouts",
        }
    }
}

impl fmt::Display for SnapshotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub trait SnapshotRepository: Send {
    /// Stored blob for the key, `None` when nothing was saved yet
    fn load(&self, key: SnapshotKey) -> anyhow::Result<Option<String>>;

    fn save(&self, key: SnapshotKey, blob: &str) -> anyhow::Result<()>;

    /// Removes the blob; clearing a missing key is not an error
    fn clear(&self, key: SnapshotKey) -> anyhow::Result<()>;
}
