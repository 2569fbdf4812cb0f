use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::{ArchiveIndex, Error, Result, Snapshot};

/// JSON snapshot file holding the whole archive index.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    /// Store backed by the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the snapshot file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and decode the snapshot.
    ///
    /// A missing or unreadable file is `ResourceUnavailable`; bad JSON or
    /// missing fields are `MalformedSnapshot`. Both carry the path.
    pub fn load(&self) -> Result<Snapshot> {
        let content = fs::read_to_string(&self.path).map_err(|source| Error::ResourceUnavailable {
            path: self.path.clone(),
            source,
        })?;
        let snapshot: Snapshot =
            serde_json::from_str(&content).map_err(|e| Error::MalformedSnapshot {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;
        debug!("Read {} records from {}", snapshot.len(), self.path.display());
        Ok(snapshot)
    }

    /// Like [`load`](Self::load), but an absent file yields an empty snapshot.
    pub fn load_or_default(&self) -> Result<Snapshot> {
        match self.load() {
            Err(Error::ResourceUnavailable { source, .. })
                if source.kind() == io::ErrorKind::NotFound =>
            {
                info!("No snapshot at {}, starting empty", self.path.display());
                Ok(Snapshot::new())
            },
            other => other,
        }
    }

    /// Load the snapshot and build an index from it.
    ///
    /// Invariant violations inside the file are reported against this path.
    pub fn load_index(&self) -> Result<ArchiveIndex> {
        self.index_from(&self.load()?)
    }

    /// Like [`load_index`](Self::load_index), but an absent file yields an empty index.
    pub fn load_index_or_empty(&self) -> Result<ArchiveIndex> {
        self.index_from(&self.load_or_default()?)
    }

    fn index_from(&self, snapshot: &Snapshot) -> Result<ArchiveIndex> {
        ArchiveIndex::from_snapshot(snapshot).map_err(|err| match err {
            Error::MalformedSnapshot { reason, .. } => Error::MalformedSnapshot {
                path: self.path.clone(),
                reason,
            },
            other => other,
        })
    }

    /// Write the snapshot as pretty JSON, replacing the file atomically.
    pub fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)?;

        let json = serde_json::to_string_pretty(snapshot)?;

        // Write next to the target so the final rename stays on one filesystem.
        let mut tmp = tempfile::NamedTempFile::new_in(&parent)?;
        tmp.write_all(json.as_bytes())?;
        tmp.write_all(b"\n")?;
        tmp.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        info!("Saved {} strips to {}", snapshot.len(), self.path.display());
        Ok(())
    }

    /// Serialize `index` and save it.
    pub fn save_index(&self, index: &ArchiveIndex) -> Result<()> {
        self.save(&index.serialize_snapshot())
    }
}
