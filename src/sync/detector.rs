//! Change detector: compares one entry against its counterpart in the other
//! tree and decides what, if anything, has to happen.
//!
//! Change detection is a size + modification-time heuristic. A source file is
//! recopied when its size differs from the replica copy or its mtime is
//! strictly newer; equal sizes with a non-newer mtime count as in sync without
//! comparing bytes.

#![allow(missing_docs)]

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::core::errors::{Result, SyncError};
use crate::core::paths::mirror_path;
use crate::sync::walker::{EntryKind, EntryMetadata, WalkEntry};

/// Kind of change applied to the replica.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    CreateFile,
    UpdateFile,
    CreateDir,
    DeleteFile,
    DeleteDir,
}

impl ActionKind {
    /// Every kind, in report order.
    pub const ALL: [Self; 5] = [
        Self::CreateFile,
        Self::UpdateFile,
        Self::CreateDir,
        Self::DeleteFile,
        Self::DeleteDir,
    ];

    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::CreateFile => 0,
            Self::UpdateFile => 1,
            Self::CreateDir => 2,
            Self::DeleteFile => 3,
            Self::DeleteDir => 4,
        }
    }

    /// Stats key used in the per-pass report line.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::CreateFile => "created",
            Self::UpdateFile => "updated",
            Self::CreateDir => "dir-created",
            Self::DeleteFile => "file-deleted",
            Self::DeleteDir => "dir-deleted",
        }
    }

    /// Whether this kind removes something from the replica.
    #[must_use]
    pub const fn is_deletion(self) -> bool {
        matches!(self, Self::DeleteFile | Self::DeleteDir)
    }
}

/// A classified change for one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncAction {
    pub kind: ActionKind,
    /// Entry in the source tree. For deletions this is the (absent) mirrored path.
    pub source: PathBuf,
    /// Entry in the replica tree.
    pub replica: PathBuf,
}

/// Decide what a source entry needs, given its replica counterpart (if any).
///
/// A replica entry of the wrong kind is replaced: the applier clears it before
/// copying the file or creating the directory. Source entries that are neither
/// files nor directories are not mirrored.
#[must_use]
pub fn classify(source: &EntryMetadata, replica: Option<&EntryMetadata>) -> Option<ActionKind> {
    match (source.kind, replica) {
        (EntryKind::File, None) => Some(ActionKind::CreateFile),
        (EntryKind::File, Some(replica)) if replica.kind != EntryKind::File => {
            Some(ActionKind::UpdateFile)
        }
        (EntryKind::File, Some(replica)) => {
            let size_differs = source.size_bytes != replica.size_bytes;
            let source_newer = source.modified > replica.modified;
            (size_differs || source_newer).then_some(ActionKind::UpdateFile)
        }
        (EntryKind::Directory, None) => Some(ActionKind::CreateDir),
        (EntryKind::Directory, Some(replica)) => {
            (replica.kind != EntryKind::Directory).then_some(ActionKind::CreateDir)
        }
        (EntryKind::Other, _) => None,
    }
}

/// Decide whether a replica entry is an orphan that must go.
#[must_use]
pub const fn classify_orphan(replica: &EntryMetadata, source_exists: bool) -> Option<ActionKind> {
    if source_exists {
        return None;
    }
    match replica.kind {
        EntryKind::Directory => Some(ActionKind::DeleteDir),
        EntryKind::File | EntryKind::Other => Some(ActionKind::DeleteFile),
    }
}

/// Maps entries between the two roots and reads the counterpart's metadata
/// fresh from disk on every call. Counterparts are never resolved through a
/// symlink: a link in the replica is an entry to replace, not a place to write.
#[derive(Debug, Clone)]
pub struct ChangeDetector {
    source_root: PathBuf,
    replica_root: PathBuf,
}

impl ChangeDetector {
    pub fn new(source_root: &Path, replica_root: &Path) -> Self {
        Self {
            source_root: source_root.to_path_buf(),
            replica_root: replica_root.to_path_buf(),
        }
    }

    /// Classify a source-tree entry against the replica.
    pub fn detect(&self, entry: &WalkEntry) -> Result<Option<SyncAction>> {
        let replica = Self::counterpart(&self.source_root, &self.replica_root, &entry.path)?;
        let replica_meta = Self::probe(&replica)?;
        Ok(
            classify(&entry.metadata, replica_meta.as_ref()).map(|kind| SyncAction {
                kind,
                source: entry.path.clone(),
                replica,
            }),
        )
    }

    /// Classify a replica-tree entry: orphans become deletions.
    pub fn detect_orphan(&self, entry: &WalkEntry) -> Result<Option<SyncAction>> {
        let source = Self::counterpart(&self.replica_root, &self.source_root, &entry.path)?;
        let source_exists = Self::probe(&source)?.is_some();
        Ok(
            classify_orphan(&entry.metadata, source_exists).map(|kind| SyncAction {
                kind,
                source,
                replica: entry.path.clone(),
            }),
        )
    }

    fn counterpart(from_root: &Path, to_root: &Path, path: &Path) -> Result<PathBuf> {
        mirror_path(from_root, to_root, path).ok_or_else(|| SyncError::Runtime {
            details: format!(
                "{} is not under {}",
                path.display(),
                from_root.display()
            ),
        })
    }

    /// Metadata for `path`, `None` when it does not exist.
    ///
    /// Anything other than "not found" is an error; an unreadable counterpart
    /// is never treated as absent.
    fn probe(path: &Path) -> Result<Option<EntryMetadata>> {
        match fs::symlink_metadata(path) {
            Ok(meta) => Ok(Some(EntryMetadata::from_fs(&meta))),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(SyncError::io("inspect", path, err)),
        }
    }
}
