//! Applier: executes one classified action against the replica.
//!
//! Each call either fully succeeds or returns the failure; the caller decides
//! whether to count it. Nothing is retried here.

#![allow(missing_docs)]

use std::fs;
use std::path::Path;

use crate::core::errors::Result;
use crate::platform::pal::{FsOps, LocalFs};
use crate::sync::detector::{ActionKind, SyncAction};

/// Applies [`SyncAction`]s through an [`FsOps`] implementation.
pub struct Applier<F: FsOps = LocalFs> {
    fs: F,
    dry_run: bool,
}

impl Applier<LocalFs> {
    #[must_use]
    pub fn local(dry_run: bool) -> Self {
        Self::new(LocalFs, dry_run)
    }
}

impl<F: FsOps> Applier<F> {
    pub fn new(fs: F, dry_run: bool) -> Self {
        Self { fs, dry_run }
    }

    #[must_use]
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Carry out `action`. In dry-run mode nothing is touched and the action
    /// is reported as applied.
    pub fn apply(&self, action: &SyncAction) -> Result<()> {
        if self.dry_run {
            return Ok(());
        }

        match action.kind {
            ActionKind::CreateFile | ActionKind::UpdateFile => {
                if let Some(parent) = action.replica.parent() {
                    self.fs.create_dir_all(parent)?;
                }
                self.clear_unless(&action.replica, fs::FileType::is_file)?;
                self.fs.copy_file(&action.source, &action.replica)?;
            }
            ActionKind::CreateDir => {
                self.clear_unless(&action.replica, fs::FileType::is_dir)?;
                self.fs.create_dir_all(&action.replica)?;
            }
            ActionKind::DeleteFile => self.fs.remove_file(&action.replica)?,
            ActionKind::DeleteDir => self.fs.remove_dir_all(&action.replica)?,
        }
        Ok(())
    }

    /// Remove whatever sits at `path` unless it is already of the wanted kind.
    ///
    /// Symlinks are never written through: a link at the target is removed
    /// and replaced by a real entry.
    fn clear_unless(&self, path: &Path, wanted: fn(&fs::FileType) -> bool) -> Result<()> {
        let Ok(meta) = fs::symlink_metadata(path) else {
            return Ok(());
        };
        let ft = meta.file_type();
        if wanted(&ft) {
            return Ok(());
        }
        if ft.is_dir() {
            self.fs.remove_dir_all(path)
        } else {
            self.fs.remove_file(path)
        }
    }
}
