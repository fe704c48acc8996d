//! Sequential tree walker with symlink and depth safety.
//!
//! Every pass walks both trees from scratch; nothing is cached between passes.
//! A directory is always visited before anything beneath it, and the visitor
//! decides whether the walk descends into it. Children are visited in file-name
//! order so that passes are reproducible.
//!
//! A symlink is reported with the kind and metadata of its target, so linked
//! files are mirrored as regular files. Linked directories are only descended
//! when following is enabled, and only then does `max_depth` apply, since a
//! link is the only way a walk can cycle.

#![allow(missing_docs)]

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::core::errors::SyncError;

/// Walker configuration derived from `SyncConfig`.
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    pub root: PathBuf,
    /// Deepest level descended through symlinks. Ignored when not following.
    pub max_depth: usize,
    pub follow_symlinks: bool,
}

/// What an entry is, as far as mirroring cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    /// Dangling symlinks, sockets, fifos, devices.
    Other,
}

/// Metadata collected for each filesystem entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryMetadata {
    pub kind: EntryKind,
    pub size_bytes: u64,
    pub modified: SystemTime,
}

impl EntryMetadata {
    pub fn from_fs(meta: &fs::Metadata) -> Self {
        let ft = meta.file_type();
        let kind = if ft.is_file() {
            EntryKind::File
        } else if ft.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::Other
        };
        Self {
            kind,
            size_bytes: meta.len(),
            modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// A single entry discovered during a walk.
#[derive(Debug, Clone)]
pub struct WalkEntry {
    pub path: PathBuf,
    /// Metadata of the link target when `via_symlink` is set.
    pub metadata: EntryMetadata,
    /// 1 for direct children of the root.
    pub depth: usize,
    pub via_symlink: bool,
}

/// Visitor verdict for a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    Descend,
    /// Do not walk beneath this entry (e.g. it was just removed).
    Prune,
}

/// Single-threaded pre-order walker.
pub struct TreeWalker {
    config: WalkerConfig,
}

impl TreeWalker {
    pub fn new(config: WalkerConfig) -> Self {
        Self { config }
    }

    /// Walk the tree, calling `visit` for every entry below the root.
    ///
    /// Unreadable directories, entries that vanish between listing and stat,
    /// and directories left unwalked at the depth limit are collected and
    /// returned; the walk itself never aborts.
    pub fn walk<F>(&self, mut visit: F) -> Vec<SyncError>
    where
        F: FnMut(&WalkEntry) -> Visit,
    {
        let mut errors = Vec::new();
        let mut stack: Vec<(PathBuf, usize)> = vec![(self.config.root.clone(), 0)];

        while let Some((dir_path, depth)) = stack.pop() {
            let children = match sorted_children(&dir_path, &mut errors) {
                Ok(children) => children,
                Err(err) => {
                    errors.push(SyncError::io("read directory", &dir_path, err));
                    continue;
                }
            };

            let mut subdirs = Vec::new();
            for child_path in children {
                let (meta, via_symlink) = match inspect(&child_path) {
                    Ok(found) => found,
                    Err(err) => {
                        errors.push(SyncError::io("inspect", &child_path, err));
                        continue;
                    }
                };

                let entry = WalkEntry {
                    path: child_path,
                    metadata: EntryMetadata::from_fs(&meta),
                    depth: depth + 1,
                    via_symlink,
                };

                if visit(&entry) == Visit::Prune || !entry.metadata.is_dir() {
                    continue;
                }
                if !self.config.follow_symlinks {
                    if !entry.via_symlink {
                        subdirs.push(entry.path);
                    }
                } else if entry.depth < self.config.max_depth {
                    subdirs.push(entry.path);
                } else {
                    errors.push(SyncError::DepthLimit {
                        path: entry.path,
                        max_depth: self.config.max_depth,
                    });
                }
            }

            // Reverse so the first sibling is popped first.
            stack.extend(subdirs.into_iter().rev().map(|p| (p, depth + 1)));
        }

        errors
    }

    /// Walk without pruning and return every entry plus any errors.
    pub fn collect(&self) -> (Vec<WalkEntry>, Vec<SyncError>) {
        let mut entries = Vec::new();
        let errors = self.walk(|entry| {
            entries.push(entry.clone());
            Visit::Descend
        });
        (entries, errors)
    }
}

/// List `dir` in name order. Entries that fail to list are recorded in
/// `errors` and skipped.
fn sorted_children(dir: &Path, errors: &mut Vec<SyncError>) -> io::Result<Vec<PathBuf>> {
    let listing = fs::read_dir(dir)?.map(|entry| entry.map(|e| e.path()));
    Ok(sort_listing(dir, listing, errors))
}

fn sort_listing<I>(dir: &Path, listing: I, errors: &mut Vec<SyncError>) -> Vec<PathBuf>
where
    I: IntoIterator<Item = io::Result<PathBuf>>,
{
    let mut children = Vec::new();
    for entry in listing {
        match entry {
            Ok(path) => children.push(path),
            Err(err) => errors.push(SyncError::io("list entry in", dir, err)),
        }
    }
    children.sort();
    children
}

/// Metadata of `path`, resolved through a symlink when there is one.
///
/// A dangling link keeps its own `lstat` metadata and so reads as `Other`.
fn inspect(path: &Path) -> io::Result<(fs::Metadata, bool)> {
    let own = fs::symlink_metadata(path)?;
    if !own.file_type().is_symlink() {
        return Ok((own, false));
    }
    Ok((fs::metadata(path).unwrap_or(own), true))
}
