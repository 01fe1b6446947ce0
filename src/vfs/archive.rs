// Copyright (c) 2026 the srcpack contributors
// SPDX-License-Identifier: Apache-2.0

//! Zip archive indexing.
//!
//! The flat entry list of an archive is bucketed by parent path in one pass,
//! then materialized into an in-memory [`ArchiveNode`] tree starting from the
//! root bucket (key `""`). Parent directories without an explicit entry are
//! synthesized. If the root bucket holds exactly one directory (the usual
//! `repo-branch/` wrapper of a downloaded archive), that directory becomes the
//! root. The check is one level deep only.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{self, Cursor, Read, Seek};
use std::path::Path;
use std::sync::{Arc, Mutex};

use zip::ZipArchive;

use super::{NodeReader, VirtualNode, not_a_file};
use crate::utils::error::PackError;

/// Anything a zip archive can be read from.
pub trait ArchiveSource: Read + Seek + Send {}

impl<T: Read + Seek + Send> ArchiveSource for T {}

type SharedArchive = Arc<Mutex<ZipArchive<Box<dyn ArchiveSource>>>>;

/// A node inside an indexed archive. Children are owned by the node and fixed
/// at construction; cloning is cheap.
#[derive(Clone)]
pub struct ArchiveNode {
    name: String,
    is_dir: bool,
    /// Uncompressed size of the entry (0 for directories)
    size: u64,
    /// Index into the archive's central directory; `None` for synthesized nodes
    entry: Option<usize>,
    children: Arc<Vec<ArchiveNode>>,
    archive: SharedArchive,
}

impl std::fmt::Debug for ArchiveNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveNode")
            .field("name", &self.name)
            .field("is_dir", &self.is_dir)
            .field("size", &self.size)
            .field("entry", &self.entry)
            .field("children", &self.children.len())
            .finish_non_exhaustive()
    }
}

/// One archive entry before tree materialization.
#[derive(Debug)]
struct RawEntry {
    /// Full path with trailing separators stripped
    path: String,
    name: String,
    is_dir: bool,
    size: u64,
    index: Option<usize>,
}

/// Split `a/b/c` into (`a/b`, `c`); top-level entries get the empty parent.
fn split_parent(path: &str) -> (&str, &str) {
    path.rsplit_once('/').unwrap_or(("", path))
}

/// Parent-path → entries index, built once per archive and dropped after the
/// tree is materialized.
#[derive(Debug, Default)]
struct EntryIndex {
    buckets: HashMap<String, Vec<RawEntry>>,
    known: HashSet<String>,
}

impl EntryIndex {
    fn insert(&mut self, path: String, is_dir: bool, size: u64, index: Option<usize>) {
        if !self.known.insert(path.clone()) {
            // Duplicate entry, or an explicit directory already synthesized
            // from one of its descendants.
            return;
        }

        self.ensure_ancestors(&path);

        let (parent, name) = split_parent(&path);
        let (parent, name) = (parent.to_string(), name.to_string());
        self.buckets.entry(parent).or_default().push(RawEntry {
            path,
            name,
            is_dir,
            size,
            index,
        });
    }

    fn ensure_ancestors(&mut self, path: &str) {
        let (parent, _) = split_parent(path);
        if parent.is_empty() || self.known.contains(parent) {
            return;
        }
        self.insert(parent.to_string(), true, 0, None);
    }

    fn materialize(&mut self, key: &str, archive: &SharedArchive) -> Vec<ArchiveNode> {
        let Some(entries) = self.buckets.remove(key) else {
            return Vec::new();
        };

        entries
            .into_iter()
            .map(|entry| {
                let children = if entry.is_dir {
                    self.materialize(&entry.path, archive)
                } else {
                    Vec::new()
                };
                ArchiveNode {
                    name: entry.name,
                    is_dir: entry.is_dir,
                    size: entry.size,
                    entry: entry.index,
                    children: Arc::new(children),
                    archive: Arc::clone(archive),
                }
            })
            .collect()
    }
}

/// Open and index a zip archive on local storage.
pub fn open_archive(path: &Path, fallback_root: &str) -> Result<ArchiveNode, PackError> {
    let file = File::open(path).map_err(|e| PackError::ArchiveFormat {
        message: format!("Failed to open archive {}: {}", path.display(), e),
        source: Some(Box::new(e)),
    })?;
    index_archive(file, fallback_root)
}

/// Index an archive and return its root node.
///
/// `fallback_root` names the synthetic root used when the archive does not
/// have a single top-level directory.
pub fn index_archive<R>(reader: R, fallback_root: &str) -> Result<ArchiveNode, PackError>
where
    R: Read + Seek + Send + 'static,
{
    let mut zip = ZipArchive::new(Box::new(reader) as Box<dyn ArchiveSource>)?;

    let mut index = EntryIndex::default();
    for i in 0..zip.len() {
        let entry = zip.by_index_raw(i)?;
        let is_dir = entry.is_dir();
        let size = if is_dir { 0 } else { entry.size() };
        let path = entry.name().replace('\\', "/").trim_end_matches('/').to_string();
        drop(entry);

        if path.is_empty() {
            continue;
        }
        index.insert(path, is_dir, size, Some(i));
    }

    let entry_count = index.known.len();
    let archive: SharedArchive = Arc::new(Mutex::new(zip));
    let mut roots = index.materialize("", &archive);

    tracing::debug!(
        entries = entry_count,
        top_level = roots.len(),
        "Indexed archive"
    );

    if roots.len() == 1 && roots.first().is_some_and(|r| r.is_dir) {
        if let Some(root) = roots.pop() {
            return Ok(root);
        }
    }

    Ok(ArchiveNode {
        name: fallback_root.to_string(),
        is_dir: true,
        size: 0,
        entry: None,
        children: Arc::new(roots),
        archive,
    })
}

impl VirtualNode for ArchiveNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_dir(&self) -> bool {
        self.is_dir
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn children(&self) -> io::Result<Vec<Box<dyn VirtualNode>>> {
        Ok(self
            .children
            .iter()
            .map(|c| Box::new(c.clone()) as Box<dyn VirtualNode>)
            .collect())
    }

    fn open(&self) -> io::Result<NodeReader> {
        if self.is_dir {
            return Err(not_a_file(&self.name));
        }
        let index = self.entry.ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} has no archive entry", self.name),
            )
        })?;

        let mut archive = self
            .archive
            .lock()
            .map_err(|_| io::Error::other("archive handle poisoned"))?;
        let mut entry = archive.by_index(index).map_err(io::Error::other)?;

        // Entries share one seekable handle, so each read is drained before
        // the lock is released.
        let mut bytes = Vec::with_capacity(usize::try_from(self.size).unwrap_or(0));
        entry.read_to_end(&mut bytes)?;
        Ok(Box::new(Cursor::new(bytes)))
    }
}
