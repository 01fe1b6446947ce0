// Copyright (c) 2026 the srcpack contributors
// SPDX-License-Identifier: Apache-2.0

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::{NodeReader, VirtualNode, not_a_file};

/// A node backed by the local filesystem.
///
/// Metadata is captured when the node is created; `children()` re-reads the
/// directory on every call.
#[derive(Debug, Clone)]
pub struct FsNode {
    /// Absolute or caller-relative path to the entry
    path: PathBuf,
    /// Final path component, lossily converted to UTF-8
    name: String,
    is_dir: bool,
    /// Size of the file in bytes (0 for directories)
    size: u64,
}

impl FsNode {
    /// Create a node by reading metadata for `path`. Symlinks are followed.
    pub fn new(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let metadata = fs::metadata(&path).map_err(|e| {
            io::Error::new(
                e.kind(),
                format!("Failed to read metadata for {}: {}", path.display(), e),
            )
        })?;

        let name = display_name(&path);
        let is_dir = metadata.is_dir();

        Ok(Self {
            name,
            is_dir,
            size: if is_dir { 0 } else { metadata.len() },
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Name for a path, falling back to the canonical form for `.` or `/`.
fn display_name(path: &Path) -> String {
    if let Some(name) = path.file_name() {
        return name.to_string_lossy().into_owned();
    }
    fs::canonicalize(path)
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

impl VirtualNode for FsNode {
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
        if !self.is_dir {
            return Ok(Vec::new());
        }

        let mut children: Vec<Box<dyn VirtualNode>> = Vec::new();
        for entry in fs::read_dir(&self.path)? {
            let entry = entry?;
            match FsNode::new(entry.path()) {
                Ok(node) => children.push(Box::new(node)),
                Err(e) => {
                    // Dangling symlinks and entries removed mid-listing
                    tracing::warn!("Skipping unreadable entry {}: {}", entry.path().display(), e);
                }
            }
        }
        Ok(children)
    }

    fn open(&self) -> io::Result<NodeReader> {
        if self.is_dir {
            return Err(not_a_file(&self.name));
        }
        Ok(Box::new(fs::File::open(&self.path)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_fs_node_lists_and_reads() {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        fs::write(dir.path().join("a.txt"), "hello").expect("Failed to write file");
        fs::create_dir(dir.path().join("sub")).expect("Failed to create dir");

        let root = FsNode::new(dir.path()).expect("root node");
        assert!(root.is_dir());

        let mut names: Vec<String> = root
            .children()
            .expect("listing")
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["a.txt", "sub"]);

        let file = FsNode::new(dir.path().join("a.txt")).expect("file node");
        assert_eq!(file.size(), 5);
        let mut body = String::new();
        file.open()
            .expect("open")
            .read_to_string(&mut body)
            .expect("read");
        assert_eq!(body, "hello");
    }

    #[test]
    fn test_open_directory_fails() {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let root = FsNode::new(dir.path()).expect("root node");
        assert!(root.open().is_err());
    }

    #[test]
    fn test_missing_path_is_error() {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let err = FsNode::new(dir.path().join("nope")).expect_err("missing path");
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
