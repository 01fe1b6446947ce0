// Copyright (c) 2026 the srcpack contributors
// SPDX-License-Identifier: Apache-2.0

//! Provider-backed trees.
//!
//! A [`DocumentProvider`] hands out documents by opaque id, the way a content
//! provider or a sandboxed tree grant does. Access is scoped: once the grant
//! is revoked every query fails with `PermissionDenied`, which the packer
//! treats as fatal for the invocation.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::{NodeReader, VirtualNode, access_revoked, not_a_file};

/// Row returned by a provider query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentInfo {
    /// Opaque identifier, only meaningful to the provider that issued it
    pub id: String,
    pub display_name: String,
    pub is_dir: bool,
    pub size: u64,
}

pub trait DocumentProvider: Send + Sync {
    /// The document the grant is rooted at.
    fn root(&self) -> io::Result<DocumentInfo>;

    fn query_children(&self, parent_id: &str) -> io::Result<Vec<DocumentInfo>>;

    fn open_document(&self, id: &str) -> io::Result<NodeReader>;
}

/// [`VirtualNode`] over any [`DocumentProvider`]. Listings re-query the provider.
#[derive(Clone)]
pub struct ProviderNode {
    provider: Arc<dyn DocumentProvider>,
    info: DocumentInfo,
}

impl ProviderNode {
    pub fn root(provider: Arc<dyn DocumentProvider>) -> io::Result<Self> {
        let info = provider.root()?;
        Ok(Self { provider, info })
    }

    pub fn info(&self) -> &DocumentInfo {
        &self.info
    }
}

impl std::fmt::Debug for ProviderNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderNode")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

impl VirtualNode for ProviderNode {
    fn name(&self) -> &str {
        &self.info.display_name
    }

    fn is_dir(&self) -> bool {
        self.info.is_dir
    }

    fn size(&self) -> u64 {
        self.info.size
    }

    fn children(&self) -> io::Result<Vec<Box<dyn VirtualNode>>> {
        if !self.info.is_dir {
            return Ok(Vec::new());
        }
        let rows = self.provider.query_children(&self.info.id)?;
        Ok(rows
            .into_iter()
            .map(|info| {
                Box::new(ProviderNode {
                    provider: Arc::clone(&self.provider),
                    info,
                }) as Box<dyn VirtualNode>
            })
            .collect())
    }

    fn open(&self) -> io::Result<NodeReader> {
        if self.info.is_dir {
            return Err(not_a_file(&self.info.display_name));
        }
        self.provider.open_document(&self.info.id)
    }
}

/// A revocable grant over one local directory.
///
/// Document ids are `/`-separated paths relative to the granted directory;
/// ids that try to climb out of it are refused.
#[derive(Debug)]
pub struct ScopedTreeProvider {
    root: PathBuf,
    granted: AtomicBool,
}

impl ScopedTreeProvider {
    pub fn new(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        if !fs::metadata(&root)?.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a directory", root.display()),
            ));
        }
        Ok(Self {
            root,
            granted: AtomicBool::new(true),
        })
    }

    /// Withdraw access. Nodes already handed out start failing immediately.
    pub fn revoke(&self) {
        self.granted.store(false, Ordering::SeqCst);
    }

    pub fn is_granted(&self) -> bool {
        self.granted.load(Ordering::SeqCst)
    }

    fn check_grant(&self) -> io::Result<()> {
        if self.is_granted() {
            Ok(())
        } else {
            Err(access_revoked(self.root.display().to_string()))
        }
    }

    fn resolve(&self, id: &str) -> io::Result<PathBuf> {
        self.check_grant()?;
        if id.is_empty() {
            return Ok(self.root.clone());
        }
        let relative = Path::new(id);
        if !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("document '{}' is outside the granted tree", id),
            ));
        }
        Ok(self.root.join(relative))
    }

    fn describe(&self, id: String, path: &Path) -> io::Result<DocumentInfo> {
        let metadata = fs::metadata(path)?;
        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Ok(DocumentInfo {
            id,
            display_name,
            is_dir: metadata.is_dir(),
            size: if metadata.is_dir() { 0 } else { metadata.len() },
        })
    }
}

impl DocumentProvider for ScopedTreeProvider {
    fn root(&self) -> io::Result<DocumentInfo> {
        let path = self.resolve("")?;
        let canonical = fs::canonicalize(&path).unwrap_or(path);
        self.describe(String::new(), &canonical)
    }

    fn query_children(&self, parent_id: &str) -> io::Result<Vec<DocumentInfo>> {
        let dir = self.resolve(parent_id)?;
        let mut rows = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let id = if parent_id.is_empty() {
                name
            } else {
                format!("{}/{}", parent_id, name)
            };
            match self.describe(id, &entry.path()) {
                Ok(row) => rows.push(row),
                Err(e) => tracing::warn!("Skipping document {}: {}", entry.path().display(), e),
            }
        }
        Ok(rows)
    }

    fn open_document(&self, id: &str) -> io::Result<NodeReader> {
        let path = self.resolve(id)?;
        Ok(Box::new(fs::File::open(path)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn granted_tree() -> (tempfile::TempDir, Arc<ScopedTreeProvider>) {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        fs::create_dir(dir.path().join("src")).expect("Failed to create dir");
        fs::write(dir.path().join("src/lib.rs"), "pub fn x() {}\n").expect("Failed to write");
        let provider = Arc::new(ScopedTreeProvider::new(dir.path()).expect("provider"));
        (dir, provider)
    }

    #[test]
    fn test_provider_node_walks_tree() {
        let (_dir, provider) = granted_tree();
        let root = ProviderNode::root(provider).expect("root");
        assert!(root.is_dir());

        let children = root.children().expect("children");
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].name(), "src");

        let files = children[0].children().expect("src children");
        assert_eq!(files[0].name(), "lib.rs");
        let mut body = String::new();
        files[0]
            .open()
            .expect("open")
            .read_to_string(&mut body)
            .expect("read");
        assert_eq!(body, "pub fn x() {}\n");
    }

    #[test]
    fn test_revoked_grant_denies_access() {
        let (_dir, provider) = granted_tree();
        let root = ProviderNode::root(Arc::clone(&provider) as Arc<dyn DocumentProvider>)
            .expect("root");
        provider.revoke();

        let err = root.children().expect_err("revoked listing");
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
        assert!(crate::vfs::is_access_revoked(&err));
    }

    #[test]
    fn test_ids_cannot_escape_grant() {
        let (_dir, provider) = granted_tree();
        let err = provider
            .open_document("../etc/passwd")
            .err()
            .expect("escape attempt");
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
        assert!(!crate::vfs::is_access_revoked(&err));
    }
}
