// Copyright (c) 2026 the srcpack contributors
// SPDX-License-Identifier: Apache-2.0

//! Backend-agnostic view of a source tree.
//!
//! Every source srcpack can read (a local directory, a permission-scoped
//! provider grant, a downloaded zip archive) is exposed through the
//! [`VirtualNode`] trait. The traversal code in [`crate::packer`] only ever sees
//! `&dyn VirtualNode`, so there is no backend-specific branching in the engine.
//!
//! Backends never filter. Deciding what to show or skip belongs to
//! [`crate::packer::filter`].

pub mod archive;
pub mod local;
pub mod provider;

use std::io::{self, Read};

pub use archive::{ArchiveNode, index_archive};
pub use local::FsNode;
pub use provider::{DocumentInfo, DocumentProvider, ProviderNode, ScopedTreeProvider};

/// A readable byte stream handed out by [`VirtualNode::open`].
pub type NodeReader = Box<dyn Read + Send>;

/// A file or directory handle, independent of where the bytes live.
///
/// `children()` may hit the disk or a remote provider on every call; callers
/// should not assume repeated calls are cheap or return the same order.
pub trait VirtualNode: Send + Sync {
    /// Entry name without any parent components.
    fn name(&self) -> &str;

    fn is_dir(&self) -> bool;

    /// Byte length. Only meaningful for files; directories report 0.
    fn size(&self) -> u64;

    /// Immediate children, in no particular order. Files return an empty list.
    fn children(&self) -> io::Result<Vec<Box<dyn VirtualNode>>>;

    /// Open the node's content. Fails for directories and for resources that
    /// have disappeared or been revoked since the node was created.
    fn open(&self) -> io::Result<NodeReader>;
}

impl std::fmt::Debug for dyn VirtualNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualNode")
            .field("name", &self.name())
            .field("is_dir", &self.is_dir())
            .field("size", &self.size())
            .finish()
    }
}

/// Marker carried inside an `io::Error` when a backend's access grant has been
/// withdrawn. Unlike an ordinary unreadable file, this aborts the whole pack.
#[derive(Debug, thiserror::Error)]
#[error("access to {0} has been revoked")]
pub struct AccessRevoked(pub String);

pub fn access_revoked(scope: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::PermissionDenied, AccessRevoked(scope.into()))
}

pub fn is_access_revoked(err: &io::Error) -> bool {
    err.get_ref().is_some_and(|inner| inner.is::<AccessRevoked>())
}

/// Error returned by `open()` on a directory node.
pub(crate) fn not_a_file(name: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("{} is a directory", name),
    )
}
