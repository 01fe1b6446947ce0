// Copyright (c) 2026 the srcpack contributors
// SPDX-License-Identifier: Apache-2.0

//! Source resolution and the async entry point.
//!
//! A [`Source`] is resolved to a root [`VirtualNode`] (or a list of file
//! nodes) and packed on a blocking worker thread, so async callers are never
//! stalled by filesystem or archive I/O.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::packer::{PackOutcome, PackStats, Packer};
use crate::remote;
use crate::utils::error::PackError;
use crate::vfs::{DocumentProvider, FsNode, ProviderNode, VirtualNode, archive};

/// Where the bytes to pack come from.
pub enum Source {
    /// A local directory (or a single file)
    Local(PathBuf),
    /// A zip archive already on local storage
    Archive(PathBuf),
    /// A permission-scoped provider grant
    Provider(Arc<dyn DocumentProvider>),
    /// A GitHub repository reference, downloaded as an archive
    Remote(String),
    /// Individually selected local files
    Files(Vec<PathBuf>),
}

impl std::fmt::Debug for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local(path) => f.debug_tuple("Local").field(path).finish(),
            Self::Archive(path) => f.debug_tuple("Archive").field(path).finish(),
            Self::Provider(_) => f.write_str("Provider(..)"),
            Self::Remote(url) => f.debug_tuple("Remote").field(url).finish(),
            Self::Files(files) => f.debug_tuple("Files").field(files).finish(),
        }
    }
}

impl Source {
    /// Classify a command-line argument: URL, zip file, or local path.
    pub fn from_argument(arg: &str) -> Self {
        if remote::is_remote_reference(arg) {
            return Self::Remote(arg.to_string());
        }
        let path = PathBuf::from(arg);
        let is_zip = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"));
        if is_zip && path.is_file() {
            Self::Archive(path)
        } else {
            Self::Local(path)
        }
    }

    /// Stem for a default output file name.
    pub fn default_stem(&self) -> String {
        match self {
            Self::Local(path) | Self::Archive(path) => stem_of(path),
            Self::Provider(provider) => provider
                .root()
                .map(|info| info.display_name)
                .unwrap_or_else(|_| "project".to_string()),
            Self::Remote(url) => remote::normalize_github_url(url)
                .map(|r| r.repo)
                .unwrap_or_else(|_| "repository".to_string()),
            Self::Files(_) => "selection".to_string(),
        }
    }
}

fn stem_of(path: &Path) -> String {
    let absolute = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    absolute
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "project".to_string())
}

fn local_node(path: &Path) -> Result<FsNode, PackError> {
    FsNode::new(path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            PackError::InvalidSource {
                message: format!("Path does not exist: {}", path.display()),
                suggestion: "Pass an existing directory, file, zip archive or GitHub URL"
                    .to_string(),
            }
        } else {
            PackError::from_traversal(&path.display().to_string(), e)
        }
    })
}

/// Resolve and pack `source` synchronously into `destination`.
pub fn pack_source_blocking(
    source: Source,
    destination: &Path,
    packer: &Packer,
) -> Result<PackOutcome, PackError> {
    match source {
        Source::Local(path) => {
            let root = local_node(&path)?;
            if root.is_dir() {
                packer.pack_tree_to_path(&root, destination)
            } else {
                let files: Vec<Box<dyn VirtualNode>> = vec![Box::new(root)];
                packer.pack_files_to_path(&files, destination)
            }
        }
        Source::Archive(path) => {
            let root = archive::open_archive(&path, &stem_of(&path))?;
            packer.pack_tree_to_path(&root, destination)
        }
        Source::Provider(provider) => {
            let root = ProviderNode::root(provider)
                .map_err(|e| PackError::from_traversal("provider root", e))?;
            packer.pack_tree_to_path(&root, destination)
        }
        Source::Files(paths) => {
            let files = paths
                .iter()
                .map(|path| {
                    FsNode::new(path)
                        .map(|node| Box::new(node) as Box<dyn VirtualNode>)
                        .map_err(|source| PackError::FileRead {
                            path: path.display().to_string(),
                            source,
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            packer.pack_files_to_path(&files, destination)
        }
        Source::Remote(_) => Err(PackError::Config(
            "remote sources must be packed with pack_source".to_string(),
        )),
    }
}

/// Resolve and pack `source` on a blocking worker, downloading it first when
/// it is remote. A downloaded archive is deleted once the pack finishes,
/// successfully or not.
pub async fn pack_source(
    source: Source,
    destination: PathBuf,
    packer: Packer,
) -> Result<PackOutcome, PackError> {
    match source {
        Source::Remote(reference) => {
            let repo = remote::normalize_github_url(&reference)?;
            let client = remote::http_client()?;
            let archive_file = remote::download_archive(&client, &repo.archive_url()).await?;

            if packer.is_cancelled() {
                return Ok(PackOutcome::Cancelled(PackStats::default()));
            }

            run_blocking(move || {
                let root = archive::open_archive(archive_file.path(), &repo.repo)?;
                let outcome = packer.pack_tree_to_path(&root, &destination);
                drop(root);
                if let Err(e) = archive_file.close() {
                    tracing::warn!("Failed to remove downloaded archive: {}", e);
                }
                outcome
            })
            .await
        }
        local => run_blocking(move || pack_source_blocking(local, &destination, &packer)).await,
    }
}

async fn run_blocking<F>(job: F) -> Result<PackOutcome, PackError>
where
    F: FnOnce() -> Result<PackOutcome, PackError> + Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|e| PackError::Io(io::Error::other(format!("pack worker failed: {}", e))))?
}
