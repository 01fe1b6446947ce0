// Copyright (c) 2026 the srcpack contributors
// SPDX-License-Identifier: Apache-2.0

//! The packing engine.
//!
//! A pack writes one document: header, structure section (Markdown and Text),
//! content section, footer. The structure and content passes share the
//! directory pruning rules but only the content pass applies the file-level
//! content rules, so skipped files stay visible in the structure.
//!
//! Everything runs sequentially on the caller's thread. The destination is
//! flushed on every exit path; when a pack is cancelled the partial output
//! is left as is.

pub mod config;
pub mod content;
pub mod control;
pub mod filter;
pub mod format;
pub mod gitignore;
pub mod tree;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::ops::ControlFlow;
use std::path::Path;

use serde::Serialize;

use crate::utils::error::PackError;
use crate::vfs::{VirtualNode, is_access_revoked};

pub use config::{OutputFormat, OutputMode, PackerConfig};
pub use content::{ContentEmitter, compress_lines, sniff_binary};
pub use control::{CancelToken, ProgressSink};
pub use filter::{Blacklist, ContentFilter, DirectorySkipSet, FilterEngine};
pub use tree::{STRUCTURE_PHASE, TreeRenderer};

/// Project name used in the header of a file-selection pack.
pub const SELECTION_TITLE: &str = "Selected Files";

pub(crate) type Flow = ControlFlow<()>;

/// Counters for one pack.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PackStats {
    /// Lines in the structure section, excluding the root line
    pub tree_entries: usize,
    /// Files that got a header/footer block
    pub files_emitted: usize,
    /// Files whose block was left out by the content rules
    pub files_skipped: usize,
    /// Emitted files whose body was replaced by the binary placeholder
    pub binary_files: usize,
    /// Emitted files whose body was replaced (or cut short) by an error placeholder
    pub read_errors: usize,
    pub bytes_written: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackOutcome {
    Completed(PackStats),
    /// Stopped early; the destination holds a truncated document.
    Cancelled(PackStats),
}

impl PackOutcome {
    pub fn stats(&self) -> &PackStats {
        match self {
            Self::Completed(stats) | Self::Cancelled(stats) => stats,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }

    fn with_bytes(self, bytes: u64) -> Self {
        match self {
            Self::Completed(mut stats) => {
                stats.bytes_written = bytes;
                Self::Completed(stats)
            }
            Self::Cancelled(mut stats) => {
                stats.bytes_written = bytes;
                Self::Cancelled(stats)
            }
        }
    }
}

/// `prefix/name`, or just `name` at the root.
pub(crate) fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", prefix, name)
    }
}

/// Children of `dir`, directories first, then by name.
///
/// A revoked grant is fatal, as is failing to list the root. Any other
/// listing failure below the root is logged and the directory treated as empty.
pub(crate) fn list_sorted(
    dir: &dyn VirtualNode,
    rel_path: &str,
) -> Result<Vec<Box<dyn VirtualNode>>, PackError> {
    let mut children = match dir.children() {
        Ok(children) => children,
        Err(e) if is_access_revoked(&e) => {
            return Err(PackError::PermissionDenied(e.to_string()));
        }
        Err(e) if rel_path.is_empty() => {
            return Err(PackError::from_traversal(dir.name(), e));
        }
        Err(e) => {
            tracing::warn!(path = %rel_path, error = %e, "Failed to list directory");
            return Ok(Vec::new());
        }
    };
    children.sort_by(|a, b| {
        b.is_dir()
            .cmp(&a.is_dir())
            .then_with(|| a.name().cmp(b.name()))
    });
    Ok(children)
}

/// Counts bytes passed through to the destination.
struct CountingWriter<W> {
    inner: W,
    count: u64,
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.count += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

fn create_destination(path: &Path) -> Result<BufWriter<File>, PackError> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|source| PackError::DestinationUnavailable {
            path: path.to_path_buf(),
            source,
        })
}

/// Runs packs with one fixed configuration.
#[derive(Debug, Clone)]
pub struct Packer {
    config: PackerConfig,
    blacklist: Blacklist,
    cancel: CancelToken,
    progress: ProgressSink,
}

impl Packer {
    pub fn new(config: PackerConfig, blacklist: Blacklist) -> Self {
        Self {
            config,
            blacklist,
            cancel: CancelToken::new(),
            progress: ProgressSink::none(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_progress(mut self, progress: ProgressSink) -> Self {
        self.progress = progress;
        self
    }

    pub fn config(&self) -> &PackerConfig {
        &self.config
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Pack the tree under `root` into `out`.
    pub fn pack_tree<W: Write>(
        &self,
        root: &dyn VirtualNode,
        out: W,
    ) -> Result<PackOutcome, PackError> {
        self.with_destination(out, |packer, out| packer.write_tree_document(root, out))
    }

    /// Pack the tree under `root` into a newly created file at `path`.
    pub fn pack_tree_to_path(
        &self,
        root: &dyn VirtualNode,
        path: &Path,
    ) -> Result<PackOutcome, PackError> {
        let out = create_destination(path)?;
        self.pack_tree(root, out)
    }

    /// Pack individually selected files, in the order given. There is no
    /// structure section; in tree-only mode only XML lists the files.
    pub fn pack_files<W: Write>(
        &self,
        files: &[Box<dyn VirtualNode>],
        out: W,
    ) -> Result<PackOutcome, PackError> {
        self.with_destination(out, |packer, out| packer.write_selection_document(files, out))
    }

    pub fn pack_files_to_path(
        &self,
        files: &[Box<dyn VirtualNode>],
        path: &Path,
    ) -> Result<PackOutcome, PackError> {
        let out = create_destination(path)?;
        self.pack_files(files, out)
    }

    /// Run `body` against a counting wrapper of `out`, flushing whether or not
    /// it succeeded.
    fn with_destination<W, F>(&self, out: W, body: F) -> Result<PackOutcome, PackError>
    where
        W: Write,
        F: FnOnce(&Self, &mut dyn Write) -> Result<PackOutcome, PackError>,
    {
        let mut out = CountingWriter { inner: out, count: 0 };
        let result = body(self, &mut out);
        let flushed = out.flush();

        let outcome = result?;
        flushed?;

        let outcome = outcome.with_bytes(out.count);
        if outcome.is_cancelled() {
            tracing::info!("Pack cancelled; output is incomplete");
        } else {
            tracing::info!(
                files = outcome.stats().files_emitted,
                skipped = outcome.stats().files_skipped,
                bytes = out.count,
                "Pack complete"
            );
        }
        Ok(outcome)
    }

    fn write_tree_document(
        &self,
        root: &dyn VirtualNode,
        out: &mut dyn Write,
    ) -> Result<PackOutcome, PackError> {
        tracing::info!(
            root = root.name(),
            format = %self.config.format,
            mode = ?self.config.mode,
            compress = self.config.compress,
            "Packing tree"
        );

        let filters = FilterEngine::for_root(&self.config, self.blacklist.clone(), root);
        let format = format::strategy(self.config.format);
        let mut stats = PackStats::default();

        out.write_all(format.document_header(root.name()).as_bytes())?;

        if self.config.format != OutputFormat::Xml {
            self.progress.report(STRUCTURE_PHASE);
            let tree = match TreeRenderer::new(&filters, &self.cancel).render(root)? {
                ControlFlow::Continue(tree) => tree,
                ControlFlow::Break(()) => return Ok(PackOutcome::Cancelled(stats)),
            };
            stats.tree_entries = tree.entries;
            if let Some(section) = format.tree_section(&tree.text) {
                out.write_all(section.as_bytes())?;
            }
        }

        if self.config.emits_content_pass() {
            let emitter = ContentEmitter::new(&self.config, &self.cancel, &self.progress);
            if emitter.emit_tree(out, root, &filters, &mut stats)?.is_break() {
                return Ok(PackOutcome::Cancelled(stats));
            }
        }

        out.write_all(format.document_footer().as_bytes())?;
        Ok(PackOutcome::Completed(stats))
    }

    fn write_selection_document(
        &self,
        files: &[Box<dyn VirtualNode>],
        out: &mut dyn Write,
    ) -> Result<PackOutcome, PackError> {
        tracing::info!(
            files = files.len(),
            format = %self.config.format,
            "Packing file selection"
        );

        let format = format::strategy(self.config.format);
        let mut stats = PackStats::default();

        out.write_all(format.document_header(SELECTION_TITLE).as_bytes())?;

        if self.config.emits_content_pass() {
            let content = ContentFilter::new(self.blacklist.clone());
            let emitter = ContentEmitter::new(&self.config, &self.cancel, &self.progress);
            if emitter
                .emit_selected(out, files, &content, &mut stats)?
                .is_break()
            {
                return Ok(PackOutcome::Cancelled(stats));
            }
        }

        out.write_all(format.document_footer().as_bytes())?;
        Ok(PackOutcome::Completed(stats))
    }
}
