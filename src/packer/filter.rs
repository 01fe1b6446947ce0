// Copyright (c) 2026 the srcpack contributors
// SPDX-License-Identifier: Apache-2.0

//! Filter engine.
//!
//! Two independent rule sets, built once per pack:
//!
//! - [`DirectorySkipSet`] prunes descent in both the tree pass and the content
//!   pass. A pruned directory and everything under it is absent from the output.
//! - [`ContentFilter`] decides, per file, whether a body block is emitted. It
//!   never hides anything from the tree pass.
//!
//! The NUL-byte sample heuristic lives with the content emitter because it
//! needs the open stream; see [`super::content::sniff_binary`].

use std::collections::HashSet;

use super::config::PackerConfig;
use super::gitignore::IgnoreRules;
use crate::vfs::VirtualNode;

/// Files larger than this are never read for content.
pub const MAX_CONTENT_BYTES: u64 = 1024 * 1024;

/// Number of leading bytes inspected for a NUL byte.
pub const SNIFF_BYTES: usize = 1024;

/// Metadata and tooling directories that are always pruned.
const BASE_SKIP_DIRS: &[&str] = &[
    ".idea",
    ".vscode",
    ".cxx",
    ".externalNativeBuild",
    "node_modules",
    "__pycache__",
    ".DS_Store",
];

pub const BUILD_TOOL_DIR: &str = ".gradle";
pub const VCS_DIR: &str = ".git";
pub const BUILD_OUTPUT_DIR: &str = "build";

/// Extensions whose content is never useful as text.
const BINARY_EXTENSIONS: &[&str] = &[
    // images
    ".png", ".jpg", ".jpeg", ".gif", ".bmp", ".ico", ".webp", ".tiff", ".psd",
    // archives and packages
    ".zip", ".tar", ".gz", ".tgz", ".bz2", ".xz", ".7z", ".rar", ".jar", ".aar", ".apk", ".war",
    // compiled objects
    ".class", ".dex", ".o", ".obj", ".a", ".so", ".dylib", ".dll", ".exe", ".bin", ".wasm",
    ".pyc",
    // fonts
    ".ttf", ".otf", ".woff", ".woff2", ".eot",
    // media
    ".mp3", ".mp4", ".wav", ".ogg", ".flac", ".avi", ".mov", ".mkv", ".webm",
    // documents and data
    ".pdf", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx", ".db", ".sqlite",
    // keys and stores
    ".jks", ".keystore", ".p12",
];

/// Normalize an extension to lowercase with exactly one leading dot.
pub fn normalize_extension(ext: &str) -> String {
    let trimmed = ext.trim().trim_start_matches('.');
    format!(".{}", trimmed.to_lowercase())
}

/// User-supplied name and extension blacklists, snapshotted for one pack.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Blacklist {
    names: HashSet<String>,
    extensions: HashSet<String>,
}

impl Blacklist {
    pub fn new<N, E>(names: N, extensions: E) -> Self
    where
        N: IntoIterator,
        N::Item: Into<String>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            extensions: extensions
                .into_iter()
                .map(|e| e.as_ref().to_string())
                .filter(|e| !e.trim().trim_start_matches('.').is_empty())
                .map(|e| normalize_extension(&e))
                .collect(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Exact match against a file or directory name.
    pub fn has_name(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.extensions.iter().map(String::as_str)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

/// Directory names pruned from both passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectorySkipSet {
    names: HashSet<String>,
}

impl DirectorySkipSet {
    pub fn from_config(config: &PackerConfig) -> Self {
        let mut names: HashSet<String> = BASE_SKIP_DIRS.iter().map(|s| s.to_string()).collect();
        if config.ignore_build_tool_dir {
            names.insert(BUILD_TOOL_DIR.to_string());
        }
        if config.ignore_vcs_dir {
            names.insert(VCS_DIR.to_string());
        }
        if config.ignore_build_output_dir {
            names.insert(BUILD_OUTPUT_DIR.to_string());
        }
        Self { names }
    }

    /// A skip set holding exactly `names`, without the built-in entries.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }
}

/// Why a file's body is left out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Name is on the user blacklist
    BlacklistedName,
    /// Extension is on the user or built-in binary list
    Extension,
    /// Larger than [`MAX_CONTENT_BYTES`]
    TooLarge,
    /// Matched by the root ignore file
    IgnoreFile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentDecision {
    Include,
    Skip(SkipReason),
}

/// File-granularity content rules.
#[derive(Debug, Clone)]
pub struct ContentFilter {
    blacklist: Blacklist,
    binary_extensions: HashSet<String>,
}

impl ContentFilter {
    pub fn new(blacklist: Blacklist) -> Self {
        Self {
            blacklist,
            binary_extensions: BINARY_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn has_skipped_extension(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        self.blacklist
            .extensions()
            .chain(self.binary_extensions.iter().map(String::as_str))
            .any(|ext| lower.ends_with(ext))
    }

    /// Decide from name and size alone; no bytes are read.
    pub fn decide(&self, name: &str, size: u64) -> ContentDecision {
        if self.blacklist.has_name(name) {
            ContentDecision::Skip(SkipReason::BlacklistedName)
        } else if self.has_skipped_extension(name) {
            ContentDecision::Skip(SkipReason::Extension)
        } else if size > MAX_CONTENT_BYTES {
            ContentDecision::Skip(SkipReason::TooLarge)
        } else {
            ContentDecision::Include
        }
    }
}

/// Both rule sets plus the optional ignore file, fixed for one invocation.
#[derive(Debug)]
pub struct FilterEngine {
    skip_dirs: DirectorySkipSet,
    content: ContentFilter,
    ignore: Option<IgnoreRules>,
}

impl FilterEngine {
    pub fn new(
        skip_dirs: DirectorySkipSet,
        blacklist: Blacklist,
        ignore: Option<IgnoreRules>,
    ) -> Self {
        Self {
            skip_dirs,
            content: ContentFilter::new(blacklist),
            ignore,
        }
    }

    /// Build the engine for a pack rooted at `root`, loading the ignore file
    /// when the config asks for it.
    pub fn for_root(config: &PackerConfig, blacklist: Blacklist, root: &dyn VirtualNode) -> Self {
        let ignore = if config.use_ignore_file {
            IgnoreRules::load(root)
        } else {
            None
        };
        Self::new(DirectorySkipSet::from_config(config), blacklist, ignore)
    }

    /// Whether descent into the directory `name` at `rel_path` is pruned.
    ///
    /// Blacklisted names prune directories as well as skipping files.
    pub fn prunes_dir(&self, name: &str, rel_path: &str) -> bool {
        self.skip_dirs.contains(name)
            || self.content.blacklist.has_name(name)
            || self
                .ignore
                .as_ref()
                .is_some_and(|rules| rules.is_ignored(rel_path, true))
    }

    pub fn content_decision(&self, node: &dyn VirtualNode, rel_path: &str) -> ContentDecision {
        match self.content.decide(node.name(), node.size()) {
            ContentDecision::Include => {
                if self
                    .ignore
                    .as_ref()
                    .is_some_and(|rules| rules.is_ignored(rel_path, false))
                {
                    ContentDecision::Skip(SkipReason::IgnoreFile)
                } else {
                    ContentDecision::Include
                }
            }
            skip @ ContentDecision::Skip(_) => skip,
        }
    }
}
