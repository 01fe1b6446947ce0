// Copyright (c) 2026 the srcpack contributors
// SPDX-License-Identifier: Apache-2.0

use crate::utils::error::PackError;
use crate::vfs::VirtualNode;
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::io::Read;

use super::filter::MAX_CONTENT_BYTES;

const IGNORE_FILE_NAME: &str = ".gitignore";

/// Patterns from the root ignore file, matched against root-relative paths.
pub struct IgnoreRules {
    gitignore: Gitignore,
}

impl std::fmt::Debug for IgnoreRules {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IgnoreRules")
            .field("patterns", &self.gitignore.num_ignores())
            .finish()
    }
}

impl IgnoreRules {
    pub fn from_contents(contents: &str) -> Result<Self, PackError> {
        let mut builder = GitignoreBuilder::new(".");
        for line in contents.lines() {
            builder
                .add_line(None, line)
                .map_err(|e: ignore::Error| PackError::Config(e.to_string()))?;
        }
        let gitignore = builder
            .build()
            .map_err(|e: ignore::Error| PackError::Config(e.to_string()))?;
        Ok(Self { gitignore })
    }

    /// Read `.gitignore` from the root's immediate children, through whichever
    /// backend the root lives on. A missing or unreadable file yields `None`.
    pub fn load(root: &dyn VirtualNode) -> Option<Self> {
        let children = match root.children() {
            Ok(children) => children,
            Err(e) => {
                tracing::debug!("Cannot list root for ignore file: {}", e);
                return None;
            }
        };

        let node = children
            .into_iter()
            .find(|c| !c.is_dir() && c.name() == IGNORE_FILE_NAME)?;
        if node.size() > MAX_CONTENT_BYTES {
            tracing::warn!("Ignoring oversized {}", IGNORE_FILE_NAME);
            return None;
        }

        let mut contents = String::new();
        if let Err(e) = node.open().and_then(|mut r| r.read_to_string(&mut contents)) {
            tracing::warn!("Failed to read {}: {}", IGNORE_FILE_NAME, e);
            return None;
        }

        match Self::from_contents(&contents) {
            Ok(rules) => {
                tracing::debug!(patterns = rules.gitignore.num_ignores(), "Loaded ignore file");
                Some(rules)
            }
            Err(e) => {
                tracing::warn!("Invalid {}: {}", IGNORE_FILE_NAME, e);
                None
            }
        }
    }

    /// `rel_path` is `/`-separated and relative to the packed root.
    pub fn is_ignored(&self, rel_path: &str, is_dir: bool) -> bool {
        if rel_path.is_empty() {
            return false;
        }
        self.gitignore
            .matched_path_or_any_parents(rel_path, is_dir)
            .is_ignore()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_and_file_patterns() {
        let rules = IgnoreRules::from_contents("# comment\n\ntarget/\n*.log\n!keep.log\n")
            .expect("valid patterns");

        assert!(rules.is_ignored("target", true));
        assert!(rules.is_ignored("target/debug/app", false));
        assert!(rules.is_ignored("logs/run.log", false));
        assert!(!rules.is_ignored("keep.log", false));
        assert!(!rules.is_ignored("src/main.rs", false));
    }

    #[test]
    fn test_dir_only_pattern_does_not_hit_files() {
        let rules = IgnoreRules::from_contents("out/\n").expect("valid patterns");
        assert!(!rules.is_ignored("out", false));
        assert!(rules.is_ignored("out", true));
    }

    #[test]
    fn test_load_from_fs_root() {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        std::fs::write(dir.path().join(".gitignore"), "*.tmp\n").expect("Failed to write");
        let root = crate::vfs::FsNode::new(dir.path()).expect("root");

        let rules = IgnoreRules::load(&root).expect("rules loaded");
        assert!(rules.is_ignored("x.tmp", false));
    }

    #[test]
    fn test_load_without_ignore_file() {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let root = crate::vfs::FsNode::new(dir.path()).expect("root");
        assert!(IgnoreRules::load(&root).is_none());
    }
}
