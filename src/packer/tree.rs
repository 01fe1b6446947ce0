// Copyright (c) 2026 the srcpack contributors
// SPDX-License-Identifier: Apache-2.0

//! Structural pass: one line per visible node, directory-skip pruning only.

use std::ops::ControlFlow;

use super::control::CancelToken;
use super::filter::FilterEngine;
use super::{Flow, join_path, list_sorted};
use crate::utils::error::PackError;
use crate::vfs::VirtualNode;

const ROOT_GLYPH: &str = "\u{1f4e6}";
const DIR_GLYPH: &str = "\u{1f4c1}";
const FILE_GLYPH: &str = "\u{1f4c4}";
const INDENT: &str = "  ";

/// Progress label reported when the structure pass starts.
pub const STRUCTURE_PHASE: &str = "Generating project structure";

/// Rendered structure block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedTree {
    pub text: String,
    /// Lines below the root line
    pub entries: usize,
}

/// Renders the tree pass. Content rules are never consulted here, so files
/// whose bodies are skipped later still show up.
pub struct TreeRenderer<'a> {
    filters: &'a FilterEngine,
    cancel: &'a CancelToken,
}

impl<'a> TreeRenderer<'a> {
    pub fn new(filters: &'a FilterEngine, cancel: &'a CancelToken) -> Self {
        Self { filters, cancel }
    }

    pub fn render(
        &self,
        root: &dyn VirtualNode,
    ) -> Result<ControlFlow<(), RenderedTree>, PackError> {
        let mut tree = RenderedTree {
            text: format!("{} {}/\n", ROOT_GLYPH, root.name()),
            entries: 0,
        };

        if root.is_dir() && self.walk(root, "", 1, &mut tree)?.is_break() {
            return Ok(ControlFlow::Break(()));
        }
        Ok(ControlFlow::Continue(tree))
    }

    fn walk(
        &self,
        dir: &dyn VirtualNode,
        rel_path: &str,
        depth: usize,
        tree: &mut RenderedTree,
    ) -> Result<Flow, PackError> {
        for child in list_sorted(dir, rel_path)? {
            if self.cancel.is_cancelled() {
                return Ok(ControlFlow::Break(()));
            }

            let path = join_path(rel_path, child.name());
            let indent = INDENT.repeat(depth);

            if child.is_dir() {
                if self.filters.prunes_dir(child.name(), &path) {
                    tracing::debug!(path = %path, "Pruned directory");
                    continue;
                }
                tree.text
                    .push_str(&format!("{}{} {}/\n", indent, DIR_GLYPH, child.name()));
                tree.entries += 1;
                if self.walk(child.as_ref(), &path, depth + 1, tree)?.is_break() {
                    return Ok(ControlFlow::Break(()));
                }
            } else {
                tree.text
                    .push_str(&format!("{}{} {}\n", indent, FILE_GLYPH, child.name()));
                tree.entries += 1;
            }
        }
        Ok(ControlFlow::Continue(()))
    }
}
