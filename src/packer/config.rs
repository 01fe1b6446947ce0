// Copyright (c) 2026 the srcpack contributors
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::fmt;

/// Output document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    #[serde(alias = "md")]
    Markdown,
    Xml,
    #[serde(alias = "txt")]
    Text,
}

impl OutputFormat {
    /// Extension for the default output file name.
    pub fn file_extension(self) -> &'static str {
        match self {
            Self::Markdown => "md",
            Self::Xml => "xml",
            Self::Text => "txt",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Markdown => write!(f, "markdown"),
            Self::Xml => write!(f, "xml"),
            Self::Text => write!(f, "text"),
        }
    }
}

/// Whether file bodies are emitted or only the structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputMode {
    #[default]
    Full,
    TreeOnly,
}

/// Immutable settings for one pack invocation.
///
/// Built by the caller, then only read by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackerConfig {
    /// Honour the root `.gitignore`
    pub use_ignore_file: bool,
    /// Prune the build tool's cache directory (`.gradle`)
    pub ignore_build_tool_dir: bool,
    /// Prune the version-control directory (`.git`)
    pub ignore_vcs_dir: bool,
    /// Prune the build output directory (`build`)
    pub ignore_build_output_dir: bool,
    /// Collapse every file body into one trimmed, space-joined paragraph
    pub compress: bool,
    pub format: OutputFormat,
    pub mode: OutputMode,
}

impl Default for PackerConfig {
    fn default() -> Self {
        Self {
            use_ignore_file: true,
            ignore_build_tool_dir: true,
            ignore_vcs_dir: true,
            ignore_build_output_dir: true,
            compress: false,
            format: OutputFormat::Markdown,
            mode: OutputMode::Full,
        }
    }
}

impl PackerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_mode(mut self, mode: OutputMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    pub fn with_ignore_file(mut self, enabled: bool) -> Self {
        self.use_ignore_file = enabled;
        self
    }

    pub fn with_build_tool_dir_ignored(mut self, enabled: bool) -> Self {
        self.ignore_build_tool_dir = enabled;
        self
    }

    pub fn with_vcs_dir_ignored(mut self, enabled: bool) -> Self {
        self.ignore_vcs_dir = enabled;
        self
    }

    pub fn with_build_output_dir_ignored(mut self, enabled: bool) -> Self {
        self.ignore_build_output_dir = enabled;
        self
    }

    /// Whether the content pass runs at all. XML always needs it because its
    /// `<dir>`/`<file>` nesting is the structure.
    pub fn emits_content_pass(&self) -> bool {
        self.mode == OutputMode::Full || self.format == OutputFormat::Xml
    }

    /// Whether file bodies are read.
    pub fn emits_bodies(&self) -> bool {
        self.mode == OutputMode::Full
    }
}
