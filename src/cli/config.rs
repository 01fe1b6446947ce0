// Copyright (c) 2026 the srcpack contributors
// SPDX-License-Identifier: Apache-2.0

//! Configuration management using the `config` crate for hierarchical discovery and merging.
//!
//! ## Configuration Sources (in precedence order, highest to lowest):
//! 1. **CLI flags** - Highest precedence (applied in [`merge_config`])
//! 2. **Environment variables** - `SRCPACK__<SECTION>__<KEY>`
//! 3. **Config files** - Lowest precedence
//!
//! ## Config File Discovery (in merge order, later overrides earlier):
//! 1. `~/.config/srcpack/config.toml` (user config directory)
//! 2. `srcpack.toml` in the git repository root (walking up from the current directory)
//! 3. `./srcpack.toml` in the current directory
//! 4. Explicit `--config` path
//!
//! ## Example file
//!
//! ```toml
//! [filters]
//! use_ignore_file = true
//! ignore_vcs_dir = true
//!
//! [output]
//! format = "xml"
//! mode = "tree-only"
//! compress = false
//!
//! [blacklist]
//! names = ["secrets.env"]
//! extensions = ["log", ".lock"]
//! ```

use crate::RunSettings;
use crate::cli::args::Args;
use crate::packer::{Blacklist, OutputFormat, OutputMode, PackerConfig};
use crate::utils::error::PackError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "srcpack.toml";

/// Root configuration structure loaded from config files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub filters: FiltersConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub blacklist: BlacklistConfig,
}

/// Directory and ignore-file toggles. Unset keys keep the engine defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiltersConfig {
    pub use_ignore_file: Option<bool>,
    pub ignore_build_tool_dir: Option<bool>,
    pub ignore_vcs_dir: Option<bool>,
    pub ignore_build_output_dir: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: Option<OutputFormat>,
    pub mode: Option<OutputMode>,
    pub compress: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlacklistConfig {
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub extensions: Vec<String>,
}

fn discover_config_paths(explicit_path: Option<&Path>) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    // User config (lowest precedence)
    if let Some(user_config) = get_user_config_path() {
        paths.push(user_config);
    }

    // Git root config
    if let Some(git_root) = find_git_root() {
        let git_config = git_root.join(CONFIG_FILE_NAME);
        if git_config.exists() {
            paths.push(git_config);
        }
    }

    // Current directory config
    let current_dir_config = PathBuf::from(CONFIG_FILE_NAME);
    if current_dir_config.exists() && !paths.iter().any(|p| same_file(p, &current_dir_config)) {
        paths.push(current_dir_config);
    }

    // Explicit --config path (highest precedence)
    if let Some(explicit) = explicit_path {
        if !explicit.exists() {
            return Err(PackError::Config(format!(
                "Config file not found: {}",
                explicit.display()
            ))
            .into());
        }
        paths.push(explicit.to_path_buf());
    }

    Ok(paths)
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn find_git_root() -> Option<PathBuf> {
    git2::Repository::discover(".")
        .ok()
        .and_then(|repo| repo.workdir().map(|p| p.to_path_buf()))
}

fn get_user_config_path() -> Option<PathBuf> {
    dirs::config_dir()
        .map(|config_dir| config_dir.join("srcpack").join("config.toml"))
        .filter(|path| path.exists())
}

/// Load configuration from discovered config files and environment variables.
pub fn load(args: &Args) -> Result<FileConfig> {
    let paths = discover_config_paths(args.config.as_deref())?;
    tracing::debug!(?paths, "Config files");
    load_from_paths(&paths)
}

/// Merge the given files (later wins) and the `SRCPACK__` environment.
pub fn load_from_paths(paths: &[PathBuf]) -> Result<FileConfig> {
    let mut builder = config::Config::builder();

    for config_path in paths {
        builder = builder.add_source(config::File::from(config_path.as_path()));
    }

    builder = builder.add_source(
        config::Environment::with_prefix("SRCPACK")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    let settings = builder.build().context("Failed to build configuration")?;

    settings
        .try_deserialize()
        .context("Failed to deserialize configuration")
}

/// Apply CLI flags on top of the file configuration.
///
/// Boolean flags only ever turn a behaviour on (or a `--keep-*`/`--no-*`
/// flag turns one off), so an absent flag leaves the file value in place.
/// Blacklists from both sides are unioned.
pub fn merge_config(args: &Args, file: FileConfig) -> RunSettings {
    let defaults = PackerConfig::default();
    let filters = &file.filters;

    let format = args
        .format
        .map(OutputFormat::from)
        .or(file.output.format)
        .unwrap_or(defaults.format);
    let mode = if args.tree_only {
        OutputMode::TreeOnly
    } else {
        file.output.mode.unwrap_or(defaults.mode)
    };
    let compress = args.compress || file.output.compress.unwrap_or(defaults.compress);

    let packer = PackerConfig::new()
        .with_format(format)
        .with_mode(mode)
        .with_compress(compress)
        .with_ignore_file(
            !args.no_ignore_file && filters.use_ignore_file.unwrap_or(defaults.use_ignore_file),
        )
        .with_build_tool_dir_ignored(
            !args.keep_tool_dir
                && filters
                    .ignore_build_tool_dir
                    .unwrap_or(defaults.ignore_build_tool_dir),
        )
        .with_vcs_dir_ignored(
            !args.keep_vcs_dir && filters.ignore_vcs_dir.unwrap_or(defaults.ignore_vcs_dir),
        )
        .with_build_output_dir_ignored(
            !args.keep_build_dir
                && filters
                    .ignore_build_output_dir
                    .unwrap_or(defaults.ignore_build_output_dir),
        );

    let blacklist = Blacklist::new(
        file.blacklist
            .names
            .into_iter()
            .chain(args.exclude_name.iter().cloned()),
        file.blacklist
            .extensions
            .iter()
            .chain(args.exclude_ext.iter()),
    );

    RunSettings {
        source: args.source.clone(),
        files: args.files.clone(),
        output: args.output.clone(),
        packer,
        blacklist,
        verbose: args.verbose,
        quiet: args.quiet,
        json: args.json,
    }
}
