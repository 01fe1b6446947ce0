// Copyright (c) 2026 the srcpack contributors
// SPDX-License-Identifier: Apache-2.0

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::packer::OutputFormat;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum FormatArg {
    Md,
    Xml,
    Txt,
}

impl From<FormatArg> for OutputFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Md => OutputFormat::Markdown,
            FormatArg::Xml => OutputFormat::Xml,
            FormatArg::Txt => OutputFormat::Text,
        }
    }
}

/// CLI argument parsing with environment variable support.
///
/// Environment variables follow the pattern `SRCPACK_*` and are overridden by CLI flags.
/// Example: `SRCPACK_FORMAT=xml` is overridden by `--format md`.
#[derive(Parser, Debug)]
#[command(name = "srcpack")]
#[command(about = "Pack a source tree into one Markdown, XML or text document")]
#[command(version)]
pub struct Args {
    /// Directory, zip archive or GitHub URL to pack
    #[arg(default_value = ".", conflicts_with = "files")]
    pub source: String,

    /// Pack these files instead of a tree (repeatable)
    #[arg(long, num_args = 1..)]
    pub files: Vec<PathBuf>,

    /// Output file path (default: <name>_packed.<ext> in the current directory)
    #[arg(short, long, env = "SRCPACK_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, env = "SRCPACK_FORMAT")]
    pub format: Option<FormatArg>,

    /// Emit only the structure, no file contents
    #[arg(long, env = "SRCPACK_TREE_ONLY")]
    pub tree_only: bool,

    /// Strip blank lines and indentation from file bodies
    #[arg(long, env = "SRCPACK_COMPRESS")]
    pub compress: bool,

    /// Do not apply the root .gitignore
    #[arg(long)]
    pub no_ignore_file: bool,

    /// Keep the build tool's cache directory (.gradle)
    #[arg(long)]
    pub keep_tool_dir: bool,

    /// Keep the version control directory (.git)
    #[arg(long)]
    pub keep_vcs_dir: bool,

    /// Keep the build output directory (build)
    #[arg(long)]
    pub keep_build_dir: bool,

    /// Skip files, and prune directories, with this exact name (repeatable)
    #[arg(long, value_name = "NAME")]
    pub exclude_name: Vec<String>,

    /// Skip files with this extension, with or without the dot (repeatable)
    #[arg(long, value_name = "EXT")]
    pub exclude_ext: Vec<String>,

    /// Config file path
    #[arg(short, long, env = "SRCPACK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print the run summary as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn parse() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["srcpack"]).expect("parse");
        assert_eq!(args.source, ".");
        assert!(args.format.is_none());
        assert!(!args.tree_only);
        assert_eq!(args.verbose, 0);
    }

    #[test]
    fn test_full_flag_set() {
        let args = Args::try_parse_from([
            "srcpack",
            "proj",
            "-f",
            "xml",
            "--tree-only",
            "--keep-vcs-dir",
            "--exclude-ext",
            ".LOG",
            "--exclude-name",
            "secrets.env",
            "-vv",
        ])
        .expect("parse");

        assert_eq!(args.source, "proj");
        assert_eq!(args.format.map(OutputFormat::from), Some(OutputFormat::Xml));
        assert!(args.tree_only);
        assert!(args.keep_vcs_dir);
        assert_eq!(args.exclude_ext, vec![".LOG"]);
        assert_eq!(args.exclude_name, vec!["secrets.env"]);
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_files_mode() {
        let args = Args::try_parse_from(["srcpack", "--files", "a.rs", "b.rs"]).expect("parse");
        assert_eq!(args.files, vec![PathBuf::from("a.rs"), PathBuf::from("b.rs")]);
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Args::try_parse_from(["srcpack", "-q", "-v"]).is_err());
    }
}
