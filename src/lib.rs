// Copyright (c) 2026 the srcpack contributors
// SPDX-License-Identifier: Apache-2.0

//! # srcpack
//!
//! srcpack flattens a source tree into one document for a language model:
//! a tree-drawing of the project structure followed by the content of every
//! text file, in Markdown, XML or plain text.
//!
//! ## Architecture
//!
//! - [`vfs`] exposes every backend (local directory, provider grant, zip
//!   archive) through the [`vfs::VirtualNode`] trait.
//! - [`packer`] holds the engine: filters, the tree pass, the content pass and
//!   the [`packer::Packer`] orchestrator that writes the document.
//! - [`source`] resolves a command-line source to nodes and runs the engine
//!   off the async runtime; [`remote`] fetches GitHub archives.
//! - [`cli`] and [`utils`] carry argument parsing, layered configuration,
//!   progress display, the run summary and error formatting.
//!
//! Configuration follows hierarchical precedence:
//! 1. User config (~/.config/srcpack/config.toml)
//! 2. Git root (srcpack.toml)
//! 3. Current directory (srcpack.toml)
//! 4. Explicit --config path
//! 5. Environment variables (SRCPACK__SECTION__KEY)
//! 6. CLI flags (highest precedence)

pub mod cli;
pub mod packer;
pub mod remote;
pub mod source;
pub mod utils;
pub mod vfs;

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use packer::{Blacklist, CancelToken, PackOutcome, Packer, PackerConfig, ProgressSink};
use source::Source;
use utils::progress::{PackProgress, stages};
use utils::summary::{display_pack_summary, summary_json};

/// Final resolved configuration after merging all sources (CLI, env, config files).
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Directory, archive or URL to pack (ignored when `files` is set)
    pub source: String,
    /// Individually selected files
    pub files: Vec<PathBuf>,
    /// Output file path (optional)
    pub output: Option<PathBuf>,
    pub packer: PackerConfig,
    pub blacklist: Blacklist,
    /// Verbosity level (0-3)
    pub verbose: u8,
    /// Quiet mode (suppress all output)
    pub quiet: bool,
    /// Print the summary as JSON
    pub json: bool,
}

impl RunSettings {
    pub fn resolve_source(&self) -> Source {
        if self.files.is_empty() {
            Source::from_argument(&self.source)
        } else {
            Source::Files(self.files.clone())
        }
    }

    /// The explicit output path, or `<stem>_packed.<ext>` in the current directory.
    pub fn destination(&self, source: &Source) -> PathBuf {
        self.output.clone().unwrap_or_else(|| {
            PathBuf::from(format!(
                "{}_packed.{}",
                source.default_stem(),
                self.packer.format.file_extension()
            ))
        })
    }
}

/// Install the stderr log subscriber. `RUST_LOG` wins over the flags.
pub fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .try_init();
    if installed.is_err() {
        tracing::debug!("Logging already initialized");
    }
}

/// Pack according to `settings`, showing progress and a summary.
///
/// Ctrl-C cancels the pack; the partial document is kept and the outcome
/// reports the cancellation.
pub async fn run(settings: RunSettings) -> Result<PackOutcome> {
    let source = settings.resolve_source();
    let destination = settings.destination(&source);

    tracing::info!("srcpack v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::debug!(
        source = ?source,
        destination = %destination.display(),
        format = ?settings.packer.format,
        mode = ?settings.packer.mode,
        compress = settings.packer.compress,
        "Configuration"
    );

    let cancel = CancelToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, cancelling pack");
                cancel.cancel();
            }
        })
    };

    let progress = PackProgress::new(settings.quiet || settings.json);
    if matches!(source, Source::Remote(_)) {
        progress.set_stage(stages::DOWNLOADING);
    } else {
        progress.set_stage(stages::PACKING);
    }
    let (sink, rx) = ProgressSink::channel();
    let drain = progress.follow(rx);

    let packer = Packer::new(settings.packer, settings.blacklist.clone())
        .with_cancel(cancel)
        .with_progress(sink);

    let started = Instant::now();
    let result = source::pack_source(source, destination.clone(), packer).await;
    let elapsed = started.elapsed();

    interrupt.abort();
    // The packer, and with it the sending side, is gone once pack_source returns.
    if let Err(e) = drain.await {
        tracing::debug!("Progress task ended abnormally: {}", e);
    }
    progress.finish();

    let outcome = result.with_context(|| format!("Failed to pack '{}'", settings.source))?;

    if settings.json {
        let json = summary_json(&destination, &outcome, elapsed)?;
        console::Term::stdout()
            .write_line(&json)
            .context("Failed to write summary")?;
    } else {
        display_pack_summary(&destination, &outcome, elapsed, settings.quiet)?;
    }

    Ok(outcome)
}
