// Copyright (c) 2026 the srcpack contributors
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use console::Term;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

use crate::packer::STRUCTURE_PHASE;

/// Stage name constants for consistent progress display.
pub mod stages {
    /// Remote archive download (spinner only).
    pub const DOWNLOADING: &str = "downloading";
    /// Tree and content passes.
    pub const PACKING: &str = "packing";
}

/// Spinner that follows the progress notifications of one pack.
///
/// Notifications are either a phase label or the relative path of the file
/// being emitted; paths are counted, phases only change the message.
///
/// # TTY Detection
///
/// When stderr is not a TTY (piped output, CI) or the run is quiet, the
/// spinner is hidden and produces no output.
pub struct PackProgress {
    bar: ProgressBar,
    is_tty: bool,
}

impl PackProgress {
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        let is_tty = !quiet && Term::stderr().is_term();
        let bar = if is_tty {
            let spinner = ProgressBar::new_spinner();
            spinner.enable_steady_tick(Duration::from_millis(100));
            spinner
        } else {
            ProgressBar::hidden()
        };
        bar.set_style(Self::style_for_stage(stages::DOWNLOADING));
        Self { bar, is_tty }
    }

    /// Switch the spinner to `stage`.
    pub fn set_stage(&self, stage: &str) {
        self.bar.set_style(Self::style_for_stage(stage));
        self.bar.set_position(0);
        self.bar.set_message("");
    }

    /// Clear the spinner once the pack has ended, however it ended.
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    /// Forward every notification in `rx` to the spinner until the sending
    /// side is dropped. The first notification switches to the packing stage.
    pub fn follow(&self, mut rx: UnboundedReceiver<String>) -> JoinHandle<()> {
        let bar = self.bar.clone();
        tokio::spawn(async move {
            let mut packing = false;
            while let Some(unit) = rx.recv().await {
                if !packing {
                    bar.set_style(Self::style_for_stage(stages::PACKING));
                    packing = true;
                }
                apply_unit(&bar, unit);
            }
        })
    }

    #[must_use]
    pub fn is_tty(&self) -> bool {
        self.is_tty
    }

    fn style_for_stage(name: &str) -> ProgressStyle {
        let template = match name {
            stages::DOWNLOADING => {
                "{spinner:.green} [{elapsed_precise}] Downloading archive... {msg}"
            }
            stages::PACKING => "{spinner:.green} [{elapsed_precise}] {pos} files {msg}",
            _ => "{spinner:.green} {msg}",
        };

        ProgressStyle::default_spinner()
            .template(template)
            .unwrap_or_else(|e| {
                tracing::warn!(
                    "Failed to parse progress style template for stage '{}': {e}",
                    name
                );
                ProgressStyle::default_spinner()
            })
    }
}

/// Count file paths; phase labels only replace the message.
fn apply_unit(bar: &ProgressBar, unit: String) {
    if unit != STRUCTURE_PHASE {
        bar.inc(1);
    }
    bar.set_message(unit);
}

impl std::fmt::Debug for PackProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackProgress")
            .field("is_tty", &self.is_tty)
            .finish_non_exhaustive()
    }
}
