// Copyright (c) 2026 the srcpack contributors
// SPDX-License-Identifier: Apache-2.0

//! End-of-run summary for a pack.
//!
//! # Example
//!
//! ```ignore
//! use srcpack::utils::summary::display_pack_summary;
//! use std::time::Duration;
//!
//! display_pack_summary(&destination, &outcome, Duration::from_secs_f32(1.2), false)?;
//! ```

use crate::packer::PackOutcome;
use crate::utils::formatting::{format_count, format_number};
use anyhow::Result;
use console::{Term, style};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

/// Machine-readable form of the summary (`--json`).
#[derive(Debug, Serialize)]
pub struct SummaryReport<'a> {
    pub output: &'a Path,
    pub cancelled: bool,
    #[serde(flatten)]
    pub stats: crate::packer::PackStats,
    pub elapsed_secs: f64,
}

pub fn summary_json(
    destination: &Path,
    outcome: &PackOutcome,
    elapsed: Duration,
) -> Result<String> {
    let report = SummaryReport {
        output: destination,
        cancelled: outcome.is_cancelled(),
        stats: *outcome.stats(),
        elapsed_secs: elapsed.as_secs_f64(),
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

/// Display a summary after a pack finishes or is cancelled.
///
/// # Arguments
///
/// * `destination` - Path of the written document
/// * `outcome` - Result of the pack
/// * `elapsed` - Time elapsed for the entire operation
/// * `quiet` - If true, suppresses output entirely
pub fn display_pack_summary(
    destination: &Path,
    outcome: &PackOutcome,
    elapsed: Duration,
    quiet: bool,
) -> Result<()> {
    if quiet {
        return Ok(());
    }

    let mut term = Term::stdout();
    let stats = outcome.stats();

    writeln!(term)?;
    if outcome.is_cancelled() {
        writeln!(
            term,
            "{} {}",
            style("\u{2717}").yellow().bold(),
            style("Pack cancelled; output is incomplete").bold()
        )?;
    } else {
        writeln!(
            term,
            "{} {}",
            style("\u{2713}").green().bold(),
            style("Project packed successfully").bold()
        )?;
    }

    writeln!(term)?;
    writeln!(
        term,
        "{}: {} ({}, {})",
        style("Output").bold(),
        destination.display(),
        format_size(stats.bytes_written),
        format_count(stats.files_emitted, "file", "files")
    )?;

    writeln!(term)?;
    writeln!(term, "{}:", style("Statistics").bold())?;
    if stats.tree_entries > 0 {
        writeln!(
            term,
            "{} Tree entries: {}",
            style("\u{251c}\u{2500}").dim(),
            format_number(stats.tree_entries)
        )?;
    }
    writeln!(
        term,
        "{} Files skipped: {}",
        style("\u{251c}\u{2500}").dim(),
        format_number(stats.files_skipped)
    )?;
    if stats.binary_files > 0 {
        writeln!(
            term,
            "{} Binary placeholders: {}",
            style("\u{251c}\u{2500}").dim(),
            format_number(stats.binary_files)
        )?;
    }
    if stats.read_errors > 0 {
        writeln!(
            term,
            "{} Unreadable files: {}",
            style("\u{251c}\u{2500}").dim(),
            style(format_number(stats.read_errors)).yellow()
        )?;
    }
    writeln!(
        term,
        "{} Time: {}",
        style("\u{2514}\u{2500}").dim(),
        format_duration(elapsed)
    )?;
    writeln!(term)?;

    Ok(())
}

/// Format a file size for display (e.g., "3.2 KB").
fn format_size(bytes: u64) -> String {
    if bytes >= 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else if bytes >= 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{} B", bytes)
    }
}

/// Format a duration for display (e.g., "12.3s" or "1m 23s").
fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs >= 60.0 {
        let mins = (secs / 60.0).floor() as u64;
        let remaining_secs = secs - (mins as f64 * 60.0);
        format!("{}m {:.1}s", mins, remaining_secs)
    } else {
        format!("{:.1}s", secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packer::PackStats;

    fn sample_stats() -> PackStats {
        PackStats {
            tree_entries: 12,
            files_emitted: 9,
            files_skipped: 3,
            binary_files: 1,
            read_errors: 0,
            bytes_written: 4096,
        }
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(500), "500 B");
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(3276), "3.2 KB");
        assert_eq!(format_size(1048576), "1.0 MB");
        assert_eq!(format_size(2621440), "2.5 MB");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs_f64(0.5)), "0.5s");
        assert_eq!(format_duration(Duration::from_secs_f64(12.3)), "12.3s");
        assert_eq!(format_duration(Duration::from_secs_f64(60.0)), "1m 0.0s");
        assert_eq!(format_duration(Duration::from_secs_f64(83.5)), "1m 23.5s");
    }

    #[test]
    fn test_summary_quiet_mode() {
        let outcome = PackOutcome::Completed(sample_stats());
        let result =
            display_pack_summary(Path::new("out.md"), &outcome, Duration::from_secs(1), true);
        assert!(result.is_ok());
    }

    #[test]
    fn test_summary_cancelled() {
        let outcome = PackOutcome::Cancelled(sample_stats());
        let result =
            display_pack_summary(Path::new("out.md"), &outcome, Duration::from_secs(1), false);
        assert!(result.is_ok());
    }

    #[test]
    fn test_summary_json_fields() {
        let outcome = PackOutcome::Completed(sample_stats());
        let json = summary_json(Path::new("out.xml"), &outcome, Duration::from_millis(1500))
            .expect("json");
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");

        assert_eq!(value["output"], "out.xml");
        assert_eq!(value["cancelled"], false);
        assert_eq!(value["files_emitted"], 9);
        assert_eq!(value["bytes_written"], 4096);
        assert_eq!(value["elapsed_secs"], 1.5);
    }
}
