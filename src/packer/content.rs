// Copyright (c) 2026 the srcpack contributors
// SPDX-License-Identifier: Apache-2.0

//! Content pass.
//!
//! Mirrors the tree pass (same pruning, same order) and additionally applies
//! the content rules to files. Each emitted file gets a header, a body (or a
//! placeholder) and a footer. A file that cannot be read gets an inline error
//! placeholder; the pack carries on with the next file.

use std::io::{self, BufRead, BufReader, Cursor, Read, Write};
use std::ops::ControlFlow;

use super::config::PackerConfig;
use super::control::{CancelToken, ProgressSink};
use super::filter::{ContentDecision, ContentFilter, FilterEngine, SNIFF_BYTES};
use super::format::{BINARY_PLACEHOLDER, DocumentFormat, error_placeholder, strategy};
use super::{Flow, PackStats, join_path, list_sorted};
use crate::utils::error::PackError;
use crate::vfs::{NodeReader, VirtualNode, is_access_revoked};

/// Read up to [`SNIFF_BYTES`] from `reader`, looping until the buffer is full
/// or the stream ends. Returns the sample and whether it holds a NUL byte.
pub fn sniff_binary<R: Read + ?Sized>(reader: &mut R) -> io::Result<(Vec<u8>, bool)> {
    let mut sample = vec![0u8; SNIFF_BYTES];
    let mut filled = 0;
    while filled < SNIFF_BYTES {
        match reader.read(&mut sample[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    sample.truncate(filled);
    let binary = sample.contains(&0);
    Ok((sample, binary))
}

/// Compress-mode view of one line: trimmed, or `None` when blank.
fn compressed_line(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Drop blank lines and join the trimmed rest, each followed by one space.
///
/// Applying it to its own output changes nothing.
pub fn compress_lines(text: &str) -> String {
    text.lines()
        .filter_map(compressed_line)
        .fold(String::new(), |mut acc, line| {
            acc.push_str(line);
            acc.push(' ');
            acc
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Text,
    Binary,
}

/// Keeps source-side failures (recoverable) apart from destination-side ones
/// (fatal).
#[derive(Debug)]
enum BodyError {
    Read(io::Error),
    Write(io::Error),
}

pub struct ContentEmitter<'a> {
    format: &'static dyn DocumentFormat,
    compress: bool,
    /// False in tree-only mode: files become empty containers
    bodies: bool,
    cancel: &'a CancelToken,
    progress: &'a ProgressSink,
}

impl<'a> ContentEmitter<'a> {
    pub fn new(
        config: &PackerConfig,
        cancel: &'a CancelToken,
        progress: &'a ProgressSink,
    ) -> Self {
        Self {
            format: strategy(config.format),
            compress: config.compress,
            bodies: config.emits_bodies(),
            cancel,
            progress,
        }
    }

    /// Walk everything under `root`. The root itself is never wrapped in a
    /// directory container.
    pub fn emit_tree(
        &self,
        out: &mut dyn Write,
        root: &dyn VirtualNode,
        filters: &FilterEngine,
        stats: &mut PackStats,
    ) -> Result<Flow, PackError> {
        if !root.is_dir() {
            return Ok(ControlFlow::Continue(()));
        }
        self.emit_dir(out, root, "", filters, stats)
    }

    fn emit_dir(
        &self,
        out: &mut dyn Write,
        dir: &dyn VirtualNode,
        rel_path: &str,
        filters: &FilterEngine,
        stats: &mut PackStats,
    ) -> Result<Flow, PackError> {
        for child in list_sorted(dir, rel_path)? {
            if self.cancel.is_cancelled() {
                return Ok(ControlFlow::Break(()));
            }

            let path = join_path(rel_path, child.name());

            if child.is_dir() {
                if filters.prunes_dir(child.name(), &path) {
                    continue;
                }
                if let Some(open) = self.format.dir_open(child.name()) {
                    out.write_all(open.as_bytes())?;
                }
                if self
                    .emit_dir(out, child.as_ref(), &path, filters, stats)?
                    .is_break()
                {
                    return Ok(ControlFlow::Break(()));
                }
                if let Some(close) = self.format.dir_close() {
                    out.write_all(close.as_bytes())?;
                }
            } else if !self.bodies {
                self.progress.report(&path);
                self.emit_container(out, &path, stats)?;
            } else {
                match filters.content_decision(child.as_ref(), &path) {
                    ContentDecision::Include => {
                        self.progress.report(&path);
                        self.emit_file(out, child.as_ref(), &path, stats)?;
                    }
                    ContentDecision::Skip(reason) => {
                        tracing::debug!(path = %path, ?reason, "Skipped file content");
                        stats.files_skipped += 1;
                    }
                }
            }
        }
        Ok(ControlFlow::Continue(()))
    }

    /// Emit individually selected files in the given order. There is no
    /// directory context, so only the file-level rules apply.
    pub fn emit_selected(
        &self,
        out: &mut dyn Write,
        files: &[Box<dyn VirtualNode>],
        content: &ContentFilter,
        stats: &mut PackStats,
    ) -> Result<Flow, PackError> {
        for file in files {
            if self.cancel.is_cancelled() {
                return Ok(ControlFlow::Break(()));
            }
            if file.is_dir() {
                tracing::warn!(name = file.name(), "Ignoring directory in file selection");
                continue;
            }

            let path = file.name();
            if !self.bodies {
                self.progress.report(path);
                self.emit_container(out, path, stats)?;
                continue;
            }
            match content.decide(path, file.size()) {
                ContentDecision::Include => {
                    self.progress.report(path);
                    self.emit_file(out, file.as_ref(), path, stats)?;
                }
                ContentDecision::Skip(reason) => {
                    tracing::debug!(path, ?reason, "Skipped file content");
                    stats.files_skipped += 1;
                }
            }
        }
        Ok(ControlFlow::Continue(()))
    }

    /// Header and footer with nothing in between.
    fn emit_container(
        &self,
        out: &mut dyn Write,
        path: &str,
        stats: &mut PackStats,
    ) -> Result<(), PackError> {
        out.write_all(self.format.file_header(path).as_bytes())?;
        out.write_all(self.format.file_footer().as_bytes())?;
        stats.files_emitted += 1;
        Ok(())
    }

    /// Header, body (or placeholder) and footer for one file.
    pub fn emit_file(
        &self,
        out: &mut dyn Write,
        node: &dyn VirtualNode,
        path: &str,
        stats: &mut PackStats,
    ) -> Result<(), PackError> {
        out.write_all(self.format.file_header(path).as_bytes())?;

        let body = node
            .open()
            .map_err(BodyError::Read)
            .and_then(|reader| self.write_body(out, reader));

        match body {
            Ok(BodyKind::Text) => {}
            Ok(BodyKind::Binary) => stats.binary_files += 1,
            Err(BodyError::Write(e)) => return Err(e.into()),
            Err(BodyError::Read(e)) => {
                if is_access_revoked(&e) {
                    return Err(PackError::PermissionDenied(e.to_string()));
                }
                tracing::warn!(path = %path, error = %e, "Failed to read file");
                let reason = e.to_string();
                let placeholder = error_placeholder(&self.format.escape_line(&reason));
                out.write_all(placeholder.as_bytes())?;
                stats.read_errors += 1;
            }
        }

        out.write_all(self.format.file_footer().as_bytes())?;
        stats.files_emitted += 1;
        Ok(())
    }

    fn write_body(
        &self,
        out: &mut dyn Write,
        mut reader: NodeReader,
    ) -> Result<BodyKind, BodyError> {
        let (sample, binary) = sniff_binary(&mut reader).map_err(BodyError::Read)?;
        if binary {
            out.write_all(BINARY_PLACEHOLDER.as_bytes())
                .map_err(BodyError::Write)?;
            return Ok(BodyKind::Binary);
        }

        let lines = BufReader::new(Cursor::new(sample).chain(reader)).lines();
        let mut paragraph_open = false;
        match self.write_lines(out, lines, &mut paragraph_open) {
            Ok(()) => Ok(BodyKind::Text),
            Err(BodyError::Read(e)) => {
                // A compressed paragraph cut short is closed so the error
                // placeholder starts on its own line.
                if paragraph_open {
                    out.write_all(b"\n").map_err(BodyError::Write)?;
                }
                Err(BodyError::Read(e))
            }
            Err(e) => Err(e),
        }
    }

    fn write_lines<I>(
        &self,
        out: &mut dyn Write,
        lines: I,
        paragraph_open: &mut bool,
    ) -> Result<(), BodyError>
    where
        I: Iterator<Item = io::Result<String>>,
    {
        for line in lines {
            let line = line.map_err(BodyError::Read)?;
            if self.compress {
                let Some(trimmed) = compressed_line(&line) else {
                    continue;
                };
                let escaped = self.format.escape_line(trimmed);
                out.write_all(escaped.as_bytes())
                    .and_then(|()| out.write_all(b" "))
                    .map_err(BodyError::Write)?;
                *paragraph_open = true;
            } else {
                let escaped = self.format.escape_line(&line);
                out.write_all(escaped.as_bytes())
                    .and_then(|()| out.write_all(b"\n"))
                    .map_err(BodyError::Write)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packer::config::OutputFormat;

    /// Yields its bytes in tiny chunks to exercise the fill loop.
    struct Trickle {
        data: Vec<u8>,
        pos: usize,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let remaining = self.data.len() - self.pos;
            let n = remaining.min(3).min(buf.len());
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    /// A file node whose stream fails after some bytes.
    struct Flaky;

    impl VirtualNode for Flaky {
        fn name(&self) -> &str {
            "flaky.txt"
        }
        fn is_dir(&self) -> bool {
            false
        }
        fn size(&self) -> u64 {
            10
        }
        fn children(&self) -> io::Result<Vec<Box<dyn VirtualNode>>> {
            Ok(Vec::new())
        }
        fn open(&self) -> io::Result<NodeReader> {
            Err(io::Error::other("disk on fire"))
        }
    }

    #[test]
    fn test_sniff_fills_across_short_reads() {
        let mut data = vec![b'a'; 1000];
        data.push(0);
        let mut reader = Trickle { data, pos: 0 };
        let (sample, binary) = sniff_binary(&mut reader).expect("sniff");
        assert_eq!(sample.len(), 1001);
        assert!(binary);
    }

    #[test]
    fn test_sniff_only_looks_at_prefix() {
        let mut data = vec![b'a'; SNIFF_BYTES];
        data.push(0);
        let (sample, binary) = sniff_binary(&mut Cursor::new(data)).expect("sniff");
        assert_eq!(sample.len(), SNIFF_BYTES);
        assert!(!binary);
    }

    #[test]
    fn test_compress_lines_is_idempotent() {
        let input = "  fn main() {\n\n      println!(\"hi\");  \n\t}\n\n";
        let once = compress_lines(input);
        assert_eq!(once, "fn main() { println!(\"hi\"); } ");
        assert_eq!(compress_lines(&once), once);
    }

    #[test]
    fn test_read_failure_becomes_placeholder() {
        let config = PackerConfig::new().with_format(OutputFormat::Text);
        let cancel = CancelToken::new();
        let progress = ProgressSink::none();
        let emitter = ContentEmitter::new(&config, &cancel, &progress);
        let mut stats = PackStats::default();
        let mut out = Vec::new();

        emitter
            .emit_file(&mut out, &Flaky, "flaky.txt", &mut stats)
            .expect("recovered");

        let text = String::from_utf8(out).expect("utf8");
        assert_eq!(text, "\n--- flaky.txt ---\n[error reading file: disk on fire]\n\n");
        assert_eq!(stats.read_errors, 1);
        assert_eq!(stats.files_emitted, 1);
    }
}
