// Copyright (c) 2026 the srcpack contributors
// SPDX-License-Identifier: Apache-2.0

//! Common test utilities and fixtures for integration tests.

#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

/// Creates a temporary directory for test fixtures.
pub fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

/// Creates a project directory named `name` inside `dir` holding `files`.
pub fn create_mock_project(dir: &TempDir, name: &str, files: &[(&str, &[u8])]) -> PathBuf {
    let root = dir.path().join(name);
    std::fs::create_dir_all(&root).expect("Failed to create project root");

    for (path, content) in files {
        let file_path = root.join(path);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(&file_path, content).expect("Failed to write file");
    }

    root
}

/// A small Rust project with a build output directory and a VCS directory.
const RUST_PROJECT: &[(&str, &[u8])] = &[
    (
        "Cargo.toml",
        b"[package]\nname = \"demo\"\nversion = \"0.1.0\"\n",
    ),
    ("src/main.rs", b"fn main() {\n    println!(\"Hello, world!\");\n}\n"),
    ("src/lib.rs", b"pub fn greet() -> &'static str {\n    \"Hello!\"\n}\n"),
    ("build/out.o", b"\x7fELF\x00\x00"),
    (".git/HEAD", b"ref: refs/heads/main\n"),
];

pub fn rust_project_files() -> &'static [(&'static str, &'static [u8])] {
    RUST_PROJECT
}

/// Builds an in-memory zip holding `entries`. A trailing `/` marks a
/// directory entry; everything else is stored as a file.
pub fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();

    for (name, content) in entries {
        if name.ends_with('/') {
            writer
                .add_directory(name.trim_end_matches('/'), options)
                .expect("Failed to add directory entry");
        } else {
            writer
                .start_file(*name, options)
                .expect("Failed to start zip entry");
            writer.write_all(content).expect("Failed to write zip entry");
        }
    }

    writer
        .finish()
        .expect("Failed to finish zip")
        .into_inner()
}

/// Writes [`build_zip`] output to `path`.
pub fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
    std::fs::write(path, build_zip(entries)).expect("Failed to write zip file");
}

/// Path of the compiled `srcpack` binary.
pub fn srcpack_bin() -> &'static str {
    env!("CARGO_BIN_EXE_srcpack")
}

/// Counts occurrences of `needle` in `haystack`.
pub fn count(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}
