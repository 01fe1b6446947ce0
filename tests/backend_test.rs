// Copyright (c) 2026 the srcpack contributors
// SPDX-License-Identifier: Apache-2.0

//! Packing through the archive and provider backends.

mod common;

use common::{create_mock_project, create_temp_dir, write_zip};
use srcpack::packer::{
    Blacklist, OutputFormat, Packer, PackerConfig, ProgressSink, STRUCTURE_PHASE,
};
use srcpack::source::{Source, pack_source_blocking};
use srcpack::utils::error::PackError;
use srcpack::vfs::{DocumentProvider, ProviderNode, ScopedTreeProvider};
use std::sync::Arc;

fn text_packer() -> Packer {
    Packer::new(
        PackerConfig::new().with_format(OutputFormat::Text),
        Blacklist::empty(),
    )
}

mod archive_backend {
    use super::*;

    #[test]
    fn test_wrapper_directory_becomes_root() {
        let temp_dir = create_temp_dir();
        let zip_path = temp_dir.path().join("widget.zip");
        write_zip(
            &zip_path,
            &[
                ("widget-main/", b""),
                ("widget-main/src/lib.rs", b"pub fn f() {}\n"),
                ("widget-main/README.md", b"# widget\n"),
            ],
        );
        let destination = temp_dir.path().join("out.txt");

        let outcome = pack_source_blocking(Source::Archive(zip_path), &destination, &text_packer())
            .expect("pack archive");

        let doc = std::fs::read_to_string(&destination).expect("read output");
        assert_eq!(
            doc,
            "## Project Structure\n```\n\u{1f4e6} widget-main/\n  \u{1f4c1} src/\n    \u{1f4c4} lib.rs\n  \u{1f4c4} README.md\n```\n\n--- src/lib.rs ---\npub fn f() {}\n\n\n--- README.md ---\n# widget\n\n"
        );
        assert_eq!(outcome.stats().files_emitted, 2);
    }

    #[test]
    fn test_flat_archive_uses_file_stem_as_root() {
        let temp_dir = create_temp_dir();
        let zip_path = temp_dir.path().join("bundle.zip");
        write_zip(&zip_path, &[("a.txt", b"a\n"), ("b/c.txt", b"c\n")]);
        let destination = temp_dir.path().join("out.txt");

        pack_source_blocking(Source::Archive(zip_path), &destination, &text_packer())
            .expect("pack archive");

        let doc = std::fs::read_to_string(&destination).expect("read output");
        assert!(doc.starts_with("## Project Structure\n```\n\u{1f4e6} bundle/\n  \u{1f4c1} b/\n"));
        assert!(doc.contains("--- b/c.txt ---\nc\n"));
    }

    #[test]
    fn test_archive_honours_its_ignore_file() {
        let temp_dir = create_temp_dir();
        let zip_path = temp_dir.path().join("repo.zip");
        write_zip(
            &zip_path,
            &[
                ("repo/.gitignore", b"dist/\n"),
                ("repo/dist/bundle.js", b"minified();\n"),
                ("repo/index.js", b"main();\n"),
            ],
        );
        let destination = temp_dir.path().join("out.txt");

        pack_source_blocking(Source::Archive(zip_path), &destination, &text_packer())
            .expect("pack archive");

        let doc = std::fs::read_to_string(&destination).expect("read output");
        assert!(doc.contains("main();"));
        assert!(!doc.contains("minified"));
        assert!(!doc.contains("\u{1f4c1} dist/"));
    }

    #[test]
    fn test_corrupt_archive_is_reported() {
        let temp_dir = create_temp_dir();
        let zip_path = temp_dir.path().join("broken.zip");
        std::fs::write(&zip_path, b"PK\x03\x04 definitely not a zip").expect("write");

        let err = pack_source_blocking(
            Source::Archive(zip_path),
            &temp_dir.path().join("out.txt"),
            &text_packer(),
        )
        .expect_err("corrupt archive");

        assert!(matches!(err, PackError::ArchiveFormat { .. }));
    }
}

mod provider_backend {
    use super::*;

    #[test]
    fn test_provider_tree_matches_filesystem() {
        let temp_dir = create_temp_dir();
        let root = create_mock_project(
            &temp_dir,
            "proj",
            &[("a.txt", b"hello\n"), ("build/x.o", b"\x00")],
        );
        let provider: Arc<dyn DocumentProvider> =
            Arc::new(ScopedTreeProvider::new(&root).expect("grant"));

        let node = ProviderNode::root(provider).expect("root");
        let mut out = Vec::new();
        text_packer().pack_tree(&node, &mut out).expect("pack");

        assert_eq!(
            String::from_utf8(out).expect("utf8 output"),
            "## Project Structure\n```\n\u{1f4e6} proj/\n  \u{1f4c4} a.txt\n```\n\n--- a.txt ---\nhello\n\n"
        );
    }

    #[test]
    fn test_revoked_before_pack_is_permission_denied() {
        let temp_dir = create_temp_dir();
        let root = create_mock_project(&temp_dir, "proj", &[("a.txt", b"hello\n")]);
        let grant = Arc::new(ScopedTreeProvider::new(&root).expect("grant"));

        let node = ProviderNode::root(Arc::clone(&grant) as Arc<dyn DocumentProvider>)
            .expect("root");
        grant.revoke();

        let err = text_packer()
            .pack_tree(&node, Vec::new())
            .expect_err("revoked grant");
        assert!(matches!(err, PackError::PermissionDenied(_)));
    }

    #[test]
    fn test_revoked_mid_pack_aborts() {
        let temp_dir = create_temp_dir();
        let root = create_mock_project(
            &temp_dir,
            "proj",
            &[("a.txt", b"first\n"), ("b.txt", b"second\n")],
        );
        let grant = Arc::new(ScopedTreeProvider::new(&root).expect("grant"));

        let progress = {
            let grant = Arc::clone(&grant);
            ProgressSink::from_fn(move |unit| {
                if unit != STRUCTURE_PHASE {
                    grant.revoke();
                }
            })
        };

        let node = ProviderNode::root(Arc::clone(&grant) as Arc<dyn DocumentProvider>)
            .expect("root");
        let err = text_packer()
            .with_progress(progress)
            .pack_tree(&node, Vec::new())
            .expect_err("grant revoked while packing");

        assert!(matches!(err, PackError::PermissionDenied(_)));
    }
}
