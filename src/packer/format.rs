// Copyright (c) 2026 the srcpack contributors
// SPDX-License-Identifier: Apache-2.0

//! Per-format delimiters and escaping.

use std::borrow::Cow;

use super::config::OutputFormat;

/// Written in place of the body of a file whose sample contains a NUL byte.
pub const BINARY_PLACEHOLDER: &str = "[binary content omitted]\n";

/// Title of the structure section in Markdown and Text output.
pub const TREE_SECTION_TITLE: &str = "Project Structure";

/// Inline marker for a file that could not be read.
pub fn error_placeholder(reason: &str) -> String {
    format!("[error reading file: {}]\n", reason)
}

/// Escape `&`, `<` and `>` for XML text. `&` goes first so the entities
/// introduced for `<` and `>` are not escaped again.
pub fn xml_escape(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>']) {
        return Cow::Borrowed(text);
    }
    Cow::Owned(
        text.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;"),
    )
}

/// [`xml_escape`] plus `"`, for attribute values.
pub fn xml_attr_escape(text: &str) -> Cow<'_, str> {
    match xml_escape(text) {
        Cow::Borrowed(s) if !s.contains('"') => Cow::Borrowed(s),
        escaped => Cow::Owned(escaped.replace('"', "&quot;")),
    }
}

/// Extension of a file name without the dot, or `""` when there is none.
pub fn extension_of(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext,
        _ => "",
    }
}

/// Delimiters for one output format.
pub trait DocumentFormat: Sync {
    fn document_header(&self, project: &str) -> String;

    fn document_footer(&self) -> &'static str;

    /// `path` is the root-relative identifier; the extension comes from it.
    fn file_header(&self, path: &str) -> String;

    fn file_footer(&self) -> &'static str;

    /// Escape one line of file content.
    fn escape_line<'a>(&self, line: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(line)
    }

    /// Opening of a directory container; only formats that nest have one.
    fn dir_open(&self, _name: &str) -> Option<String> {
        None
    }

    fn dir_close(&self) -> Option<&'static str> {
        None
    }

    /// Wrapper around the rendered tree, or `None` when the format carries
    /// structure in its nesting instead.
    fn tree_section(&self, _tree: &str) -> Option<String>;
}

#[derive(Debug, Clone, Copy)]
pub struct MarkdownFormat;

#[derive(Debug, Clone, Copy)]
pub struct XmlFormat;

#[derive(Debug, Clone, Copy)]
pub struct TextFormat;

fn fenced_tree(tree: &str) -> String {
    format!("## {}\n```\n{}```\n", TREE_SECTION_TITLE, tree)
}

impl DocumentFormat for MarkdownFormat {
    fn document_header(&self, project: &str) -> String {
        format!("# Project: {}\n\n", project)
    }

    fn document_footer(&self) -> &'static str {
        ""
    }

    fn file_header(&self, path: &str) -> String {
        let name = path.rsplit('/').next().unwrap_or(path);
        format!("\n## {}\n```{}\n", path, extension_of(name))
    }

    fn file_footer(&self) -> &'static str {
        "```\n"
    }

    fn tree_section(&self, tree: &str) -> Option<String> {
        Some(fenced_tree(tree))
    }
}

impl DocumentFormat for XmlFormat {
    fn document_header(&self, project: &str) -> String {
        format!("<project name=\"{}\">\n<files>\n", xml_attr_escape(project))
    }

    fn document_footer(&self) -> &'static str {
        "</files>\n</project>"
    }

    fn file_header(&self, path: &str) -> String {
        format!("\n<file path=\"{}\">\n", xml_attr_escape(path))
    }

    fn file_footer(&self) -> &'static str {
        "</file>\n"
    }

    fn escape_line<'a>(&self, line: &'a str) -> Cow<'a, str> {
        xml_escape(line)
    }

    fn dir_open(&self, name: &str) -> Option<String> {
        Some(format!("<dir name=\"{}\">\n", xml_attr_escape(name)))
    }

    fn dir_close(&self) -> Option<&'static str> {
        Some("</dir>\n")
    }

    fn tree_section(&self, _tree: &str) -> Option<String> {
        None
    }
}

impl DocumentFormat for TextFormat {
    fn document_header(&self, _project: &str) -> String {
        String::new()
    }

    fn document_footer(&self) -> &'static str {
        ""
    }

    fn file_header(&self, path: &str) -> String {
        format!("\n--- {} ---\n", path)
    }

    fn file_footer(&self) -> &'static str {
        "\n"
    }

    fn tree_section(&self, tree: &str) -> Option<String> {
        Some(fenced_tree(tree))
    }
}

/// Strategy for `format`.
pub fn strategy(format: OutputFormat) -> &'static dyn DocumentFormat {
    match format {
        OutputFormat::Markdown => &MarkdownFormat,
        OutputFormat::Xml => &XmlFormat,
        OutputFormat::Text => &TextFormat,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xml_escape_is_order_safe() {
        assert_eq!(xml_escape("&<>"), "&amp;&lt;&gt;");
        assert_eq!(xml_escape("a &lt; b"), "a &amp;lt; b");
        assert!(matches!(xml_escape("plain"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_attr_escape_quotes() {
        assert_eq!(xml_attr_escape("say \"hi\" & <go>"), "say &quot;hi&quot; &amp; &lt;go&gt;");
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("main.rs"), "rs");
        assert_eq!(extension_of("archive.tar.gz"), "gz");
        assert_eq!(extension_of("Makefile"), "");
        assert_eq!(extension_of(".gitignore"), "");
    }

    #[test]
    fn test_markdown_literals() {
        let md = strategy(OutputFormat::Markdown);
        assert_eq!(md.document_header("demo"), "# Project: demo\n\n");
        assert_eq!(md.file_header("src/main.rs"), "\n## src/main.rs\n```rs\n");
        assert_eq!(md.file_header("LICENSE"), "\n## LICENSE\n```\n");
        assert_eq!(md.file_footer(), "```\n");
        assert_eq!(md.document_footer(), "");
        assert!(md.dir_open("src").is_none());
    }

    #[test]
    fn test_xml_literals() {
        let xml = strategy(OutputFormat::Xml);
        assert_eq!(xml.document_header("a&b"), "<project name=\"a&amp;b\">\n<files>\n");
        assert_eq!(xml.document_footer(), "</files>\n</project>");
        assert_eq!(xml.file_header("x.rs"), "\n<file path=\"x.rs\">\n");
        assert_eq!(xml.file_footer(), "</file>\n");
        assert_eq!(xml.escape_line("if a < b && c"), "if a &lt; b &amp;&amp; c");
        assert!(xml.tree_section("anything").is_none());
    }

    #[test]
    fn test_text_literals() {
        let text = strategy(OutputFormat::Text);
        assert_eq!(text.document_header("demo"), "");
        assert_eq!(text.file_header("a.txt"), "\n--- a.txt ---\n");
        assert_eq!(text.file_footer(), "\n");
        assert_eq!(text.escape_line("<raw>"), "<raw>");
        assert_eq!(
            text.tree_section("x\n").as_deref(),
            Some("## Project Structure\n```\nx\n```\n")
        );
    }
}
