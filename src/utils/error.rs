// Copyright (c) 2026 the srcpack contributors
// SPDX-License-Identifier: Apache-2.0

use std::error::Error as _;
use std::path::PathBuf;
use std::sync::LazyLock;
use thiserror::Error;

/// Compiled regex patterns for redacting credentials that may ride along in URLs.
///
/// Note: These patterns are static literals validated by tests, so the
/// `expect()` calls can only fire on a programming error caught at first use.
static REDACTION_PATTERNS: LazyLock<[(regex::Regex, &'static str); 2]> = LazyLock::new(|| {
    [
        (
            regex::Regex::new(r"(https?://)[^/@\s]+@").expect("url userinfo pattern is invalid"),
            "${1}[REDACTED]@",
        ),
        (
            regex::Regex::new(r"(?i)((?:access_)?token=)[^&\s]+")
                .expect("token query pattern is invalid"),
            "${1}[REDACTED]",
        ),
    ]
});

#[derive(Debug, Error)]
pub enum PackError {
    #[error("Cannot create output {}: {source}", path.display())]
    DestinationUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Archive error: {message}")]
    ArchiveFormat {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Network error: {}", redact_sensitive_data(message))]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Failed to read {path}: {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid source: {}\nSuggestion: {suggestion}", redact_sensitive_data(message))]
    InvalidSource { message: String, suggestion: String },

    #[error("File system error: {0}")]
    Io(#[from] std::io::Error),
}

/// Redact credentials from error messages.
fn redact_sensitive_data(message: &str) -> String {
    let mut result = message.to_string();
    for (pattern, replacement) in REDACTION_PATTERNS.iter() {
        result = pattern.replace_all(&result, *replacement).to_string();
    }
    result
}

impl PackError {
    pub fn unsupported_host(url: &str) -> Self {
        PackError::InvalidSource {
            message: format!("Unsupported repository host in '{}'", url),
            suggestion: "Only https://github.com/<owner>/<repo> references can be downloaded"
                .to_string(),
        }
    }

    pub fn incomplete_repository(url: &str) -> Self {
        PackError::InvalidSource {
            message: format!("Repository reference '{}' is missing owner or name", url),
            suggestion: "Use the form https://github.com/<owner>/<repo>".to_string(),
        }
    }

    /// Classify an I/O error raised while walking a source tree.
    ///
    /// Permission failures are fatal for the whole invocation; everything else
    /// keeps its I/O identity.
    pub fn from_traversal(context: &str, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::PermissionDenied {
            PackError::PermissionDenied(format!("{}: {}", context, err))
        } else {
            PackError::Io(err)
        }
    }

    /// A hint for the user, when the error has an obvious remedy.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            PackError::InvalidSource { suggestion, .. } => Some(suggestion),
            PackError::DestinationUnavailable { .. } => {
                Some("Check that the output directory exists and is writable")
            }
            PackError::PermissionDenied(_) => {
                Some("Grant access to the source tree again and retry")
            }
            PackError::Network { .. } => Some("Check your network connection and retry"),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for PackError {
    fn from(err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            "Request timed out. Check your network connection.".to_string()
        } else if err.is_connect() {
            "Failed to connect to server. Check your network connection.".to_string()
        } else if err.is_status() {
            format!(
                "HTTP error: {}",
                err.status()
                    .map_or("unknown".to_string(), |s| s.to_string())
            )
        } else {
            "Network request failed".to_string()
        };

        PackError::Network {
            message,
            source: Some(Box::new(err)),
        }
    }
}

impl From<zip::result::ZipError> for PackError {
    fn from(err: zip::result::ZipError) -> Self {
        PackError::ArchiveFormat {
            message: format!("Failed to read archive: {}", err),
            source: Some(Box::new(err)),
        }
    }
}

/// Render an error for terminal display.
///
/// In verbose mode the full source chain is included.
pub fn format_error(error: &PackError, verbose: bool) -> String {
    let mut out = format!("\n\u{26a0} Error: {}", error);

    if let Some(suggestion) = error.suggestion() {
        if !matches!(error, PackError::InvalidSource { .. }) {
            out.push_str(&format!("\nSuggestion: {}", suggestion));
        }
    }

    if verbose {
        let mut source = error.source();
        while let Some(cause) = source {
            let cause_text = redact_sensitive_data(&cause.to_string());
            out.push_str(&format!("\n\u{2514}\u{2500} {}", cause_text));
            source = cause.source();
        }
    }

    out
}
