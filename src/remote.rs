// Copyright (c) 2026 the srcpack contributors
// SPDX-License-Identifier: Apache-2.0

//! Repository archive download.
//!
//! A GitHub repository reference is normalized to its `HEAD.zip` archive URL
//! and the archive is streamed into a temp file. The temp file is removed when
//! the returned handle is dropped, whether or not the pack succeeded.

use std::io::Write;
use std::time::Duration;

use futures::StreamExt;
use reqwest::Url;
use tempfile::NamedTempFile;

use crate::utils::error::PackError;

const GITHUB_HOSTS: &[&str] = &["github.com", "www.github.com"];
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// A normalized repository reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl RepoRef {
    pub fn archive_url(&self) -> String {
        format!(
            "https://github.com/{}/{}/archive/HEAD.zip",
            self.owner, self.repo
        )
    }
}

/// Whether `source` looks like a URL rather than a local path.
pub fn is_remote_reference(source: &str) -> bool {
    let lower = source.trim().to_lowercase();
    lower.starts_with("http://")
        || lower.starts_with("https://")
        || lower.starts_with("github.com/")
        || lower.starts_with("www.github.com/")
}

/// Normalize a GitHub repository reference.
///
/// Trailing slashes and a `.git` suffix are stripped, anything from
/// `/tree/<ref>` on is discarded, and hosts other than GitHub are rejected.
pub fn normalize_github_url(input: &str) -> Result<RepoRef, PackError> {
    let mut reference = input.trim().trim_end_matches('/');
    reference = reference.strip_suffix(".git").unwrap_or(reference);

    let with_scheme = if reference.contains("://") {
        reference.to_string()
    } else {
        format!("https://{}", reference)
    };

    let url = Url::parse(&with_scheme).map_err(|e| PackError::InvalidSource {
        message: format!("Cannot parse repository URL '{}': {}", input, e),
        suggestion: "Use the form https://github.com/<owner>/<repo>".to_string(),
    })?;

    let host = url.host_str().unwrap_or_default().to_lowercase();
    if !GITHUB_HOSTS.contains(&host.as_str()) {
        return Err(PackError::unsupported_host(input));
    }

    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    match segments.as_slice() {
        [owner, repo, rest @ ..] if rest.is_empty() || rest.first() == Some(&"tree") => {
            let repo: &str = repo;
            let repo = repo.strip_suffix(".git").unwrap_or(repo);
            if repo.is_empty() {
                return Err(PackError::incomplete_repository(input));
            }
            Ok(RepoRef {
                owner: (*owner).to_string(),
                repo: repo.to_string(),
            })
        }
        [_, _, ..] => Err(PackError::InvalidSource {
            message: format!("'{}' does not point at a repository root", input),
            suggestion: "Drop everything after the repository name, or use a /tree/<branch> link"
                .to_string(),
        }),
        _ => Err(PackError::incomplete_repository(input)),
    }
}

pub fn http_client() -> Result<reqwest::Client, PackError> {
    Ok(reqwest::Client::builder()
        .user_agent(concat!("srcpack/", env!("CARGO_PKG_VERSION")))
        .timeout(DOWNLOAD_TIMEOUT)
        .build()?)
}

/// Stream `url` into a fresh temp file. Non-success statuses are network errors.
pub async fn download_archive(
    client: &reqwest::Client,
    url: &str,
) -> Result<NamedTempFile, PackError> {
    tracing::info!(url = %url, "Downloading archive");

    let response = client.get(url).send().await?.error_for_status()?;

    let mut file = tempfile::Builder::new()
        .prefix("srcpack-")
        .suffix(".zip")
        .tempfile()?;

    let mut total: u64 = 0;
    let mut body = response.bytes_stream();
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        file.write_all(&chunk)?;
        total += chunk.len() as u64;
    }
    file.flush()?;

    tracing::debug!(bytes = total, path = %file.path().display(), "Archive downloaded");
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo(owner: &str, name: &str) -> RepoRef {
        RepoRef {
            owner: owner.to_string(),
            repo: name.to_string(),
        }
    }

    #[test]
    fn test_plain_and_suffixed_references() {
        assert_eq!(
            normalize_github_url("https://github.com/rust-lang/cargo").ok(),
            Some(repo("rust-lang", "cargo"))
        );
        assert_eq!(
            normalize_github_url("https://github.com/rust-lang/cargo.git/").ok(),
            Some(repo("rust-lang", "cargo"))
        );
        assert_eq!(
            normalize_github_url("github.com/rust-lang/cargo/").ok(),
            Some(repo("rust-lang", "cargo"))
        );
    }

    #[test]
    fn test_tree_suffix_is_discarded() {
        let parsed =
            normalize_github_url("https://github.com/o/r/tree/feature/x/src").expect("tree link");
        assert_eq!(parsed, repo("o", "r"));
        assert_eq!(parsed.archive_url(), "https://github.com/o/r/archive/HEAD.zip");
    }

    #[test]
    fn test_other_hosts_rejected() {
        let err = normalize_github_url("https://gitlab.com/o/r").expect_err("gitlab");
        assert!(err.to_string().contains("Unsupported repository host"));
    }

    #[test]
    fn test_missing_repo_rejected() {
        assert!(normalize_github_url("https://github.com/only-owner").is_err());
        assert!(normalize_github_url("https://github.com/o/r/blob/main/x.rs").is_err());
    }

    #[test]
    fn test_remote_detection() {
        assert!(is_remote_reference("https://github.com/o/r"));
        assert!(is_remote_reference("github.com/o/r"));
        assert!(!is_remote_reference("./src"));
        assert!(!is_remote_reference("/home/me/project"));
    }
}
