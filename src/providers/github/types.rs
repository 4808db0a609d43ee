use serde::Deserialize;
use url::Url;

use crate::error::{Result, SurgeonError};

/// Owner/name pair identifying a GitHub repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl RepoRef {
    /// Parse a `https://github.com/<owner>/<repo>` URL.
    ///
    /// Accepts an optional `.git` suffix, a trailing slash and a missing
    /// scheme. Anything after the repository name (`/tree/main/src`) makes
    /// the URL invalid.
    pub fn parse(repo_url: &str) -> Result<Self> {
        let invalid = || SurgeonError::InvalidInput("Invalid GitHub repository URL".to_string());

        let trimmed = repo_url.trim();
        let with_scheme = if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("https://{trimmed}")
        };

        let url = Url::parse(&with_scheme).map_err(|_| invalid())?;
        let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
        if host != "github.com" && host != "www.github.com" {
            return Err(invalid());
        }

        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();

        let [owner, repo] = segments.as_slice() else {
            return Err(invalid());
        };

        let repo = repo.strip_suffix(".git").unwrap_or(repo);
        if owner.is_empty() || repo.is_empty() {
            return Err(invalid());
        }

        Ok(Self {
            owner: (*owner).to_string(),
            repo: repo.to_string(),
        })
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

/// Response of `GET /repos/{owner}/{repo}/git/trees/{ref}?recursive=1`.
#[derive(Debug, Deserialize)]
pub struct GitTree {
    #[serde(default)]
    pub tree: Vec<TreeEntry>,
    /// Set by GitHub when the listing was cut short for very large repos
    #[serde(default)]
    pub truncated: bool,
}

#[derive(Debug, Deserialize)]
pub struct TreeEntry {
    #[serde(default)]
    pub path: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

impl TreeEntry {
    pub fn is_blob(&self) -> bool {
        self.kind == "blob"
    }
}
