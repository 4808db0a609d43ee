use log::{debug, info, warn};

use crate::config::{GitHubConfig, HttpConfig, SourceLimits};
use crate::error::{Result, SurgeonError};

use super::client::GitHubClient;
use super::types::{GitTree, RepoRef};

/// Branch names tried, in order, to locate the default branch.
pub const BRANCH_CANDIDATES: [&str; 2] = ["main", "master"];

const IGNORED_DIRS: [&str; 7] = ["node_modules", ".next", "dist", "build", "vendor", "target", ".git"];

const IGNORED_EXTENSIONS: [&str; 17] = [
    "png", "jpg", "jpeg", "gif", "ico", "bmp", "webp", "pdf", "zip", "gz", "tar", "jar", "lock",
    "woff", "woff2", "ttf", "exe",
];

/// Collects the readable source text of a GitHub repository.
pub struct GitHubProvider {
    client: GitHubClient,
    limits: SourceLimits,
}

impl GitHubProvider {
    pub fn new(config: &GitHubConfig, http: &HttpConfig) -> Result<Self> {
        Ok(Self {
            client: GitHubClient::new(config, http)?,
            limits: config.limits,
        })
    }

    /// Fetch a repository and concatenate its text files.
    ///
    /// Locates the default branch by probing [`BRANCH_CANDIDATES`], filters the
    /// tree, then reads files one at a time so the size budget can be checked
    /// after each one.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - the URL is not a GitHub repository URL (`InvalidInput`)
    /// - no branch candidate yields a tree (`UpstreamFetch`)
    /// - no file yields non-empty content (`EmptyContent`)
    pub async fn fetch_repo_text(&self, repo_url: &str) -> Result<String> {
        let repo = RepoRef::parse(repo_url)?;
        info!("Reading repository {}", repo.full_name());

        let (branch, tree) = self.locate_tree(&repo).await?;
        if tree.truncated {
            warn!("Tree listing for {} was truncated by GitHub", repo.full_name());
        }

        let paths = select_paths(&tree, self.limits.max_files);
        info!("Selected {} files from {branch}", paths.len());

        let mut combined = String::new();
        let mut combined_chars = 0;
        for path in &paths {
            let Some(content) = self.fetch_file(&repo, branch, path).await else {
                continue;
            };
            if content.trim().is_empty() {
                continue;
            }

            let section = format!(
                "\n\n--- FILE: {path} ---\n{}",
                truncate_chars(&content, self.limits.max_file_chars)
            );
            combined_chars += section.chars().count();
            combined.push_str(&section);

            if combined_chars > self.limits.max_total_chars {
                debug!("Source budget reached after {path}");
                break;
            }
        }

        if combined.trim().is_empty() {
            return Err(SurgeonError::EmptyContent(
                "No readable text files found in the repository".to_string(),
            ));
        }

        Ok(combined)
    }

    async fn locate_tree(&self, repo: &RepoRef) -> Result<(&'static str, GitTree)> {
        for branch in BRANCH_CANDIDATES {
            match self.client.fetch_tree(repo, branch).await {
                Ok(Some(tree)) => return Ok((branch, tree)),
                Ok(None) => {}
                Err(e) => warn!("Tree listing for {branch} failed: {e}"),
            }
        }

        Err(SurgeonError::UpstreamFetch(
            "Could not read repo tree from GitHub API".to_string(),
        ))
    }

    /// Raw content of `path`, trying the resolved branch before the others.
    async fn fetch_file(&self, repo: &RepoRef, branch: &str, path: &str) -> Option<String> {
        let order = std::iter::once(branch)
            .chain(BRANCH_CANDIDATES.into_iter().filter(|candidate| *candidate != branch));

        for candidate in order {
            match self.client.fetch_raw_file(repo, candidate, path).await {
                Ok(Some(content)) => return Some(content),
                Ok(None) => {}
                Err(e) => warn!("Skipping {path} at {candidate}: {e}"),
            }
        }
        None
    }
}

/// Blob paths worth sending to the model, at most `max_files` of them.
pub(super) fn select_paths(tree: &GitTree, max_files: usize) -> Vec<String> {
    tree.tree
        .iter()
        .filter(|entry| entry.is_blob() && !entry.path.is_empty())
        .map(|entry| entry.path.as_str())
        .filter(|path| !is_ignored(path))
        .take(max_files)
        .map(String::from)
        .collect()
}

pub(super) fn is_ignored(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    let mut segments: Vec<&str> = lower.split('/').collect();
    let file_name = segments.pop().unwrap_or_default();

    if segments.iter().any(|dir| IGNORED_DIRS.contains(dir)) {
        return true;
    }

    file_name
        .rsplit_once('.')
        .is_some_and(|(_, ext)| IGNORED_EXTENSIONS.contains(&ext))
}

pub(super) fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
