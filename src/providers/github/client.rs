use log::debug;
use reqwest::Client;
use url::Url;

use crate::auth::Token;
use crate::config::{GitHubConfig, HttpConfig};
use crate::error::{Result, SurgeonError};
use crate::providers::{build_http_client, endpoint};

use super::types::{GitTree, RepoRef};

/// GitHub REST and raw-content client.
#[derive(Clone)]
pub struct GitHubClient {
    client: Client,
    api_base_url: String,
    raw_base_url: String,
    token: Option<Token>,
}

impl GitHubClient {
    /// Create a new GitHub client.
    ///
    /// # Arguments
    ///
    /// * `config` - API and raw-content base URLs plus the optional token
    /// * `http` - Outbound timeouts
    pub fn new(config: &GitHubConfig, http: &HttpConfig) -> Result<Self> {
        Ok(Self {
            client: build_http_client(http)?,
            api_base_url: config.api_base_url.clone(),
            raw_base_url: config.raw_base_url.clone(),
            token: config.token.clone().filter(|t| !t.is_empty()),
        })
    }

    fn auth_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(token) = &self.token {
            request.bearer_auth(token.as_str())
        } else {
            request
        }
    }

    /// Fetch the recursive file tree of `branch`.
    ///
    /// Returns `Ok(None)` when GitHub answers with a non-success status, so
    /// callers can move on to the next branch candidate.
    pub async fn fetch_tree(&self, repo: &RepoRef, branch: &str) -> Result<Option<GitTree>> {
        let url = endpoint(
            &self.api_base_url,
            &format!("repos/{}/{}/git/trees/{}", repo.owner, repo.repo, branch),
        );

        let response = self
            .auth_request(
                self.client
                    .get(&url)
                    .query(&[("recursive", "1")])
                    .header(reqwest::header::ACCEPT, "application/vnd.github+json"),
            )
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            debug!("Tree listing for {} at {branch} returned {status}", repo.full_name());
            return Ok(None);
        }

        Ok(Some(response.json().await?))
    }

    /// Fetch one file's raw text from `branch`.
    ///
    /// Returns `Ok(None)` for any non-success status.
    pub async fn fetch_raw_file(
        &self,
        repo: &RepoRef,
        branch: &str,
        path: &str,
    ) -> Result<Option<String>> {
        let url = self.raw_file_url(repo, branch, path)?;
        let response = self.auth_request(self.client.get(url)).send().await?;

        let status = response.status();
        if !status.is_success() {
            debug!("Raw fetch of {path} at {branch} returned {status}");
            return Ok(None);
        }

        Ok(Some(response.text().await?))
    }

    fn raw_file_url(&self, repo: &RepoRef, branch: &str, path: &str) -> Result<Url> {
        let mut url = Url::parse(&self.raw_base_url)
            .map_err(|e| SurgeonError::Config(format!("Invalid raw content URL: {e}")))?;

        url.path_segments_mut()
            .map_err(|()| SurgeonError::Config("Raw content URL cannot be a base".to_string()))?
            .pop_if_empty()
            .push(&repo.owner)
            .push(&repo.repo)
            .push(branch)
            .extend(path.split('/').filter(|segment| !segment.is_empty()));

        Ok(url)
    }
}
