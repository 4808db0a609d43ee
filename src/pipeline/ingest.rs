use log::info;

use crate::error::{Result, SurgeonError};
use crate::extract::extract_json;
use crate::model::{IngestInput, RepoAnalysis};
use crate::providers::gemini::GeminiClient;
use crate::providers::github::GitHubProvider;

use super::prompts::review_prompt;

/// Stage 1: gather source text and have the model review it.
pub struct IngestStage {
    github: GitHubProvider,
    gemini: GeminiClient,
}

impl IngestStage {
    pub fn new(github: GitHubProvider, gemini: GeminiClient) -> Self {
        Self { github, gemini }
    }

    /// Review pasted code or a GitHub repository.
    ///
    /// Pasted code wins when it is non-blank; the repository is never
    /// contacted in that case.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - neither input is usable (`InvalidInput`)
    /// - the repository cannot be read (`UpstreamFetch`, `EmptyContent`)
    /// - the model call fails (`UpstreamModel`)
    /// - the reply holds no analysis object (`MalformedModelOutput`)
    pub async fn run(&self, input: &IngestInput) -> Result<RepoAnalysis> {
        let source_text = self.acquire_source(input).await?;
        info!("Reviewing {} characters of source", source_text.chars().count());

        let prompt = review_prompt(&source_text, input.language.as_deref());
        let output = self.gemini.generate(&prompt).await?;

        extract_json(&output)
    }

    async fn acquire_source(&self, input: &IngestInput) -> Result<String> {
        if let Some(code) = non_blank(input.code_input.as_deref()) {
            return Ok(code.to_string());
        }

        match non_blank(input.repo_url.as_deref()) {
            Some(repo_url) => self.github.fetch_repo_text(repo_url).await,
            None => Err(SurgeonError::InvalidInput(
                "Provide either repoUrl or codeInput".to_string(),
            )),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
