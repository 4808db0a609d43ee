pub mod actions;
pub mod export;
pub mod ingest;
pub mod prompts;
pub mod structure;

use log::{info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::model::{IngestInput, PipelineReport, RepoContext};
use crate::providers::codewords::CodeWordsClient;
use crate::providers::dust::DustClient;
use crate::providers::gemini::GeminiClient;
use crate::providers::github::{GitHubProvider, RepoRef};

pub use actions::ActionStage;
pub use export::ExportStage;
pub use ingest::IngestStage;
pub use structure::StructureStage;

/// One of the four chained stages, in run order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Ingest,
    Actions,
    Structure,
    Export,
}

impl Stage {
    pub const COUNT: usize = 4;

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Told when each stage of a chained run settles.
pub trait StageObserver {
    fn stage_finished(&mut self, _stage: Stage) {}

    fn stage_failed(&mut self, _stage: Stage) {}
}

impl StageObserver for () {}

/// The four stages, each usable on its own or chained by [`Pipeline::run`].
pub struct Pipeline {
    pub ingest: IngestStage,
    pub actions: ActionStage,
    pub structure: StructureStage,
    pub export: ExportStage,
}

impl Pipeline {
    /// Build every client from configuration.
    ///
    /// # Errors
    ///
    /// Fails when the Gemini or Dust credentials are missing or an HTTP
    /// client cannot be created. Missing CodeWords credentials are allowed.
    pub fn new(config: &Config) -> Result<Self> {
        let gemini = GeminiClient::new(&config.gemini, &config.http)?;
        let codewords = CodeWordsClient::new(&config.codewords, &config.http)?;
        if !codewords.is_configured() {
            warn!("CodeWords credentials are not set, exports will fall back to CSV");
        }

        Ok(Self {
            ingest: IngestStage::new(
                GitHubProvider::new(&config.github, &config.http)?,
                gemini.clone(),
            ),
            actions: ActionStage::new(gemini),
            structure: StructureStage::new(DustClient::new(&config.dust, &config.http)?),
            export: ExportStage::new(codewords),
        })
    }

    /// Run all four stages in order, stopping at the first stage 1-3 error.
    pub async fn run(&self, input: &IngestInput) -> Result<PipelineReport> {
        self.run_observed(input, &mut ()).await
    }

    /// [`Pipeline::run`], reporting each stage to `observer` as it settles.
    pub async fn run_observed(
        &self,
        input: &IngestInput,
        observer: &mut impl StageObserver,
    ) -> Result<PipelineReport> {
        let step1 = settle(observer, Stage::Ingest, self.ingest.run(input).await)?;
        let step2 = settle(observer, Stage::Actions, self.actions.run(&step1).await)?;
        let step3 = settle(observer, Stage::Structure, self.structure.run(&step2).await)?;
        let step4 = self.export.run(&step3, repo_context_for(input).as_ref()).await;
        observer.stage_finished(Stage::Export);

        info!(
            "Pipeline finished: {} tickets, export provider {:?}",
            step3.tickets.len(),
            step4.provider
        );

        Ok(PipelineReport {
            step1,
            step2,
            step3,
            step4,
        })
    }
}

fn settle<T>(observer: &mut impl StageObserver, stage: Stage, result: Result<T>) -> Result<T> {
    match &result {
        Ok(_) => observer.stage_finished(stage),
        Err(_) => observer.stage_failed(stage),
    }
    result
}

/// Repository context for runs whose source came from a repository URL.
pub(crate) fn repo_context_for(input: &IngestInput) -> Option<RepoContext> {
    let pasted = input
        .code_input
        .as_deref()
        .is_some_and(|code| !code.trim().is_empty());
    if pasted {
        return None;
    }

    let repo_url = input.repo_url.as_deref()?.trim();
    let repo = RepoRef::parse(repo_url).ok()?;
    Some(RepoContext {
        repo_url: Some(repo_url.to_string()),
        owner: Some(repo.owner),
        repo: Some(repo.repo),
    })
}
