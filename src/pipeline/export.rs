use log::{info, warn};
use serde_json::Value;

use crate::model::{
    ExportPayload, ExportProvider, ExportResult, GitHubIssueDraft, RepoContext,
    SlackMessagePayload, StructuredOutput, StructuredTicket,
};
use crate::output::tickets_to_csv;
use crate::providers::codewords::{CodeWordsClient, WorkflowReply, WorkflowRequest};

/// Label added to every synthesized issue.
pub const PRODUCT_LABEL: &str = "repo-surgeon";

/// How one export attempt ended. There are no further transitions.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportOutcome {
    Delivered(ExportPayload),
    FallenBack { csv: String, reason: String },
}

impl ExportOutcome {
    pub fn into_result(self, tickets_created: usize) -> ExportResult {
        match self {
            Self::Delivered(payload) => ExportResult {
                success: true,
                tickets_created,
                provider: ExportProvider::External,
                raw_response: Some(payload),
                csv_content: None,
                notes: None,
            },
            Self::FallenBack { csv, reason } => ExportResult {
                success: false,
                tickets_created,
                provider: ExportProvider::Fallback,
                raw_response: None,
                csv_content: Some(csv),
                notes: Some(format!(
                    "CodeWords failed, generated local CSV fallback: {reason}"
                )),
            },
        }
    }
}

/// Stage 4: hand the tickets to the automation runtime.
///
/// This stage never fails. Any delivery error is logged and replaced by a
/// CSV of the tickets.
pub struct ExportStage {
    codewords: CodeWordsClient,
}

impl ExportStage {
    pub fn new(codewords: CodeWordsClient) -> Self {
        Self { codewords }
    }

    pub async fn run(
        &self,
        structured: &StructuredOutput,
        repo_context: Option<&RepoContext>,
    ) -> ExportResult {
        self.attempt(structured, repo_context)
            .await
            .into_result(structured.tickets.len())
    }

    async fn attempt(
        &self,
        structured: &StructuredOutput,
        repo_context: Option<&RepoContext>,
    ) -> ExportOutcome {
        let request = WorkflowRequest {
            tickets: &structured.tickets,
            summary: &structured.summary,
            repo_context,
        };

        match self.codewords.run_workflow(&request).await {
            Ok(raw) => {
                info!("Exported {} tickets through CodeWords", structured.tickets.len());
                ExportOutcome::Delivered(normalize_reply(&raw, structured))
            }
            Err(e) => {
                warn!("Export failed, falling back to CSV: {e}");
                ExportOutcome::FallenBack {
                    csv: tickets_to_csv(structured),
                    reason: e.to_string(),
                }
            }
        }
    }
}

/// Take the runtime's drafts and message when well-formed, else synthesize them.
pub(crate) fn normalize_reply(raw: &Value, structured: &StructuredOutput) -> ExportPayload {
    let reply = WorkflowReply::from_value(raw);

    ExportPayload {
        github_issues_payload: reply
            .issue_drafts()
            .unwrap_or_else(|| synthesize_drafts(&structured.tickets)),
        slack_message_payload: SlackMessagePayload {
            text: reply
                .slack_text()
                .unwrap_or_else(|| default_notification(structured.tickets.len())),
            blocks: reply.slack_blocks(),
        },
    }
}

fn default_notification(count: usize) -> String {
    format!("Repo Surgeon generated {count} tickets.")
}

pub(crate) fn synthesize_drafts(tickets: &[StructuredTicket]) -> Vec<GitHubIssueDraft> {
    tickets.iter().map(issue_draft).collect()
}

fn issue_draft(ticket: &StructuredTicket) -> GitHubIssueDraft {
    let mut body = vec![
        "## Description".to_string(),
        ticket.description.clone(),
        String::new(),
        "## Acceptance Criteria".to_string(),
    ];
    body.extend(ticket.acceptance_criteria.iter().map(|c| format!("- {c}")));
    body.extend([
        String::new(),
        "## Metadata".to_string(),
        format!("- Category: {}", ticket.category),
        format!("- Effort: {}", ticket.effort),
        format!("- Source Ticket ID: {}", ticket.id),
    ]);

    GitHubIssueDraft {
        title: format!("[{}] {}", ticket.priority, ticket.title),
        body: body.join("\n"),
        labels: vec![
            ticket.priority.to_string(),
            ticket.category.to_string(),
            ticket.effort.to_string(),
            PRODUCT_LABEL.to_string(),
        ],
    }
}
