use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{GitHubIssueDraft, RepoContext, StructuredTicket};

/// Body of `POST /run/{service_id}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowRequest<'a> {
    pub tickets: &'a [StructuredTicket],
    pub summary: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo_context: Option<&'a RepoContext>,
}

/// The parts of a workflow reply that are recognised.
///
/// Workflows are user-authored, so nothing here is guaranteed; every field is
/// optional and values of the wrong shape are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowReply {
    pub github_issues_payload: Option<Value>,
    /// Older workflows answer with `issues`
    pub issues: Option<Value>,
    pub slack_message_payload: Option<Value>,
}

impl WorkflowReply {
    pub fn from_value(raw: &Value) -> Self {
        serde_json::from_value(raw.clone()).unwrap_or_default()
    }

    /// Issue drafts, when the reply carries a non-empty well-formed list.
    pub fn issue_drafts(&self) -> Option<Vec<GitHubIssueDraft>> {
        let list = self.github_issues_payload.as_ref().or(self.issues.as_ref())?;
        serde_json::from_value::<Vec<GitHubIssueDraft>>(list.clone())
            .ok()
            .filter(|drafts| !drafts.is_empty())
    }

    /// Non-empty notification text.
    pub fn slack_text(&self) -> Option<String> {
        self.slack_message_payload
            .as_ref()?
            .get("text")?
            .as_str()
            .filter(|text| !text.is_empty())
            .map(String::from)
    }

    pub fn slack_blocks(&self) -> Option<Vec<Value>> {
        self.slack_message_payload
            .as_ref()?
            .get("blocks")?
            .as_array()
            .cloned()
    }
}
