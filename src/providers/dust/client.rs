use log::debug;
use reqwest::Client;
use serde_json::Value;

use crate::auth::Token;
use crate::config::{DustConfig, HttpConfig};
use crate::error::{Result, SurgeonError};
use crate::providers::{build_http_client, endpoint, error_body};

use super::types::{ConversationRequest, ConversationResponse, Mention, MessageContext, UserMessage};

const CONVERSATION_TITLE: &str = "Repo Surgeon Structuring";

/// Client for a preconfigured Dust agent.
///
/// Every call opens a new single-turn conversation and blocks until the agent
/// has answered.
#[derive(Clone)]
pub struct DustClient {
    client: Client,
    base_url: String,
    api_key: Token,
    workspace_id: String,
    agent_id: String,
    username: String,
    timezone: String,
}

impl DustClient {
    pub fn new(config: &DustConfig, http: &HttpConfig) -> Result<Self> {
        let missing =
            || SurgeonError::Config("Missing DUST_API_KEY, DUST_WORKSPACE_ID, or DUST_AGENT_ID".to_string());

        let api_key = config.api_key.clone().filter(|k| !k.is_empty()).ok_or_else(missing)?;
        let workspace_id = non_blank(config.workspace_id.as_deref()).ok_or_else(missing)?;
        let agent_id = non_blank(config.agent_id.as_deref()).ok_or_else(missing)?;

        Ok(Self {
            client: build_http_client(http)?,
            base_url: config.base_url.clone(),
            api_key,
            workspace_id,
            agent_id,
            username: config.username.clone(),
            timezone: config.timezone.clone(),
        })
    }

    /// Send `content` to the agent and return its answer text.
    ///
    /// See [`ConversationResponse`] for how the answer is located.
    pub async fn run_agent(&self, content: &str) -> Result<String> {
        let url = endpoint(
            &self.base_url,
            &format!("api/v1/w/{}/assistant/conversations", self.workspace_id),
        );

        let request = ConversationRequest {
            message: UserMessage {
                content,
                mentions: vec![Mention {
                    configuration_id: &self.agent_id,
                }],
                context: MessageContext {
                    username: &self.username,
                    timezone: &self.timezone,
                    profile_picture_url: None,
                },
            },
            title: CONVERSATION_TITLE,
            blocking: true,
        };

        debug!("Opening conversation with agent {}", self.agent_id);
        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.as_str())
            .json(&request)
            .send()
            .await
            .map_err(|e| SurgeonError::UpstreamAgent(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = error_body(response).await;
            return Err(SurgeonError::UpstreamAgent(format!("{} {body}", status.as_u16())));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SurgeonError::UpstreamAgent(format!("Invalid response body: {e}")))?;

        Ok(ConversationResponse::output_text(&body))
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(String::from)
}
