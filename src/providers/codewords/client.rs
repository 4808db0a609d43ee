use log::debug;
use reqwest::Client;
use serde_json::Value;

use crate::auth::Token;
use crate::config::{CodeWordsConfig, HttpConfig};
use crate::error::{Result, SurgeonError};
use crate::providers::{build_http_client, endpoint, error_body};

use super::types::WorkflowRequest;

/// Client for a CodeWords workflow service.
///
/// Credentials are optional at construction; a client without them fails
/// every call with [`SurgeonError::ExportDelivery`], which the export stage
/// turns into its CSV fallback.
#[derive(Clone)]
pub struct CodeWordsClient {
    client: Client,
    base_url: String,
    credentials: Option<(Token, String)>,
}

impl CodeWordsClient {
    pub fn new(config: &CodeWordsConfig, http: &HttpConfig) -> Result<Self> {
        let api_key = config.api_key.clone().filter(|k| !k.is_empty());
        let service_id = config
            .service_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(String::from);

        Ok(Self {
            client: build_http_client(http)?,
            base_url: config.base_url.clone(),
            credentials: api_key.zip(service_id),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    /// Run the workflow and return its raw JSON reply.
    pub async fn run_workflow(&self, request: &WorkflowRequest<'_>) -> Result<Value> {
        let (api_key, service_id) = self.credentials.as_ref().ok_or_else(|| {
            SurgeonError::ExportDelivery(
                "Missing CODEWORDS_API_KEY or CODEWORDS_SERVICE_ID".to_string(),
            )
        })?;

        let url = endpoint(&self.base_url, &format!("run/{service_id}"));
        debug!("Running workflow {service_id} with {} tickets", request.tickets.len());

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key.as_str())
            .json(request)
            .send()
            .await
            .map_err(|e| SurgeonError::ExportDelivery(format!("CodeWords request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = error_body(response).await;
            return Err(SurgeonError::ExportDelivery(format!(
                "CodeWords request failed: {} {body}",
                status.as_u16()
            )));
        }

        response.json().await.map_err(|e| {
            SurgeonError::ExportDelivery(format!("CodeWords returned an invalid body: {e}"))
        })
    }
}
