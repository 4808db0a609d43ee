use log::debug;
use reqwest::Client;

use crate::auth::Token;
use crate::config::{GeminiConfig, HttpConfig};
use crate::error::{Result, SurgeonError};
use crate::providers::{build_http_client, endpoint, error_body};

use super::types::{GenerateContentRequest, GenerateContentResponse};

/// Text-generation client for the Gemini `generateContent` API.
///
/// One prompt in, one non-streaming text reply out. There is no retry: any
/// failure is returned as [`SurgeonError::UpstreamModel`].
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: Token,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig, http: &HttpConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| SurgeonError::Config("Missing GEMINI_API_KEY".to_string()))?;

        Ok(Self {
            client: build_http_client(http)?,
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            api_key,
        })
    }

    /// Send `prompt` and return the model's reply text.
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let url = endpoint(
            &self.base_url,
            &format!("v1beta/models/{}:generateContent", self.model),
        );
        debug!("Sending {} character prompt to {}", prompt.len(), self.model);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.api_key.as_str())
            .json(&GenerateContentRequest::single_prompt(prompt))
            .send()
            .await
            .map_err(|e| SurgeonError::UpstreamModel(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = error_body(response).await;
            return Err(SurgeonError::UpstreamModel(format!("{} {body}", status.as_u16())));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| SurgeonError::UpstreamModel(format!("Invalid response body: {e}")))?;

        body.text()
            .ok_or_else(|| SurgeonError::UpstreamModel(body.empty_reason()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn client_for(server: &mockito::ServerGuard) -> GeminiClient {
        let config = GeminiConfig {
            api_key: Some(Token::from("gem-key")),
            model: "gemini-2.0-flash".to_string(),
            base_url: server.url(),
        };
        GeminiClient::new(&config, &HttpConfig::default()).unwrap()
    }

    #[test]
    fn test_missing_api_key_is_config_error() {
        let result = GeminiClient::new(&GeminiConfig::default(), &HttpConfig::default());
        assert!(matches!(result, Err(SurgeonError::Config(_))));
    }

    #[tokio::test]
    async fn test_generate_returns_joined_parts() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1beta/models/gemini-2.0-flash:generateContent")
            .match_header("x-goog-api-key", "gem-key")
            .match_body(Matcher::PartialJson(json!({
                "contents": [{"role": "user", "parts": [{"text": "hello"}]}]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "candidates": [{
                        "content": {"parts": [{"text": "Hi "}, {"text": "there"}]},
                        "finishReason": "STOP"
                    }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let text = client_for(&server).generate("hello").await.unwrap();
        assert_eq!(text, "Hi there");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_success_status_is_upstream_model_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", Matcher::Any)
            .with_status(429)
            .with_body("quota exceeded")
            .create_async()
            .await;

        let err = client_for(&server).generate("hello").await.unwrap_err();
        assert!(matches!(err, SurgeonError::UpstreamModel(_)));
        assert!(err.to_string().contains("429 quota exceeded"));
    }

    #[tokio::test]
    async fn test_blocked_prompt_is_upstream_model_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", Matcher::Any)
            .with_status(200)
            .with_body(json!({"promptFeedback": {"blockReason": "SAFETY"}}).to_string())
            .create_async()
            .await;

        let err = client_for(&server).generate("hello").await.unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_upstream_model_error() {
        let config = GeminiConfig {
            api_key: Some(Token::from("k")),
            base_url: "http://127.0.0.1:1".to_string(),
            ..GeminiConfig::default()
        };
        let client = GeminiClient::new(&config, &HttpConfig::default()).unwrap();
        let err = client.generate("hello").await.unwrap_err();
        assert!(matches!(err, SurgeonError::UpstreamModel(_)));
    }
}
