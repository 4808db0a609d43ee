//! Fixtures shared by the unit tests.

use serde_json::json;

use crate::auth::Token;
use crate::config::Config;
use crate::model::{Category, Effort, Priority, StructuredOutput, StructuredTicket};

pub const TEST_MODEL: &str = "gemini-test";

/// A complete config with every upstream pointed at `url`.
pub fn test_config(url: &str) -> Config {
    let mut config = Config::default();
    config.github.api_base_url = url.to_string();
    config.github.raw_base_url = url.to_string();
    config.gemini.api_key = Some(Token::from("gem-key"));
    config.gemini.model = TEST_MODEL.to_string();
    config.gemini.base_url = url.to_string();
    config.dust.api_key = Some(Token::from("dust-key"));
    config.dust.workspace_id = Some("ws-1".to_string());
    config.dust.agent_id = Some("agent-1".to_string());
    config.dust.base_url = url.to_string();
    config.codewords.api_key = Some(Token::from("cw-key"));
    config.codewords.service_id = Some("svc-1".to_string());
    config.codewords.base_url = url.to_string();
    config
}

/// `generateContent` body answering with `text`.
pub fn gemini_reply(text: &str) -> String {
    json!({"candidates": [{"content": {"parts": [{"text": text}]}, "finishReason": "STOP"}]})
        .to_string()
}

/// Dust conversation body whose last agent turn is `text`.
pub fn dust_reply(text: &str) -> String {
    json!({
        "conversation": {
            "content": [
                [{"type": "user_message", "content": "structure"}],
                [{"type": "agent", "content": text}]
            ]
        }
    })
    .to_string()
}

pub fn analysis_json() -> String {
    json!({
        "summary": "A tiny script",
        "architecture": "Single file",
        "fileBreakdown": "main.py prints a greeting",
        "legacyPatterns": "Python 2 print statement",
        "dependencies": "None",
        "concerns": "Will not run on Python 3"
    })
    .to_string()
}

pub fn structured_json() -> String {
    json!({
        "tickets": [{
            "id": "T-1",
            "priority": "P1",
            "title": "Port print statements to Python 3",
            "description": "Replace print statements with print()",
            "category": "migration",
            "effort": "small",
            "acceptanceCriteria": ["Runs on Python 3.12", "No print statements remain"]
        }],
        "summary": "One migration ticket"
    })
    .to_string()
}

pub fn sample_structured() -> StructuredOutput {
    StructuredOutput {
        tickets: vec![
            StructuredTicket {
                id: "T-1".to_string(),
                priority: Priority::P0,
                title: "Rotate leaked \"prod\" key".to_string(),
                description: "The key is committed, in config.py".to_string(),
                category: Category::Security,
                effort: Effort::Small,
                acceptance_criteria: vec![
                    "Key revoked".to_string(),
                    "Secret loaded from env".to_string(),
                ],
            },
            StructuredTicket {
                id: "T-2".to_string(),
                priority: Priority::P2,
                title: "Add smoke tests".to_string(),
                description: "Cover the CLI entry point".to_string(),
                category: Category::Testing,
                effort: Effort::Medium,
                acceptance_criteria: vec![],
            },
        ],
        summary: "Two tickets".to_string(),
    }
}

/// Preset mocks for each upstream route.
pub trait RouteExt {
    fn mock_gemini(&mut self) -> mockito::Mock;
    fn mock_dust(&mut self) -> mockito::Mock;
    fn mock_codewords(&mut self) -> mockito::Mock;
}

impl RouteExt for mockito::ServerGuard {
    fn mock_gemini(&mut self) -> mockito::Mock {
        self.mock(
            "POST",
            format!("/v1beta/models/{TEST_MODEL}:generateContent").as_str(),
        )
        .with_status(200)
        .with_header("content-type", "application/json")
    }

    fn mock_dust(&mut self) -> mockito::Mock {
        self.mock("POST", "/api/v1/w/ws-1/assistant/conversations")
            .with_status(200)
            .with_header("content-type", "application/json")
    }

    fn mock_codewords(&mut self) -> mockito::Mock {
        self.mock("POST", "/run/svc-1")
            .with_status(200)
            .with_header("content-type", "application/json")
    }
}
