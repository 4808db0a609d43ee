use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `POST /api/v1/w/{workspace}/assistant/conversations`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationRequest<'a> {
    pub message: UserMessage<'a>,
    pub title: &'a str,
    /// Ask the service to hold the response until the agent has answered
    pub blocking: bool,
}

#[derive(Debug, Serialize)]
pub struct UserMessage<'a> {
    pub content: &'a str,
    pub mentions: Vec<Mention<'a>>,
    pub context: MessageContext<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Mention<'a> {
    pub configuration_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageContext<'a> {
    pub username: &'a str,
    pub timezone: &'a str,
    pub profile_picture_url: Option<&'a str>,
}

/// Reply of a blocking conversation request.
///
/// Only the fields needed to find the agent's answer are modelled, and all of
/// them are optional. The answer is chosen in this order:
///
/// 1. a direct `output` or `answer` string
/// 2. the last message with `type == "agent"` and string `content`, scanning
///    every batch of `conversation.content` in order
/// 3. the raw JSON body, stringified
///
/// Each field is decoded on its own, so a malformed sibling never hides a
/// usable answer.
#[derive(Debug, Default)]
pub struct ConversationResponse {
    pub output: Option<String>,
    pub answer: Option<String>,
    pub conversation: Option<Conversation>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Conversation {
    pub content: Option<ConversationContent>,
}

/// `conversation.content`: a list of message batches, one per turn.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ConversationContent {
    Batches(Vec<MessageBatch>),
    Other(IgnoredAny),
}

/// One batch holds the message versions produced in a turn.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum MessageBatch {
    Messages(Vec<MessageEntry>),
    Other(IgnoredAny),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum MessageEntry {
    Message(ConversationMessage),
    Other(IgnoredAny),
}

#[derive(Debug, Deserialize)]
pub struct ConversationMessage {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub content: Option<Value>,
}

impl ConversationResponse {
    /// Pick the agent's answer out of a raw response body.
    pub fn output_text(raw: &Value) -> String {
        let parsed = Self::from_value(raw);
        parsed
            .direct_output()
            .or_else(|| parsed.last_agent_message())
            .map(String::from)
            .unwrap_or_else(|| raw.to_string())
    }

    pub fn from_value(raw: &Value) -> Self {
        let text = |key: &str| raw.get(key).and_then(Value::as_str).map(String::from);
        Self {
            output: text("output"),
            answer: text("answer"),
            conversation: raw
                .get("conversation")
                .and_then(|conversation| serde_json::from_value(conversation.clone()).ok()),
        }
    }

    fn direct_output(&self) -> Option<&str> {
        self.output.as_deref().or(self.answer.as_deref())
    }

    fn last_agent_message(&self) -> Option<&str> {
        let Some(ConversationContent::Batches(batches)) = self.conversation.as_ref()?.content.as_ref()
        else {
            return None;
        };

        batches
            .iter()
            .filter_map(|batch| match batch {
                MessageBatch::Messages(messages) => Some(messages),
                MessageBatch::Other(_) => None,
            })
            .flatten()
            .filter_map(|entry| match entry {
                MessageEntry::Message(message) if message.kind.as_deref() == Some("agent") => {
                    message.content.as_ref().and_then(Value::as_str)
                }
                _ => None,
            })
            .last()
    }
}
