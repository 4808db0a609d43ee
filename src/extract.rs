//! Tolerant extraction of JSON objects from model replies.
//!
//! Language models asked for "only JSON" still wrap their answer in prose or
//! markdown fences. [`extract_json`] first tries the whole reply, then falls
//! back to the substring between the first `{` and the last `}`. Nothing
//! smarter is attempted: a reply with several objects or unbalanced braces is
//! rejected.

use serde::de::DeserializeOwned;

use crate::error::{Result, SurgeonError};

/// Parse `T` out of a model reply.
///
/// # Errors
///
/// Returns [`SurgeonError::MalformedModelOutput`] when neither the trimmed
/// text nor the first-brace-to-last-brace slice deserializes into `T`.
pub fn extract_json<T: DeserializeOwned>(text: &str) -> Result<T> {
    let trimmed = text.trim();
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Ok(value);
    }

    let slice = object_slice(trimmed).ok_or_else(|| {
        SurgeonError::MalformedModelOutput("Could not parse JSON from model output".to_string())
    })?;

    serde_json::from_str(slice).map_err(|e| {
        SurgeonError::MalformedModelOutput(format!("Could not parse JSON from model output: {e}"))
    })
}

/// The text from the first `{` to the last `}`, inclusive.
fn object_slice(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
