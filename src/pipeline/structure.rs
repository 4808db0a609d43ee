use log::info;

use crate::error::{Result, SurgeonError};
use crate::extract::extract_json;
use crate::model::{ActionItems, StructuredOutput};
use crate::providers::dust::DustClient;

use super::prompts::structure_prompt;

/// Stage 3: turn the free-text plan into tickets via the Dust agent.
pub struct StructureStage {
    dust: DustClient,
}

impl StructureStage {
    pub fn new(dust: DustClient) -> Self {
        Self { dust }
    }

    pub async fn run(&self, actions: &ActionItems) -> Result<StructuredOutput> {
        if actions.actions.trim().is_empty() {
            return Err(SurgeonError::InvalidInput("Missing actions payload".to_string()));
        }

        let output = self.dust.run_agent(&structure_prompt(actions)).await?;
        let structured: StructuredOutput = extract_json(&output)?;

        info!("Agent produced {} tickets", structured.tickets.len());
        Ok(structured)
    }
}
