//! Prompt templates. Every prompt is a pure function of its inputs.

use crate::model::{ActionItems, RepoAnalysis};

/// Marker opening the improved plan in the verification reply.
pub const VERIFIED_ACTIONS_MARKER: &str = "VERIFIED_ACTIONS:";
/// Marker opening the reviewer's notes in the verification reply.
pub const VERIFICATION_NOTES_MARKER: &str = "VERIFICATION_NOTES:";

pub fn review_prompt(source_text: &str, language: Option<&str>) -> String {
    let language = language
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .unwrap_or("unknown");

    format!(
        r#"You are a senior software architect reviewing legacy code.
Analyze the input and return ONLY valid JSON with this exact schema:
{{
  "summary": "string",
  "architecture": "string",
  "fileBreakdown": "string",
  "legacyPatterns": "string",
  "dependencies": "string",
  "concerns": "string"
}}

Input language hint: {language}

Code/repo content:
{source_text}"#
    )
}

/// The analysis rendered as `## field` sections, shared by both stage 2 prompts.
pub fn analysis_text(analysis: &RepoAnalysis) -> String {
    analysis
        .sections()
        .iter()
        .map(|(name, value)| format!("## {name}\n{value}"))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn draft_actions_prompt(analysis_text: &str) -> String {
    format!(
        r#"Based on this analysis, generate detailed free-text action items grouped by:
- Migration Tasks
- Testing Improvements
- Security Fixes
- Refactoring
- Documentation

For each item include: title, what to do, why it matters, suggested priority, and effort.

Analysis:
{analysis_text}"#
    )
}

pub fn verify_actions_prompt(analysis_text: &str, draft: &str) -> String {
    format!(
        r#"You are reviewing an action plan for quality and correctness.
Compare the plan against the original analysis.

Return plain text with exactly these section headers:
{VERIFIED_ACTIONS_MARKER}
<improved free-text action items>

{VERIFICATION_NOTES_MARKER}
<what you changed and why>

Original analysis:
{analysis_text}

Action plan:
{draft}"#
    )
}

pub fn structure_prompt(actions: &ActionItems) -> String {
    format!(
        r#"Structure these action items into JSON.
Return ONLY valid JSON:
{{
  "tickets": [
    {{
      "id": "string",
      "priority": "P0|P1|P2|P3",
      "title": "string",
      "description": "string",
      "category": "migration|testing|refactor|security|documentation",
      "effort": "small|medium|large",
      "acceptanceCriteria": ["string"]
    }}
  ],
  "summary": "string"
}}

Action items:
{}

Verification notes:
{}"#,
        actions.actions, actions.verification_notes
    )
}
