use log::{info, warn};

use crate::error::Result;
use crate::model::{ActionItems, RepoAnalysis};
use crate::providers::gemini::GeminiClient;

use super::prompts::{
    analysis_text, draft_actions_prompt, verify_actions_prompt, VERIFICATION_NOTES_MARKER,
    VERIFIED_ACTIONS_MARKER,
};

/// Stage 2: draft an action plan, then have the model verify it.
pub struct ActionStage {
    gemini: GeminiClient,
}

impl ActionStage {
    pub fn new(gemini: GeminiClient) -> Self {
        Self { gemini }
    }

    /// Two sequential model calls: draft, then verify against the analysis.
    pub async fn run(&self, analysis: &RepoAnalysis) -> Result<ActionItems> {
        let analysis_text = analysis_text(analysis);

        info!("Drafting action items");
        let draft = self.gemini.generate(&draft_actions_prompt(&analysis_text)).await?;

        info!("Verifying action items");
        let verified = self
            .gemini
            .generate(&verify_actions_prompt(&analysis_text, &draft))
            .await?;

        Ok(split_verification(&verified, &draft))
    }
}

/// Split the verification reply into actions and notes.
///
/// Without a `VERIFICATION_NOTES:` marker the reply is not trusted: the draft
/// is kept and the notes are empty. An empty actions section also falls back
/// to the draft.
pub(crate) fn split_verification(verified: &str, draft: &str) -> ActionItems {
    let Some((actions_part, notes_part)) = verified.split_once(VERIFICATION_NOTES_MARKER) else {
        warn!("Verification reply has no {VERIFICATION_NOTES_MARKER} section, keeping draft");
        return ActionItems {
            actions: draft.to_string(),
            verification_notes: String::new(),
        };
    };

    let actions = actions_part.replacen(VERIFIED_ACTIONS_MARKER, "", 1);
    let actions = actions.trim();

    ActionItems {
        actions: if actions.is_empty() {
            draft.to_string()
        } else {
            actions.to_string()
        },
        verification_notes: notes_part.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{gemini_reply, test_config, RouteExt};
    use mockito::Matcher;

    #[test]
    fn test_split_on_both_markers() {
        let items = split_verification("VERIFIED_ACTIONS:\nfoo\nVERIFICATION_NOTES:\nbar", "draft");
        assert_eq!(items.actions, "foo");
        assert_eq!(items.verification_notes, "bar");
    }

    #[test]
    fn test_repeated_notes_marker_stays_in_notes() {
        let items = split_verification(
            "VERIFIED_ACTIONS:\na\nVERIFICATION_NOTES:\nn1\nVERIFICATION_NOTES:\nn2",
            "draft",
        );
        assert_eq!(items.actions, "a");
        assert_eq!(items.verification_notes, "n1\nVERIFICATION_NOTES:\nn2");
    }

    #[test]
    fn test_missing_notes_marker_keeps_draft() {
        let items = split_verification("VERIFIED_ACTIONS:\nimproved plan", "the draft");
        assert_eq!(items.actions, "the draft");
        assert_eq!(items.verification_notes, "");
    }

    #[test]
    fn test_empty_actions_section_keeps_draft() {
        let items = split_verification("VERIFIED_ACTIONS:\n\nVERIFICATION_NOTES:\nnothing to add", "d");
        assert_eq!(items.actions, "d");
        assert_eq!(items.verification_notes, "nothing to add");
    }

    #[test]
    fn test_leading_prose_without_actions_marker_is_kept() {
        let items = split_verification("Here is the plan\nVERIFICATION_NOTES: tightened scope", "d");
        assert_eq!(items.actions, "Here is the plan");
        assert_eq!(items.verification_notes, "tightened scope");
    }

    #[tokio::test]
    async fn test_run_drafts_then_verifies() {
        let mut server = mockito::Server::new_async().await;
        let draft = server
            .mock_gemini()
            .match_body(Matcher::Regex(r#""text":"Based on this analysis"#.to_string()))
            .with_body(gemini_reply("1. Upgrade to Python 3"))
            .create_async()
            .await;
        let verify = server
            .mock_gemini()
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#""text":"You are reviewing an action plan"#.to_string()),
                Matcher::Regex("1. Upgrade to Python 3".to_string()),
                Matcher::Regex("## legacyPatterns".to_string()),
            ]))
            .with_body(gemini_reply(
                "VERIFIED_ACTIONS:\n1. Upgrade to Python 3.12\n\nVERIFICATION_NOTES:\nPinned the version",
            ))
            .create_async()
            .await;

        let config = test_config(&server.url());
        let stage = ActionStage::new(GeminiClient::new(&config.gemini, &config.http).unwrap());
        let analysis = crate::extract::extract_json(&crate::test_support::analysis_json()).unwrap();
        let items = stage.run(&analysis).await.unwrap();

        assert_eq!(items.actions, "1. Upgrade to Python 3.12");
        assert_eq!(items.verification_notes, "Pinned the version");
        draft.assert_async().await;
        verify.assert_async().await;
    }

    #[tokio::test]
    async fn test_model_failure_propagates() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock_gemini()
            .with_status(500)
            .with_body("internal")
            .create_async()
            .await;

        let config = test_config(&server.url());
        let stage = ActionStage::new(GeminiClient::new(&config.gemini, &config.http).unwrap());
        let analysis = crate::extract::extract_json(&crate::test_support::analysis_json()).unwrap();
        let err = stage.run(&analysis).await.unwrap_err();

        assert!(matches!(err, crate::error::SurgeonError::UpstreamModel(_)));
    }
}
