use std::sync::Arc;

use chrono::Utc;

use crate::{
    error::AppResult,
    models::{conversation_context, ChatMessage, FeedbackKind, UserProfile, Video},
    services::{
        completion::{CompletionParams, CompletionService},
        prompts,
    },
};

/// Sampling settings for profile extraction, merging and distillation
const PROFILE_PARAMS: CompletionParams = CompletionParams {
    temperature: 0.7,
    max_tokens: 512,
};

/// Model output longer than this is truncated before being accepted as the
/// profile description
const MAX_PROFILE_CHARS: usize = 8192;

/// Extracts preference insights, merges them into the stored profile, and
/// derives context-relevant excerpts
///
/// The model is the merge function: no structured extraction or conflict
/// resolution exists, so merge behavior is only as stable as the model's
/// summarization. A validation boundary guards the one failure mode that
/// would corrupt state permanently: an empty model response never replaces a
/// non-empty profile.
pub struct ProfileUpdater {
    llm: Arc<dyn CompletionService>,
}

impl ProfileUpdater {
    pub fn new(llm: Arc<dyn CompletionService>) -> Self {
        Self { llm }
    }

    /// Extracts preference signals from the conversation and folds them into
    /// the profile
    pub async fn update_from_conversation(
        &self,
        profile: &mut UserProfile,
        messages: &[ChatMessage],
    ) -> AppResult<()> {
        let conversation = conversation_context(messages);
        let prompt = prompts::preference_extraction(&conversation);

        let new_insights = self
            .llm
            .complete(&[ChatMessage::system(prompt)], PROFILE_PARAMS)
            .await?;

        self.apply_insights(profile, new_insights).await
    }

    /// Interprets a single feedback signal and folds it into the profile
    pub async fn update_from_feedback(
        &self,
        profile: &mut UserProfile,
        video: &Video,
        feedback_kind: FeedbackKind,
        feedback_value: f64,
    ) -> AppResult<()> {
        let prompt = prompts::feedback_integration(
            video,
            feedback_kind,
            feedback_value,
            &profile.profile_description,
        );

        let new_insights = self
            .llm
            .complete(&[ChatMessage::system(prompt)], PROFILE_PARAMS)
            .await?;

        self.apply_insights(profile, new_insights).await
    }

    /// Derives the profile aspects relevant to the current context
    ///
    /// The result is a per-request ephemeral view; it is never written back
    /// to the profile. An empty stored profile short-circuits without a
    /// completion call.
    pub async fn relevant_aspects(
        &self,
        profile: &UserProfile,
        context: &str,
    ) -> AppResult<String> {
        if profile.profile_description.is_empty() {
            return Ok(String::new());
        }

        let prompt = prompts::profile_integration(&profile.profile_description, context);
        self.llm
            .complete(&[ChatMessage::system(prompt)], PROFILE_PARAMS)
            .await
    }

    /// Shared merge step for both update paths
    ///
    /// An empty current profile takes the insights verbatim; otherwise the
    /// model reconciles both texts into a single replacement description.
    /// `last_updated` is bumped on every update regardless of path.
    async fn apply_insights(
        &self,
        profile: &mut UserProfile,
        new_insights: String,
    ) -> AppResult<()> {
        let merged = if profile.profile_description.is_empty() {
            new_insights
        } else {
            let prompt = prompts::profile_merge(&profile.profile_description, &new_insights);
            self.llm
                .complete(&[ChatMessage::system(prompt)], PROFILE_PARAMS)
                .await?
        };

        match sanitize_description(merged) {
            Some(description) => profile.profile_description = description,
            None => tracing::warn!(
                user_id = %profile.user_id,
                "Model returned an empty profile description, keeping existing one"
            ),
        }

        profile.last_updated = Utc::now();
        Ok(())
    }
}

/// Validation boundary for model-generated profile text
///
/// Rejects blank output and caps runaway output at a char boundary; accepted
/// text is otherwise passed through untouched.
fn sanitize_description(text: String) -> Option<String> {
    if text.trim().is_empty() {
        return None;
    }

    if text.chars().count() > MAX_PROFILE_CHARS {
        return Some(text.chars().take(MAX_PROFILE_CHARS).collect());
    }

    Some(text)
}
