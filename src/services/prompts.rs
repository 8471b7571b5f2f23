//! Prompt builders for every completion call site.
//!
//! All model-facing text lives here so the orchestration code stays free of
//! string templates. Each builder takes already-formatted context (the
//! conversation transcript is newline-joined "role: content" lines).

use crate::models::{FeedbackKind, RankedVideo, Video};

/// Asks for a search query, nothing else, from the conversation and the
/// context-relevant slice of the profile.
pub fn search_query(relevant_profile: &str, conversation: &str) -> String {
    format!(
        "Based on the conversation and user profile, generate a video search query \
         that will find relevant videos.\n\
         Consider the user's preferred content style, depth, and format.\n\n\
         User Profile:\n{relevant_profile}\n\n\
         Conversation:\n{conversation}\n\n\
         Generate a search query (only the query, no explanations):"
    )
}

/// Asks for a 0-1 score on the first line and an explanation on the rest.
pub fn ranking(video: &Video, relevant_profile: &str, conversation_context: &str) -> String {
    format!(
        "Rate how well this video matches the user's interests, preferred content \
         style, and learning preferences.\n\
         Consider factors like video length, presentation style, and depth of content.\n\
         Provide a score from 0 to 1 (1 being perfect match) and a brief explanation.\n\n\
         Video:\n\
         Title: {title}\n\
         Description: {description}\n\
         Channel: {channel}\n\n\
         User Profile:\n{relevant_profile}\n\n\
         Conversation Context:\n{conversation_context}\n\n\
         Provide rating and explanation in this format:\n\
         [score]\n\
         [explanation]",
        title = video.title,
        description = video.description,
        channel = video.channel_title,
    )
}

/// Extracts preference insights from a conversation transcript.
pub fn preference_extraction(conversation: &str) -> String {
    format!(
        "Based on the conversation, describe the user's content preferences and interests.\n\
         Consider:\n\
         - Topics and subjects they're interested in\n\
         - Preferred content style (entertaining, academic, practical, etc.)\n\
         - Preferred video length and depth\n\
         - Learning style and pace\n\
         - Production quality preferences\n\
         - Language and presentation style preferences\n\n\
         Conversation:\n{conversation}\n\n\
         Generate a natural, coherent description of the user's preferences:"
    )
}

/// Reconciles the stored profile with freshly extracted insights into one
/// replacement description.
pub fn profile_merge(current_profile: &str, new_insights: &str) -> String {
    format!(
        "Merge these two user profile descriptions into a single, coherent profile.\n\
         Remove redundancy, resolve any contradictions, and maintain the most current \
         and relevant information.\n\
         The merged profile should capture the user's content preferences, interests, \
         and viewing habits comprehensively.\n\n\
         Current profile:\n{current_profile}\n\n\
         New insights:\n{new_insights}\n\n\
         Generate a concise, coherent profile that combines both descriptions:"
    )
}

/// Distills the profile down to the aspects relevant to the current context.
pub fn profile_integration(user_profile: &str, context: &str) -> String {
    format!(
        "Given the user profile and current conversation context, extract the most \
         relevant aspects of their preferences.\n\
         Focus on aspects that would help find the most suitable videos for the \
         current context.\n\n\
         User Profile:\n{user_profile}\n\n\
         Current Context:\n{context}\n\n\
         Describe the relevant preferences:"
    )
}

/// Interprets a single feedback signal against the current profile.
pub fn feedback_integration(
    video: &Video,
    feedback_kind: FeedbackKind,
    feedback_value: f64,
    current_preferences: &str,
) -> String {
    format!(
        "Based on the user's feedback on this video, update our understanding of \
         their preferences.\n\
         Consider how this feedback reveals their content preferences, interests, \
         and viewing habits.\n\n\
         Video Details:\n\
         Title: {title}\n\
         Description: {description}\n\
         Channel: {channel}\n\
         Duration: {duration}\n\n\
         Feedback Type: {feedback_kind}\n\
         Feedback Value: {feedback_value}\n\n\
         Current User Profile:\n{current_preferences}\n\n\
         Generate an updated profile description:",
        title = video.title,
        description = video.description,
        channel = video.channel_title,
        duration = video.duration,
    )
}

/// Builds the final conversational response introducing the top picks.
pub fn response_generation(
    relevant_profile: &str,
    conversation: &str,
    recommendations: &[RankedVideo],
) -> String {
    let rec_lines = recommendations
        .iter()
        .map(|rec| format!("Title: {}\nExplanation: {}", rec.video.title, rec.explanation))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Generate a natural, engaging response that introduces the recommended videos.\n\
         Explain how each recommendation aligns with the user's content preferences \
         and interests.\n\
         Be concise but informative.\n\n\
         User Profile:\n{relevant_profile}\n\n\
         Conversation History:\n{conversation}\n\n\
         Top Recommendations:\n{rec_lines}\n\n\
         Generate response (be natural and conversational):"
    )
}
