use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    models::{ChatMessage, FeedbackKind, RankedVideo},
};

use super::AppState;

/// How many ranked videos are returned to the client
const RECOMMENDATION_CAP: usize = 5;

/// How many top items the synthesized explanation covers
const EXPLANATION_TOP_N: usize = 3;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub user_id: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub recommendations: Vec<RankedVideo>,
    pub explanation: String,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub user_id: String,
    pub video_id: String,
    pub feedback_type: FeedbackKind,
    pub feedback_value: f64,
}

#[derive(Debug, Serialize)]
pub struct FeedbackResponse {
    pub status: &'static str,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// Handle a conversation turn and return personalized video recommendations
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> AppResult<Json<ChatResponse>> {
    validate_user_id(&request.user_id)?;
    if request.messages.is_empty() {
        return Err(AppError::InvalidInput("messages must not be empty".to_string()));
    }
    if request.messages.iter().any(|m| m.content.trim().is_empty()) {
        return Err(AppError::InvalidInput(
            "message content must not be empty".to_string(),
        ));
    }

    let outcome = state
        .recommender
        .recommend(&request.user_id, &request.messages)
        .await?;

    let explanation = build_explanation(&outcome.ranked);
    let recommendations = outcome
        .ranked
        .into_iter()
        .take(RECOMMENDATION_CAP)
        .collect();

    Ok(Json(ChatResponse {
        response: outcome.response,
        recommendations,
        explanation,
    }))
}

/// Handle a feedback event and update the user profile accordingly
pub async fn feedback(
    State(state): State<AppState>,
    Json(request): Json<FeedbackRequest>,
) -> AppResult<Json<FeedbackResponse>> {
    validate_user_id(&request.user_id)?;

    state
        .recommender
        .handle_feedback(
            &request.user_id,
            &request.video_id,
            request.feedback_type,
            request.feedback_value,
        )
        .await?;

    Ok(Json(FeedbackResponse { status: "success" }))
}

/// Concatenates the top-ranked titles and explanations under a fixed header
pub fn build_explanation(ranked: &[RankedVideo]) -> String {
    let mut explanation = String::from("Here's why I recommended these videos:\n");
    for rec in ranked.iter().take(EXPLANATION_TOP_N) {
        explanation.push_str(&format!("\n{}: {}", rec.video.title, rec.explanation));
    }
    explanation
}

/// The user id names the profile snapshot file, so it must not be empty or
/// contain path components
fn validate_user_id(user_id: &str) -> AppResult<()> {
    if user_id.trim().is_empty() {
        return Err(AppError::InvalidInput("user_id must not be empty".to_string()));
    }
    if user_id.contains('/') || user_id.contains('\\') || user_id.contains("..") {
        return Err(AppError::InvalidInput(
            "user_id must not contain path separators".to_string(),
        ));
    }
    Ok(())
}
