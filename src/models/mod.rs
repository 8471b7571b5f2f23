use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub mod user_profile;

pub use user_profile::{UserProfile, WatchRecord};

/// Role of a message in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::System => write!(f, "system"),
        }
    }
}

/// A single message in the conversation history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }
}

/// Joins messages into a newline-separated "role: content" transcript
pub fn conversation_context(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(|msg| format!("{}: {}", msg.role, msg.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// A candidate video returned by the catalog, prior to ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub id: String,
    pub title: String,
    pub description: String,
    pub thumbnail: String,
    pub channel_title: String,
    pub published_at: String,
    pub view_count: String,
    pub like_count: String,
    pub duration: String,
}

/// A candidate video decorated with a relevance score and explanation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedVideo {
    #[serde(flatten)]
    pub video: Video,
    pub score: f64,
    pub explanation: String,
}

/// Kind of feedback signal a user can give on a video
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackKind {
    Like,
    Dislike,
    WatchCompletion,
}

impl Display for FeedbackKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedbackKind::Like => write!(f, "like"),
            FeedbackKind::Dislike => write!(f, "dislike"),
            FeedbackKind::WatchCompletion => write!(f, "watch_completion"),
        }
    }
}

// ============================================================================
// YouTube Data API Types
// ============================================================================

/// Item from GET /search
#[derive(Debug, Clone, Deserialize)]
pub struct ApiSearchItem {
    pub id: ApiSearchItemId,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSearchItemId {
    pub video_id: String,
}

/// Item from GET /videos with snippet, statistics and contentDetails parts
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiVideoItem {
    pub id: String,
    pub snippet: ApiSnippet,
    #[serde(default)]
    pub statistics: ApiStatistics,
    pub content_details: ApiContentDetails,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSnippet {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub channel_title: String,
    pub published_at: String,
    #[serde(default)]
    pub thumbnails: ApiThumbnails,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiThumbnails {
    #[serde(default)]
    pub medium: Option<ApiThumbnail>,
    #[serde(default)]
    pub default: Option<ApiThumbnail>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiThumbnail {
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiStatistics {
    #[serde(default)]
    pub view_count: Option<String>,
    #[serde(default)]
    pub like_count: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiContentDetails {
    pub duration: String,
}

impl From<ApiVideoItem> for Video {
    fn from(item: ApiVideoItem) -> Self {
        // Prefer the medium thumbnail, falling back to the default size
        let thumbnail = item
            .snippet
            .thumbnails
            .medium
            .or(item.snippet.thumbnails.default)
            .map(|t| t.url)
            .unwrap_or_default();

        Video {
            id: item.id,
            title: item.snippet.title,
            description: item.snippet.description,
            thumbnail,
            channel_title: item.snippet.channel_title,
            published_at: item.snippet.published_at,
            view_count: item.statistics.view_count.unwrap_or_else(|| "0".to_string()),
            like_count: item.statistics.like_count.unwrap_or_else(|| "0".to_string()),
            duration: item.content_details.duration,
        }
    }
}
