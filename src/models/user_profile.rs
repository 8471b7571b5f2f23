use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Video;

/// A watched video recorded in the user's history
///
/// The video metadata is snapshotted at feedback time; entries are immutable
/// once appended and never pruned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchRecord {
    #[serde(flatten)]
    pub video: Video,
    pub watched_at: DateTime<Utc>,
}

/// Per-user preference state
///
/// The profile description is a single natural-language string, the sole
/// durable model of the user. Updates replace it wholesale with a freshly
/// merged string; nothing ever appends to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub profile_description: String,
    pub watch_history: Vec<WatchRecord>,
    pub last_updated: DateTime<Utc>,
}

impl UserProfile {
    /// Creates an empty profile for a previously-unseen user
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            profile_description: String::new(),
            watch_history: Vec::new(),
            last_updated: Utc::now(),
        }
    }

    /// Appends a watched video to the history, snapshotting its metadata
    pub fn add_to_watch_history(&mut self, video: Video) {
        self.watch_history.push(WatchRecord {
            video,
            watched_at: Utc::now(),
        });
    }
}
