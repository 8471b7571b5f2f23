/// Video catalog provider abstraction
///
/// Pluggable architecture for candidate-video sources. A provider implements
/// both free-text search and single-item lookup so the same source serves the
/// recommendation path and the feedback path.
use crate::{error::AppResult, models::Video};

pub mod youtube;

/// Trait for video catalog providers
///
/// Search degrades to an empty candidate list when the upstream catalog is
/// unreachable; a turn with no candidates is preferable to a failed request.
/// Item lookup reports "not found" as `Ok(None)` so callers can decide how to
/// surface it.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Search for videos matching a free-text query
    async fn search_videos(
        &self,
        query: &str,
        max_results: u32,
        region_code: &str,
        relevance_language: &str,
    ) -> AppResult<Vec<Video>>;

    /// Fetch full metadata for a single video by id
    async fn get_video(&self, video_id: &str) -> AppResult<Option<Video>>;
}
