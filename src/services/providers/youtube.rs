/// YouTube Data API v3 provider
///
/// API flow:
/// 1. Search: /search (part=id) → video ids in relevance order
/// 2. Details: /videos (part=snippet,statistics,contentDetails) per id
///
/// The two-step flow is required because /search only returns a partial
/// snippet; statistics and duration come from /videos.
use crate::{
    error::{AppError, AppResult},
    models::{ApiSearchItem, ApiVideoItem, Video},
    services::providers::CatalogProvider,
};
use reqwest::Client as HttpClient;
use serde::Deserialize;

#[derive(Clone)]
pub struct YouTubeProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<ApiSearchItem>,
}

#[derive(Deserialize)]
struct VideosResponse {
    #[serde(default)]
    items: Vec<ApiVideoItem>,
}

impl YouTubeProvider {
    pub fn new(api_key: String, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
        }
    }

    async fn search_impl(
        &self,
        query: &str,
        max_results: u32,
        region_code: &str,
        relevance_language: &str,
    ) -> AppResult<Vec<Video>> {
        let url = format!("{}/search", self.api_url);
        let max_results = max_results.to_string();

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("q", query),
                ("part", "id"),
                ("maxResults", max_results.as_str()),
                ("type", "video"),
                ("regionCode", region_code),
                ("relevanceLanguage", relevance_language),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "YouTube search returned status {}: {}",
                status, body
            )));
        }

        let search_response: SearchResponse = response.json().await?;

        // Relevance order from /search is preserved in the result list
        let mut videos = Vec::with_capacity(search_response.items.len());
        for item in search_response.items {
            if let Some(video) = self.fetch_details(&item.id.video_id).await? {
                videos.push(video);
            }
        }

        Ok(videos)
    }

    async fn fetch_details(&self, video_id: &str) -> AppResult<Option<Video>> {
        let url = format!("{}/videos", self.api_url);

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("id", video_id),
                ("part", "snippet,statistics,contentDetails"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "YouTube videos returned status {}: {}",
                status, body
            )));
        }

        let videos_response: VideosResponse = response.json().await?;

        Ok(videos_response.items.into_iter().next().map(Video::from))
    }
}

#[async_trait::async_trait]
impl CatalogProvider for YouTubeProvider {
    async fn search_videos(
        &self,
        query: &str,
        max_results: u32,
        region_code: &str,
        relevance_language: &str,
    ) -> AppResult<Vec<Video>> {
        // Catalog outages degrade to an empty candidate list
        match self
            .search_impl(query, max_results, region_code, relevance_language)
            .await
        {
            Ok(videos) => Ok(videos),
            Err(e) => {
                tracing::warn!(error = %e, query, "YouTube search failed, returning no candidates");
                Ok(Vec::new())
            }
        }
    }

    async fn get_video(&self, video_id: &str) -> AppResult<Option<Video>> {
        match self.fetch_details(video_id).await {
            Ok(video) => Ok(video),
            Err(e) => {
                tracing::warn!(error = %e, video_id, "YouTube lookup failed, treating as not found");
                Ok(None)
            }
        }
    }
}
