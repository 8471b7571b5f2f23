use std::cmp::Ordering;
use std::sync::Arc;

use tracing::instrument;

use crate::{
    error::{AppError, AppResult},
    models::{conversation_context, ChatMessage, FeedbackKind, RankedVideo, Video},
    services::{
        completion::{CompletionParams, CompletionService},
        profile_store::ProfileStore,
        profile_update::ProfileUpdater,
        prompts,
        providers::CatalogProvider,
    },
};

const QUERY_PARAMS: CompletionParams = CompletionParams {
    temperature: 0.2,
    max_tokens: 256,
};

const RANKING_PARAMS: CompletionParams = CompletionParams {
    temperature: 0.3,
    max_tokens: 512,
};

const RESPONSE_PARAMS: CompletionParams = CompletionParams {
    temperature: 0.7,
    max_tokens: 1024,
};

/// How many ranked videos feed the conversational response
const RESPONSE_TOP_N: usize = 5;

/// Catalog search knobs taken from configuration
#[derive(Debug, Clone)]
pub struct SearchSettings {
    pub max_results: u32,
    pub region_code: String,
    pub relevance_language: String,
}

/// Result of one recommendation cycle
pub struct RecommendationOutcome {
    pub response: String,
    pub ranked: Vec<RankedVideo>,
}

/// Sequences query generation → catalog search → ranking → response
/// generation over the distilled profile
///
/// Stateless per call apart from reading and writing the user's profile
/// through the store. The per-user profile lock is held for the whole cycle.
pub struct Recommender {
    llm: Arc<dyn CompletionService>,
    catalog: Arc<dyn CatalogProvider>,
    store: Arc<ProfileStore>,
    updater: ProfileUpdater,
    search: SearchSettings,
}

impl Recommender {
    pub fn new(
        llm: Arc<dyn CompletionService>,
        catalog: Arc<dyn CatalogProvider>,
        store: Arc<ProfileStore>,
        search: SearchSettings,
    ) -> Self {
        let updater = ProfileUpdater::new(Arc::clone(&llm));
        Self {
            llm,
            catalog,
            store,
            updater,
            search,
        }
    }

    /// Runs one full recommendation cycle for a conversation turn
    #[instrument(skip(self, messages), fields(message_count = messages.len()))]
    pub async fn recommend(
        &self,
        user_id: &str,
        messages: &[ChatMessage],
    ) -> AppResult<RecommendationOutcome> {
        let handle = self.store.get_or_create(user_id).await;
        let mut profile = handle.lock().await;

        self.updater
            .update_from_conversation(&mut profile, messages)
            .await?;

        let context = conversation_context(messages);
        let relevant_profile = self.updater.relevant_aspects(&profile, &context).await?;

        let query = self.generate_search_query(&relevant_profile, &context).await?;
        tracing::debug!(query, "Generated search query");

        // An empty query is passed through to the catalog as-is
        let candidates = self
            .catalog
            .search_videos(
                &query,
                self.search.max_results,
                &self.search.region_code,
                &self.search.relevance_language,
            )
            .await?;
        tracing::debug!(candidate_count = candidates.len(), "Catalog search complete");

        let ranked = self
            .rank_videos(candidates, &relevant_profile, &context)
            .await?;

        let top = &ranked[..ranked.len().min(RESPONSE_TOP_N)];
        let response = self
            .llm
            .complete(
                &[ChatMessage::system(prompts::response_generation(
                    &relevant_profile,
                    &context,
                    top,
                ))],
                RESPONSE_PARAMS,
            )
            .await?;

        // Best-effort: the response is already committed in memory
        if let Err(e) = self.store.persist(user_id, &profile).await {
            tracing::warn!(error = %e, user_id, "Failed to persist profile snapshot");
        }

        Ok(RecommendationOutcome {
            response: response.trim().to_string(),
            ranked,
        })
    }

    /// Records a feedback event: resolve the video, append it to the watch
    /// history, and fold the signal into the profile
    #[instrument(skip(self))]
    pub async fn handle_feedback(
        &self,
        user_id: &str,
        video_id: &str,
        feedback_kind: FeedbackKind,
        feedback_value: f64,
    ) -> AppResult<()> {
        let handle = self
            .store
            .get(user_id)
            .await
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

        // Resolve before touching any state so an unknown video changes nothing
        let video = self
            .catalog
            .get_video(video_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Video {} not found", video_id)))?;

        let mut profile = handle.lock().await;
        profile.add_to_watch_history(video.clone());
        self.updater
            .update_from_feedback(&mut profile, &video, feedback_kind, feedback_value)
            .await?;

        if let Err(e) = self.store.persist(user_id, &profile).await {
            tracing::warn!(error = %e, user_id, "Failed to persist profile snapshot");
        }

        Ok(())
    }

    async fn generate_search_query(
        &self,
        relevant_profile: &str,
        conversation: &str,
    ) -> AppResult<String> {
        let query = self
            .llm
            .complete(
                &[ChatMessage::system(prompts::search_query(
                    relevant_profile,
                    conversation,
                ))],
                QUERY_PARAMS,
            )
            .await?;

        Ok(query.trim().to_string())
    }

    /// Scores every candidate independently and sorts descending by score
    ///
    /// The per-item calls have no data dependency on each other, so they fan
    /// out as spawned tasks and are joined in input order; ties therefore
    /// keep their arrival order under the stable sort. A completion failure
    /// aborts the pass; a parse failure only demotes the one item.
    async fn rank_videos(
        &self,
        candidates: Vec<Video>,
        relevant_profile: &str,
        context: &str,
    ) -> AppResult<Vec<RankedVideo>> {
        let mut tasks = Vec::with_capacity(candidates.len());

        for video in candidates {
            let llm = Arc::clone(&self.llm);
            let prompt = prompts::ranking(&video, relevant_profile, context);
            let task = tokio::spawn(async move {
                llm.complete(&[ChatMessage::system(prompt)], RANKING_PARAMS)
                    .await
            });
            tasks.push((video, task));
        }

        let mut ranked = Vec::with_capacity(tasks.len());
        for (video, task) in tasks {
            let completion = match task.await {
                Ok(result) => result?,
                Err(e) => return Err(AppError::Internal(e.to_string())),
            };

            let (score, explanation) = match parse_rating(&completion) {
                Some(parsed) => parsed,
                None => {
                    let first_line = completion.trim().lines().next().unwrap_or_default();
                    tracing::warn!(
                        video_id = %video.id,
                        first_line,
                        "Failed to parse ranking response, demoting item"
                    );
                    (
                        0.0,
                        format!("Failed to parse ranking response: {:?}", first_line),
                    )
                }
            };

            ranked.push(RankedVideo {
                video,
                score,
                explanation,
            });
        }

        // Stable sort keeps arrival order for equal scores
        ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        Ok(ranked)
    }
}

/// Parses a ranking completion: score on the first line, explanation on the
/// remaining lines
///
/// Accepted scores: a bare float with `.` as the decimal separator, optional
/// surrounding whitespace, optional trailing `%` (divided by 100). Non-finite
/// values are rejected; accepted values are clamped into [0, 1].
fn parse_rating(text: &str) -> Option<(f64, String)> {
    let text = text.trim();
    let (first, rest) = match text.split_once('\n') {
        Some((first, rest)) => (first, rest),
        None => (text, ""),
    };

    let first = first.trim();
    let score = match first.strip_suffix('%') {
        Some(percent) => percent.trim().parse::<f64>().ok()? / 100.0,
        None => first.parse::<f64>().ok()?,
    };

    if !score.is_finite() {
        return None;
    }

    Some((score.clamp(0.0, 1.0), rest.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::completion::MockCompletionService;
    use crate::services::providers::MockCatalogProvider;

    fn video(id: &str, title: &str) -> Video {
        Video {
            id: id.to_string(),
            title: title.to_string(),
            description: format!("About {}", title),
            thumbnail: String::new(),
            channel_title: "Some Channel".to_string(),
            published_at: "2023-01-01T00:00:00Z".to_string(),
            view_count: "100".to_string(),
            like_count: "10".to_string(),
            duration: "PT10M".to_string(),
        }
    }

    fn settings() -> SearchSettings {
        SearchSettings {
            max_results: 10,
            region_code: "US".to_string(),
            relevance_language: "en".to_string(),
        }
    }

    /// Scripted completion: dispatches on the prompt each call site builds
    fn scripted_llm() -> MockCompletionService {
        let mut mock = MockCompletionService::new();
        mock.expect_complete().returning(|messages, _| {
            let prompt = messages[0].content.as_str();
            if prompt.starts_with("Based on the conversation, describe") {
                Ok("Enjoys long-form science explainers".to_string())
            } else if prompt.starts_with("Merge these two") {
                Ok("Merged profile".to_string())
            } else if prompt.starts_with("Given the user profile") {
                Ok("Wants science content".to_string())
            } else if prompt.starts_with("Based on the conversation and user profile") {
                Ok("science explainers\n".to_string())
            } else if prompt.starts_with("Rate how well") {
                // Score by title so tests can script the ordering
                if prompt.contains("Title: Alpha") {
                    Ok("0.2\nToo shallow".to_string())
                } else if prompt.contains("Title: Beta") {
                    Ok("0.9\nGreat depth".to_string())
                } else {
                    Ok("0.5\nDecent match".to_string())
                }
            } else if prompt.starts_with("Based on the user's feedback") {
                Ok("Liked a science video".to_string())
            } else {
                Ok("Here are some videos you might enjoy!".to_string())
            }
        });
        mock
    }

    fn recommender_with(
        llm: MockCompletionService,
        catalog: MockCatalogProvider,
        dir: &tempfile::TempDir,
    ) -> Recommender {
        Recommender::new(
            Arc::new(llm),
            Arc::new(catalog),
            Arc::new(ProfileStore::new(dir.path())),
            settings(),
        )
    }

    #[test]
    fn test_parse_rating_score_and_explanation() {
        let (score, explanation) = parse_rating("0.85\nStrong topical match").unwrap();
        assert_eq!(score, 0.85);
        assert_eq!(explanation, "Strong topical match");
    }

    #[test]
    fn test_parse_rating_tolerates_whitespace() {
        let (score, explanation) = parse_rating("  0.5  \n  trimmed  ").unwrap();
        assert_eq!(score, 0.5);
        assert_eq!(explanation, "trimmed");
    }

    #[test]
    fn test_parse_rating_accepts_percentage() {
        let (score, _) = parse_rating("85%\nok").unwrap();
        assert_eq!(score, 0.85);
    }

    #[test]
    fn test_parse_rating_clamps_out_of_range() {
        let (score, _) = parse_rating("1.7\nover-eager model").unwrap();
        assert_eq!(score, 1.0);
        let (score, _) = parse_rating("-0.3\n").unwrap();
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_parse_rating_score_only() {
        let (score, explanation) = parse_rating("0.7").unwrap();
        assert_eq!(score, 0.7);
        assert!(explanation.is_empty());
    }

    #[test]
    fn test_parse_rating_rejects_garbage() {
        assert!(parse_rating("I refuse to rate this\n0.5").is_none());
        assert!(parse_rating("NaN\nnope").is_none());
        assert!(parse_rating("inf\nnope").is_none());
        assert!(parse_rating("0,5\nlocale comma").is_none());
        assert!(parse_rating("").is_none());
    }

    #[tokio::test]
    async fn test_rank_videos_sorts_descending_keeping_all_items() {
        let dir = tempfile::tempdir().unwrap();
        let recommender =
            recommender_with(scripted_llm(), MockCatalogProvider::new(), &dir);

        let candidates = vec![
            video("a", "Alpha"),
            video("b", "Beta"),
            video("c", "Gamma"),
        ];
        let ranked = recommender
            .rank_videos(candidates, "profile", "context")
            .await
            .unwrap();

        assert_eq!(ranked.len(), 3);
        let scores: Vec<f64> = ranked.iter().map(|r| r.score).collect();
        assert_eq!(scores, vec![0.9, 0.5, 0.2]);
        assert_eq!(ranked[0].video.title, "Beta");
        assert_eq!(ranked[1].video.title, "Gamma");
        assert_eq!(ranked[2].video.title, "Alpha");
    }

    #[tokio::test]
    async fn test_rank_videos_ties_keep_arrival_order() {
        let mut mock = MockCompletionService::new();
        mock.expect_complete()
            .returning(|_, _| Ok("0.5\nsame score".to_string()));

        let dir = tempfile::tempdir().unwrap();
        let recommender = recommender_with(mock, MockCatalogProvider::new(), &dir);

        let candidates = vec![
            video("first", "First"),
            video("second", "Second"),
            video("third", "Third"),
        ];
        let ranked = recommender
            .rank_videos(candidates, "profile", "context")
            .await
            .unwrap();

        let ids: Vec<&str> = ranked.iter().map(|r| r.video.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_rank_videos_demotes_unparseable_item() {
        let mut mock = MockCompletionService::new();
        mock.expect_complete().returning(|messages, _| {
            if messages[0].content.contains("Title: Broken") {
                Ok("I cannot rate this video.".to_string())
            } else {
                Ok("0.4\nfine".to_string())
            }
        });

        let dir = tempfile::tempdir().unwrap();
        let recommender = recommender_with(mock, MockCatalogProvider::new(), &dir);

        let candidates = vec![video("x", "Broken"), video("y", "Works")];
        let ranked = recommender
            .rank_videos(candidates, "profile", "context")
            .await
            .unwrap();

        assert_eq!(ranked.len(), 2);
        // Demoted, not dropped
        assert_eq!(ranked[1].video.id, "x");
        assert_eq!(ranked[1].score, 0.0);
        assert!(ranked[1].explanation.contains("Failed to parse"));
    }

    #[tokio::test]
    async fn test_recommend_runs_full_cycle_for_fresh_user() {
        let mut catalog = MockCatalogProvider::new();
        catalog.expect_search_videos().returning(|query, max, _, _| {
            assert_eq!(query, "science explainers");
            assert_eq!(max, 10);
            Ok(vec![video("a", "Alpha"), video("b", "Beta")])
        });

        let dir = tempfile::tempdir().unwrap();
        let recommender = recommender_with(scripted_llm(), catalog, &dir);

        let messages = vec![ChatMessage::user("I like long-form science explainers")];
        let outcome = recommender.recommend("u1", &messages).await.unwrap();

        assert_eq!(outcome.response, "Here are some videos you might enjoy!");
        assert_eq!(outcome.ranked.len(), 2);
        assert_eq!(outcome.ranked[0].video.title, "Beta");

        // The conversation produced a non-empty profile, and it was persisted
        let handle = recommender.store.get_or_create("u1").await;
        let profile = handle.lock().await;
        assert_eq!(
            profile.profile_description,
            "Enjoys long-form science explainers"
        );
        assert!(dir.path().join("u1.json").exists());
    }

    #[tokio::test]
    async fn test_recommend_propagates_completion_failure() {
        let mut mock = MockCompletionService::new();
        mock.expect_complete()
            .returning(|_, _| Err(AppError::ExternalApi("model unreachable".to_string())));

        let dir = tempfile::tempdir().unwrap();
        let recommender = recommender_with(mock, MockCatalogProvider::new(), &dir);

        // No retry, no partial result
        let result = recommender
            .recommend("u1", &[ChatMessage::user("anything")])
            .await;
        assert!(matches!(result, Err(AppError::ExternalApi(_))));
    }

    #[tokio::test]
    async fn test_feedback_for_unknown_video_changes_nothing() {
        let mut catalog = MockCatalogProvider::new();
        catalog.expect_get_video().returning(|_| Ok(None));

        let dir = tempfile::tempdir().unwrap();
        let recommender = recommender_with(MockCompletionService::new(), catalog, &dir);

        // Seed the user so the video, not the user, is the missing piece
        let handle = recommender.store.get_or_create("u1").await;
        {
            let mut profile = handle.lock().await;
            profile.profile_description = "Existing profile".to_string();
        }

        let result = recommender
            .handle_feedback("u1", "missing-video", FeedbackKind::Like, 1.0)
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));

        let profile = handle.lock().await;
        assert!(profile.watch_history.is_empty());
        assert_eq!(profile.profile_description, "Existing profile");
    }

    #[tokio::test]
    async fn test_feedback_for_unknown_user_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let recommender = recommender_with(
            MockCompletionService::new(),
            MockCatalogProvider::new(),
            &dir,
        );

        let result = recommender
            .handle_feedback("nobody", "v1", FeedbackKind::Like, 1.0)
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_feedback_appends_history_and_updates_profile() {
        let mut catalog = MockCatalogProvider::new();
        catalog
            .expect_get_video()
            .returning(|id| Ok(Some(video(id, "Ocean Currents"))));

        let dir = tempfile::tempdir().unwrap();
        let recommender = recommender_with(scripted_llm(), catalog, &dir);

        let handle = recommender.store.get_or_create("u1").await;
        let before = handle.lock().await.last_updated;

        recommender
            .handle_feedback("u1", "v42", FeedbackKind::Like, 1.0)
            .await
            .unwrap();

        let profile = handle.lock().await;
        assert_eq!(profile.watch_history.len(), 1);
        assert_eq!(profile.watch_history[0].video.id, "v42");
        assert_eq!(profile.profile_description, "Liked a science video");
        assert!(profile.last_updated > before);
    }
}
