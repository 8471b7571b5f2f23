use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use vidrec_api::{
    api::{create_router, AppState},
    config::Config,
    services::{
        providers::youtube::YouTubeProvider, LlmClient, ProfileStore, Recommender, SearchSettings,
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;

    let llm = Arc::new(LlmClient::new(
        config.completion_api_url.clone(),
        config.completion_api_key.clone(),
        config.completion_model.clone(),
    ));
    let catalog = Arc::new(YouTubeProvider::new(
        config.youtube_api_key.clone(),
        config.youtube_api_url.clone(),
    ));
    let store = Arc::new(ProfileStore::new(&config.profile_dir));

    let recommender = Arc::new(Recommender::new(
        llm,
        catalog,
        store,
        SearchSettings {
            max_results: config.max_search_results,
            region_code: config.region_code.clone(),
            relevance_language: config.relevance_language.clone(),
        },
    ));

    let app = create_router(AppState::new(recommender));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr, "Server running");
    axum::serve(listener, app).await?;

    Ok(())
}
