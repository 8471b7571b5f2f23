use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Base URL of the OpenAI-compatible completion endpoint
    #[serde(default = "default_completion_api_url")]
    pub completion_api_url: String,

    /// Optional bearer token for the completion endpoint
    #[serde(default)]
    pub completion_api_key: Option<String>,

    /// Model name passed to the completion endpoint
    #[serde(default = "default_completion_model")]
    pub completion_model: String,

    /// YouTube Data API key
    pub youtube_api_key: String,

    /// YouTube Data API base URL
    #[serde(default = "default_youtube_api_url")]
    pub youtube_api_url: String,

    /// Directory holding per-user profile snapshots
    #[serde(default = "default_profile_dir")]
    pub profile_dir: String,

    /// Maximum number of candidate videos fetched per search
    #[serde(default = "default_max_search_results")]
    pub max_search_results: u32,

    /// Region code forwarded to catalog searches
    #[serde(default = "default_region_code")]
    pub region_code: String,

    /// Relevance language forwarded to catalog searches
    #[serde(default = "default_relevance_language")]
    pub relevance_language: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_completion_api_url() -> String {
    "http://localhost:11434/v1".to_string()
}

fn default_completion_model() -> String {
    "llama3".to_string()
}

fn default_youtube_api_url() -> String {
    "https://www.googleapis.com/youtube/v3".to_string()
}

fn default_profile_dir() -> String {
    "/tmp/profiles".to_string()
}

fn default_max_search_results() -> u32 {
    10
}

fn default_region_code() -> String {
    "US".to_string()
}

fn default_relevance_language() -> String {
    "en".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }
}
