use serde::Deserialize;
use std::time::Duration;

use crate::services::enricher::LookupMode;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// PostgreSQL connection URL for preferences and quiz history.
    /// Without it the service keeps everything in memory.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Redis connection URL for the shared streaming cache
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Base URL of the external candidate recommendation service
    #[serde(default)]
    pub candidate_service_url: Option<String>,

    /// Streaming Availability API key
    #[serde(default)]
    pub streaming_api_key: Option<String>,

    /// Streaming Availability API base URL
    #[serde(default = "default_streaming_api_url")]
    pub streaming_api_url: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_candidate_timeout_ms")]
    pub candidate_timeout_ms: u64,

    #[serde(default = "default_streaming_timeout_ms")]
    pub streaming_timeout_ms: u64,

    /// Extra attempts per upstream call before a tier is declared failed
    #[serde(default)]
    pub upstream_retries: u32,

    /// Maximum number of streaming lookups in flight per submission
    #[serde(default = "default_enrich_concurrency")]
    pub enrich_concurrency: usize,

    #[serde(default = "default_instant_debounce_ms")]
    pub instant_debounce_ms: u64,

    /// Number of recommendations returned to the client
    #[serde(default = "default_result_size")]
    pub result_size: usize,

    /// Minimum result count before platform filtering backfills
    #[serde(default = "default_min_platform_results")]
    pub min_platform_results: usize,

    /// `instant` or `lazy`
    #[serde(default = "default_lookup_mode")]
    pub default_lookup_mode: String,

    #[serde(default = "default_streaming_cache_ttl_secs")]
    pub streaming_cache_ttl_secs: u64,

    #[serde(default = "default_streaming_cache_capacity")]
    pub streaming_cache_capacity: u64,

    /// Upper bound on a shared cache read before it counts as a miss
    #[serde(default = "default_cache_timeout_ms")]
    pub cache_timeout_ms: u64,
}

fn default_streaming_api_url() -> String {
    "https://streaming-availability.p.rapidapi.com".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_candidate_timeout_ms() -> u64 {
    8000
}

fn default_streaming_timeout_ms() -> u64 {
    5000
}

fn default_enrich_concurrency() -> usize {
    4
}

fn default_instant_debounce_ms() -> u64 {
    100
}

fn default_result_size() -> usize {
    12
}

fn default_min_platform_results() -> usize {
    5
}

fn default_lookup_mode() -> String {
    "instant".to_string()
}

fn default_streaming_cache_ttl_secs() -> u64 {
    604800 // 1 week
}

fn default_streaming_cache_capacity() -> u64 {
    10_000
}

fn default_cache_timeout_ms() -> u64 {
    250
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    pub fn candidate_timeout(&self) -> Duration {
        Duration::from_millis(self.candidate_timeout_ms)
    }

    pub fn streaming_timeout(&self) -> Duration {
        Duration::from_millis(self.streaming_timeout_ms)
    }

    pub fn cache_timeout(&self) -> Duration {
        Duration::from_millis(self.cache_timeout_ms)
    }

    pub fn instant_debounce(&self) -> Duration {
        Duration::from_millis(self.instant_debounce_ms)
    }

    /// Unknown values fall back to instant lookups
    pub fn lookup_mode(&self) -> LookupMode {
        match self.default_lookup_mode.trim().to_lowercase().as_str() {
            "lazy" => LookupMode::Lazy,
            "instant" => LookupMode::Instant,
            other => {
                tracing::warn!(value = %other, "Unknown DEFAULT_LOOKUP_MODE, using instant");
                LookupMode::Instant
            }
        }
    }
}
