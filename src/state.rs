use std::sync::Arc;

use crate::{
    config::Config,
    db::{
        create_pool, create_redis_client, CacheWriterHandle, LayeredCache, MemoryUserStore,
        PgUserStore, RedisCache, StreamingCache, UserStore,
    },
    services::{
        candidates::{CandidateServiceClient, CandidateSource},
        fallback::FallbackPolicy,
        providers::StreamingAvailabilityProvider,
        PipelineSettings, RecommendationPipeline, StreamingEnricher,
    },
};

/// Shared state handed to every handler
pub struct AppState {
    pub pipeline: RecommendationPipeline,
}

impl AppState {
    pub fn new(pipeline: RecommendationPipeline) -> Self {
        Self { pipeline }
    }

    /// Wires the pipeline from configuration.
    ///
    /// Postgres and Redis are optional: without a database the user store
    /// lives in memory, and without Redis the streaming cache is in-process
    /// only. The returned handle flushes the Redis writer on shutdown.
    pub async fn from_config(config: &Config) -> anyhow::Result<(Self, Option<CacheWriterHandle>)> {
        let store: Arc<dyn UserStore> = match &config.database_url {
            Some(url) => {
                let pool = create_pool(url).await?;
                tracing::info!("Connected to PostgreSQL, migrations applied");
                Arc::new(PgUserStore::new(pool))
            }
            None => {
                tracing::warn!("DATABASE_URL not set, keeping user data in memory");
                Arc::new(MemoryUserStore::new())
            }
        };

        let mut cache = LayeredCache::new(config.streaming_cache_capacity, config.streaming_cache_ttl_secs)
            .with_remote_timeout(config.cache_timeout());
        let mut writer = None;
        if let Some(url) = &config.redis_url {
            let (redis, handle) = RedisCache::new(create_redis_client(url)?);
            cache = cache.with_remote(Arc::new(redis));
            writer = Some(handle);
            tracing::info!("Streaming cache backed by Redis");
        }
        let cache: Arc<dyn StreamingCache> = Arc::new(cache);

        if config.candidate_service_url.is_none() {
            tracing::warn!("CANDIDATE_SERVICE_URL not set, serving from the local catalog");
        }
        if config.streaming_api_key.is_none() {
            tracing::warn!("STREAMING_API_KEY not set, availability lookups will fail");
        }

        let candidates = CandidateSource::standard(
            CandidateServiceClient::new(config.candidate_service_url.clone()),
            FallbackPolicy::new(config.candidate_timeout(), config.upstream_retries),
        );

        let provider = StreamingAvailabilityProvider::new(
            config.streaming_api_key.clone(),
            config.streaming_api_url.clone(),
        );
        let enricher = StreamingEnricher::new(
            Arc::new(provider),
            cache,
            FallbackPolicy::new(config.streaming_timeout(), config.upstream_retries),
        )
        .with_concurrency(config.enrich_concurrency)
        .with_debounce(config.instant_debounce());

        let pipeline = RecommendationPipeline::new(
            candidates,
            enricher,
            Some(store),
            PipelineSettings::from_config(config),
        );

        Ok((Self::new(pipeline), writer))
    }
}
