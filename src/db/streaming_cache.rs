//! Two-level cache for streaming availability.
//!
//! L1 is an in-process `moka` cache; L2 is the optional shared Redis cache.
//! Cache failures are logged and treated as misses. L2 reads are bounded by
//! a timeout; a read that runs past it counts as a miss.
use std::sync::Arc;
use std::time::Duration;

use crate::{
    db::redis::{CacheKey, RedisCache},
    error::AppResult,
    models::StreamingOption,
};

pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_millis(250);

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait StreamingCache: Send + Sync {
    async fn get(&self, key: &CacheKey) -> Option<Vec<StreamingOption>>;

    async fn put(&self, key: CacheKey, options: Vec<StreamingOption>);
}

/// Shared second level behind the in-process cache
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RemoteCache: Send + Sync {
    async fn fetch(&self, key: &CacheKey) -> AppResult<Option<Vec<StreamingOption>>>;

    /// Queues a write; never waits on the backend
    fn store(&self, key: &CacheKey, options: &[StreamingOption], ttl_secs: u64);
}

#[async_trait::async_trait]
impl RemoteCache for RedisCache {
    async fn fetch(&self, key: &CacheKey) -> AppResult<Option<Vec<StreamingOption>>> {
        self.get_from_cache(key).await
    }

    fn store(&self, key: &CacheKey, options: &[StreamingOption], ttl_secs: u64) {
        self.set_in_background(key, &options, ttl_secs);
    }
}

pub struct LayeredCache {
    local: moka::future::Cache<CacheKey, Arc<Vec<StreamingOption>>>,
    remote: Option<Arc<dyn RemoteCache>>,
    remote_timeout: Duration,
    ttl_secs: u64,
}

impl LayeredCache {
    pub fn new(capacity: u64, ttl_secs: u64) -> Self {
        let local = moka::future::CacheBuilder::new(capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self {
            local,
            remote: None,
            remote_timeout: DEFAULT_REMOTE_TIMEOUT,
            ttl_secs,
        }
    }

    pub fn with_remote(mut self, remote: Arc<dyn RemoteCache>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn with_remote_timeout(mut self, timeout: Duration) -> Self {
        self.remote_timeout = timeout;
        self
    }
}

#[async_trait::async_trait]
impl StreamingCache for LayeredCache {
    async fn get(&self, key: &CacheKey) -> Option<Vec<StreamingOption>> {
        if let Some(options) = self.local.get(key).await {
            tracing::trace!(key = %key, "L1 cache hit");
            return Some(options.as_ref().clone());
        }

        let remote = self.remote.as_ref()?;
        match tokio::time::timeout(self.remote_timeout, remote.fetch(key)).await {
            Ok(Ok(Some(options))) => {
                tracing::trace!(key = %key, "L2 cache hit");
                self.local.insert(key.clone(), Arc::new(options.clone())).await;
                Some(options)
            }
            Ok(Ok(None)) => None,
            Ok(Err(e)) => {
                tracing::warn!(key = %key, error = %e, "Streaming cache read failed");
                None
            }
            Err(_) => {
                tracing::warn!(
                    key = %key,
                    timeout_ms = self.remote_timeout.as_millis() as u64,
                    "Streaming cache read timed out"
                );
                None
            }
        }
    }

    async fn put(&self, key: CacheKey, options: Vec<StreamingOption>) {
        if let Some(remote) = &self.remote {
            remote.store(&key, &options, self.ttl_secs);
        }
        self.local.insert(key, Arc::new(options)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AvailabilityType;

    fn options(service: &str) -> Vec<StreamingOption> {
        vec![StreamingOption {
            service: service.to_string(),
            availability_type: AvailabilityType::Subscription,
            link: None,
            quality: None,
            price: None,
        }]
    }

    #[tokio::test]
    async fn test_local_cache_round_trip() {
        let cache = LayeredCache::new(100, 60);
        let key = CacheKey::new(278, "us");

        assert_eq!(cache.get(&key).await, None);
        cache.put(key.clone(), options("Netflix")).await;
        assert_eq!(cache.get(&key).await, Some(options("Netflix")));
    }

    #[tokio::test]
    async fn test_entries_are_region_specific() {
        let cache = LayeredCache::new(100, 60);
        cache.put(CacheKey::new(278, "us"), options("Netflix")).await;

        assert_eq!(cache.get(&CacheKey::new(278, "pl")).await, None);
    }

    #[tokio::test]
    async fn test_empty_result_is_a_hit() {
        let cache = LayeredCache::new(100, 60);
        let key = CacheKey::new(13, "us");
        cache.put(key.clone(), Vec::new()).await;

        assert_eq!(cache.get(&key).await, Some(Vec::new()));
    }

    struct StalledRemote;

    #[async_trait::async_trait]
    impl RemoteCache for StalledRemote {
        async fn fetch(&self, _key: &CacheKey) -> AppResult<Option<Vec<StreamingOption>>> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(Some(options("Never")))
        }

        fn store(&self, _key: &CacheKey, _options: &[StreamingOption], _ttl_secs: u64) {}
    }

    #[tokio::test]
    async fn test_stalled_remote_read_is_a_miss() {
        let cache = LayeredCache::new(100, 60)
            .with_remote(Arc::new(StalledRemote))
            .with_remote_timeout(Duration::from_millis(20));

        let started = std::time::Instant::now();
        assert_eq!(cache.get(&CacheKey::new(278, "us")).await, None);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_remote_hit_fills_local_cache() {
        let mut remote = MockRemoteCache::new();
        remote
            .expect_fetch()
            .times(1)
            .returning(|_| Ok(Some(options("Netflix"))));
        let cache = LayeredCache::new(100, 60).with_remote(Arc::new(remote));
        let key = CacheKey::new(278, "us");

        assert_eq!(cache.get(&key).await, Some(options("Netflix")));
        // Second read is served by L1; the mock allows a single fetch
        assert_eq!(cache.get(&key).await, Some(options("Netflix")));
    }

    #[tokio::test]
    async fn test_remote_failure_is_a_miss_and_put_writes_through() {
        let mut remote = MockRemoteCache::new();
        remote
            .expect_fetch()
            .returning(|_| Err(crate::error::AppError::Internal("redis down".to_string())));
        remote
            .expect_store()
            .withf(|key, options, ttl| key.candidate_id == 13 && options.len() == 1 && *ttl == 60)
            .times(1)
            .return_const(());
        let cache = LayeredCache::new(100, 60).with_remote(Arc::new(remote));
        let key = CacheKey::new(13, "us");

        assert_eq!(cache.get(&key).await, None);
        cache.put(key.clone(), options("Hulu")).await;
        assert_eq!(cache.get(&key).await, Some(options("Hulu")));
    }
}
