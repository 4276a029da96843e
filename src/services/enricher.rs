//! Per-candidate streaming availability.
//!
//! Lookups run as a bounded, order-preserving concurrent map. Each lookup is
//! isolated: a failure or timeout leaves that one candidate without
//! availability and never reaches the caller as an error.
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::{
    db::{CacheKey, StreamingCache},
    models::{
        streaming::dedupe_by_service, AvailabilityRequest, EnrichedCandidate, ScoredCandidate,
        StreamingOption,
    },
    services::{
        fallback::{FallbackPolicy, TierOutcome},
        providers::AvailabilityProvider,
    },
};

pub const DEFAULT_CONCURRENCY: usize = 4;

/// When streaming availability is looked up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LookupMode {
    /// Look up every candidate while building the response
    #[default]
    Instant,
    /// Attach cached data only; clients fetch the rest per title
    Lazy,
}

pub struct StreamingEnricher {
    provider: Arc<dyn AvailabilityProvider>,
    cache: Arc<dyn StreamingCache>,
    policy: FallbackPolicy,
    concurrency: usize,
    debounce: Duration,
}

impl StreamingEnricher {
    pub fn new(
        provider: Arc<dyn AvailabilityProvider>,
        cache: Arc<dyn StreamingCache>,
        policy: FallbackPolicy,
    ) -> Self {
        Self {
            provider,
            cache,
            policy,
            concurrency: DEFAULT_CONCURRENCY,
            debounce: Duration::ZERO,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Delay before instant-mode lookups start
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Availability for a single title, from cache when possible.
    /// A failed lookup yields an empty list.
    pub async fn lookup(&self, request: &AvailabilityRequest) -> Vec<StreamingOption> {
        let key = CacheKey::new(request.id, &request.region);
        if let Some(options) = self.cache.get(&key).await {
            return options;
        }
        self.fetch_and_store(request, key).await.unwrap_or_default()
    }

    /// Annotates candidates with availability in `region`, keeping their order.
    ///
    /// Once `cancel` fires, pending lookups are abandoned and the affected
    /// candidates come back unchecked.
    pub async fn enrich(
        &self,
        candidates: Vec<ScoredCandidate>,
        region: &str,
        mode: LookupMode,
        cancel: &CancellationToken,
    ) -> Vec<EnrichedCandidate> {
        if mode == LookupMode::Instant && !self.debounce.is_zero() {
            tokio::select! {
                _ = cancel.cancelled() => {
                    return candidates.into_iter().map(EnrichedCandidate::unchecked).collect();
                }
                _ = tokio::time::sleep(self.debounce) => {}
            }
        }

        stream::iter(candidates)
            .map(|scored| self.enrich_one(scored, region, mode, cancel))
            .buffered(self.concurrency)
            .collect::<Vec<_>>()
            .await
    }

    async fn enrich_one(
        &self,
        scored: ScoredCandidate,
        region: &str,
        mode: LookupMode,
        cancel: &CancellationToken,
    ) -> EnrichedCandidate {
        let key = CacheKey::new(scored.id(), region);
        if let Some(options) = self.cache.get(&key).await {
            return EnrichedCandidate::with_options(scored, options);
        }

        if mode == LookupMode::Lazy || cancel.is_cancelled() {
            return EnrichedCandidate::unchecked(scored);
        }

        let request = AvailabilityRequest::for_candidate(&scored.candidate, region);
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(candidate_id = request.id, "Availability lookup cancelled");
                EnrichedCandidate::unchecked(scored)
            }
            options = self.fetch_and_store(&request, key) => match options {
                Some(options) => EnrichedCandidate::with_options(scored, options),
                None => EnrichedCandidate::unchecked(scored),
            }
        }
    }

    /// Calls the provider under the fallback policy and caches a successful
    /// result, including an empty one. Failures are not cached.
    async fn fetch_and_store(
        &self,
        request: &AvailabilityRequest,
        key: CacheKey,
    ) -> Option<Vec<StreamingOption>> {
        let provider = self.provider.name();
        match self
            .policy
            .attempt(provider, || self.provider.fetch_options(request))
            .await
        {
            TierOutcome::Success(options) => {
                let options = dedupe_by_service(options);
                self.cache.put(key, options.clone()).await;
                Some(options)
            }
            TierOutcome::Failure(reason) => {
                tracing::warn!(
                    candidate_id = request.id,
                    region = %request.region,
                    provider = provider,
                    error = %reason,
                    "Availability lookup failed"
                );
                None
            }
        }
    }
}
