//! End-to-end recommendation pipeline for one quiz submission.
//!
//! answers -> filters -> candidates -> scores -> availability -> final list.
//! Every stage degrades instead of failing, and anything that still goes
//! wrong (including a panic) is turned into the emergency result, so a
//! caller always receives at least one recommendation.
use chrono::{Datelike, Utc};
use futures::FutureExt;
use serde::Serialize;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::{
    config::Config,
    db::{UserStore, PREFERRED_PLATFORMS_KEY, PREFERRED_REGION_KEY},
    error::{AppError, AppResult},
    models::{
        AvailabilityRequest, EnrichedCandidate, HistoryRecord, QuizAnswer, QuizFilters,
        ScoredCandidate, StreamingOption, WatchSignals,
    },
    services::{
        answer_parser::{parse_answers, ParseContext},
        assembler::{assemble, AssemblySettings},
        candidates::{emergency_candidates, CandidateRequest, CandidateSource, TierId},
        enricher::{LookupMode, StreamingEnricher},
        scoring::{score_candidates, WatchHistory},
    },
};

const CATALOG_NOTICE: &str =
    "Personalized recommendations are unavailable right now, showing picks from our catalog.";
const EMERGENCY_NOTICE: &str =
    "We couldn't load recommendations right now. Please try again in a moment.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PipelineSettings {
    pub assembly: AssemblySettings,
    pub default_lookup_mode: LookupMode,
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            assembly: AssemblySettings {
                result_size: config.result_size,
                min_platform_results: config.min_platform_results,
            },
            default_lookup_mode: config.lookup_mode(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecommendationInput {
    pub answers: Vec<QuizAnswer>,
    pub user_id: Option<String>,
    /// Device locale, used for region detection
    pub locale: Option<String>,
    /// Overrides the configured default when set
    pub lookup_mode: Option<LookupMode>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationOutcome {
    pub recommendations: Vec<EnrichedCandidate>,
    pub source: TierId,
    pub degraded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
    pub filters: QuizFilters,
}

pub struct RecommendationPipeline {
    candidates: CandidateSource,
    enricher: StreamingEnricher,
    store: Option<Arc<dyn UserStore>>,
    settings: PipelineSettings,
}

impl RecommendationPipeline {
    pub fn new(
        candidates: CandidateSource,
        enricher: StreamingEnricher,
        store: Option<Arc<dyn UserStore>>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            candidates,
            enricher,
            store,
            settings,
        }
    }

    /// Runs the pipeline. Never fails; see the module docs.
    pub async fn recommend(
        &self,
        input: RecommendationInput,
        cancel: &CancellationToken,
    ) -> RecommendationOutcome {
        let outcome = match AssertUnwindSafe(self.run(&input, cancel)).catch_unwind().await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                tracing::error!(error = %e, "Recommendation pipeline failed, serving emergency result");
                emergency_outcome()
            }
            Err(_) => {
                tracing::error!("Recommendation pipeline panicked, serving emergency result");
                emergency_outcome()
            }
        };

        if let (Some(store), Some(user_id)) = (&self.store, &input.user_id) {
            record_history(
                store.clone(),
                HistoryRecord {
                    user_id: user_id.clone(),
                    answers: input.answers,
                    recommendations: outcome.recommendations.clone(),
                    timestamp: Utc::now(),
                },
            );
        }

        outcome
    }

    /// Availability for a single title, used by lazy clients
    pub async fn availability(&self, request: &AvailabilityRequest) -> Vec<StreamingOption> {
        self.enricher.lookup(request).await
    }

    async fn run(
        &self,
        input: &RecommendationInput,
        cancel: &CancellationToken,
    ) -> AppResult<RecommendationOutcome> {
        let (context, signals) = self.load_user_context(input).await;
        let filters = parse_answers(&input.answers, &context);

        let batch = self
            .candidates
            .fetch(&CandidateRequest {
                filters: filters.clone(),
                answers: input.answers.clone(),
                user_id: input.user_id.clone(),
            })
            .await;

        let history = signals.as_ref().map(|s| s as &dyn WatchHistory);
        let scored = score_candidates(batch.candidates, &filters, history);

        let mode = input.lookup_mode.unwrap_or(self.settings.default_lookup_mode);
        let enriched = if batch.tier == TierId::Emergency {
            scored.into_iter().map(EnrichedCandidate::unchecked).collect()
        } else {
            self.enricher.enrich(scored, &filters.region, mode, cancel).await
        };

        let recommendations = assemble(
            enriched,
            &filters,
            &self.settings.assembly,
            Utc::now().year(),
        );
        if recommendations.is_empty() {
            return Err(AppError::Internal(
                "Result assembly produced no recommendations".to_string(),
            ));
        }

        tracing::info!(
            tier = %batch.tier,
            lookup_mode = ?mode,
            region = %filters.region,
            payload_len = recommendations.len(),
            "Recommendations assembled"
        );

        let notice = match batch.tier {
            TierId::LocalCatalog => Some(CATALOG_NOTICE.to_string()),
            TierId::Emergency => Some(EMERGENCY_NOTICE.to_string()),
            TierId::Personalized | TierId::Basic => None,
        };

        Ok(RecommendationOutcome {
            recommendations,
            source: batch.tier,
            degraded: batch.tier.is_degraded(),
            notice,
            filters,
        })
    }

    /// Stored preferences and watch signals for a signed-in user. Store
    /// failures are logged and the affected value is left out.
    async fn load_user_context(&self, input: &RecommendationInput) -> (ParseContext, Option<WatchSignals>) {
        let mut context = ParseContext {
            locale: input.locale.clone(),
            ..ParseContext::default()
        };

        let (Some(store), Some(user_id)) = (&self.store, &input.user_id) else {
            return (context, None);
        };

        let (region, platforms, signals) = tokio::join!(
            store.preference(user_id, PREFERRED_REGION_KEY),
            store.preference(user_id, PREFERRED_PLATFORMS_KEY),
            store.watch_signals(user_id),
        );

        context.stored_region = log_store_error(region, "preferred region").flatten();
        context.stored_platforms = log_store_error(platforms, "preferred platforms").flatten();
        (context, log_store_error(signals, "watch signals"))
    }
}

fn log_store_error<T>(result: AppResult<T>, what: &str) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load {} from user store", what);
            None
        }
    }
}

fn emergency_outcome() -> RecommendationOutcome {
    let recommendations = emergency_candidates()
        .into_iter()
        .map(|candidate| EnrichedCandidate::unchecked(ScoredCandidate::unscored(candidate)))
        .collect();

    RecommendationOutcome {
        recommendations,
        source: TierId::Emergency,
        degraded: true,
        notice: Some(EMERGENCY_NOTICE.to_string()),
        filters: QuizFilters::default(),
    }
}

/// Persists the submission without holding up the response
fn record_history(store: Arc<dyn UserStore>, record: HistoryRecord) {
    tokio::spawn(async move {
        let user_id = record.user_id.clone();
        if let Err(e) = store.record_submission(record).await {
            tracing::warn!(user_id = %user_id, error = %e, "Failed to record quiz history");
        }
    });
}
