//! Candidate acquisition with an ordered fallback chain.
//!
//! Tiers are tried in order; a tier is skipped past when it errors, times
//! out, or returns a payload that fails validation or holds no candidates.
//! The emergency placeholder terminates the chain and has no external
//! dependency, so `CandidateSource::fetch` always yields at least one
//! candidate.
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{MovieCandidate, QuizAnswer, QuizFilters},
    services::fallback::{FallbackPolicy, TierOutcome},
};

pub mod local;
pub mod remote;

pub use local::LocalCatalogTier;
pub use remote::{BasicTier, CandidateServiceClient, PersonalizedTier};

pub const EMERGENCY_CANDIDATE_ID: i64 = 0;

/// Identifies which strategy produced a candidate list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TierId {
    Personalized,
    Basic,
    LocalCatalog,
    Emergency,
}

impl TierId {
    pub fn as_str(self) -> &'static str {
        match self {
            TierId::Personalized => "personalized",
            TierId::Basic => "basic",
            TierId::LocalCatalog => "local_catalog",
            TierId::Emergency => "emergency",
        }
    }

    /// Local and emergency results are shown with a fallback notice
    pub fn is_degraded(self) -> bool {
        matches!(self, TierId::LocalCatalog | TierId::Emergency)
    }
}

impl std::fmt::Display for TierId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a tier may use to produce candidates
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateRequest {
    pub filters: QuizFilters,
    pub answers: Vec<QuizAnswer>,
    pub user_id: Option<String>,
}

/// One strategy in the fallback chain
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CandidateTier: Send + Sync {
    fn id(&self) -> TierId;

    async fn fetch(&self, request: &CandidateRequest) -> AppResult<Vec<MovieCandidate>>;
}

/// Candidates plus the tier that served them
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateBatch {
    pub candidates: Vec<MovieCandidate>,
    pub tier: TierId,
}

impl CandidateBatch {
    pub fn is_degraded(&self) -> bool {
        self.tier.is_degraded()
    }
}

pub struct CandidateSource {
    tiers: Vec<Arc<dyn CandidateTier>>,
    policy: FallbackPolicy,
}

impl CandidateSource {
    pub fn new(tiers: Vec<Arc<dyn CandidateTier>>, policy: FallbackPolicy) -> Self {
        Self { tiers, policy }
    }

    /// Personalized remote, basic remote, then the embedded catalog
    pub fn standard(client: CandidateServiceClient, policy: FallbackPolicy) -> Self {
        let tiers: Vec<Arc<dyn CandidateTier>> = vec![
            Arc::new(PersonalizedTier::new(client.clone())),
            Arc::new(BasicTier::new(client)),
            Arc::new(LocalCatalogTier::new()),
        ];
        Self::new(tiers, policy)
    }

    pub async fn fetch(&self, request: &CandidateRequest) -> CandidateBatch {
        for tier in &self.tiers {
            let tier_id = tier.id();

            match self.policy.attempt(tier_id.as_str(), || tier.fetch(request)).await {
                TierOutcome::Success(candidates) if !candidates.is_empty() => {
                    tracing::info!(
                        tier = %tier_id,
                        payload_len = candidates.len(),
                        "Candidate tier served result"
                    );
                    return CandidateBatch { candidates, tier: tier_id };
                }
                TierOutcome::Success(_) => {
                    tracing::warn!(
                        tier = %tier_id,
                        payload_len = 0,
                        "Candidate tier returned no candidates, falling back"
                    );
                }
                TierOutcome::Failure(reason) => {
                    tracing::warn!(
                        tier = %tier_id,
                        error = %reason,
                        "Candidate tier failed, falling back"
                    );
                }
            }
        }

        tracing::error!(
            tier = %TierId::Emergency,
            payload_len = 1,
            "All candidate tiers failed, serving emergency placeholder"
        );
        CandidateBatch {
            candidates: emergency_candidates(),
            tier: TierId::Emergency,
        }
    }
}

/// The last-resort result: a single synthetic placeholder
pub fn emergency_candidates() -> Vec<MovieCandidate> {
    vec![MovieCandidate {
        id: EMERGENCY_CANDIDATE_ID,
        title: "Recommendations are taking a short break".to_string(),
        overview: "We couldn't reach our movie sources right now. Give the quiz another try in a moment."
            .to_string(),
        poster_path: None,
        release_date: None,
        vote_average: 0.0,
        genre_ids: Vec::new(),
        popularity: 0.0,
    }]
}

/// Checks an upstream payload before trusting it: it must be an array and
/// every element needs an integer `id`, a string `title` and a numeric
/// `voteAverage`.
pub fn validate_payload(payload: Value) -> AppResult<Vec<MovieCandidate>> {
    let items = match payload {
        Value::Array(items) => items,
        other => {
            return Err(AppError::ExternalApi(format!(
                "Candidate payload is not an array (got {})",
                json_kind(&other)
            )))
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let missing = if item.get("id").and_then(Value::as_i64).is_none() {
                Some("id")
            } else if item.get("title").and_then(Value::as_str).is_none() {
                Some("title")
            } else if item.get("voteAverage").and_then(Value::as_f64).is_none() {
                Some("voteAverage")
            } else {
                None
            };

            if let Some(field) = missing {
                return Err(AppError::ExternalApi(format!(
                    "Candidate at index {} is missing a valid `{}`",
                    index, field
                )));
            }

            serde_json::from_value(item).map_err(|e| {
                AppError::ExternalApi(format!("Candidate at index {} is malformed: {}", index, e))
            })
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
