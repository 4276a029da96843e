use axum::{
    extract::State,
    http::{header::ACCEPT_LANGUAGE, HeaderMap},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::{
    middleware::SubmissionId,
    models::QuizAnswer,
    routes::AppState,
    services::{LookupMode, RecommendationInput, RecommendationOutcome},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRequest {
    #[serde(default)]
    pub answers: Vec<QuizAnswer>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub lookup_mode: Option<LookupMode>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResponse {
    pub submission_id: String,
    #[serde(flatten)]
    pub outcome: RecommendationOutcome,
}

/// Runs the recommendation pipeline for one quiz submission.
///
/// Pending availability lookups are cancelled if the client goes away
/// before the response is ready.
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Extension(submission_id): Extension<SubmissionId>,
    headers: HeaderMap,
    Json(request): Json<RecommendationRequest>,
) -> Json<RecommendationResponse> {
    let locale = headers
        .get(ACCEPT_LANGUAGE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let user_id = request.user_id.filter(|id| !id.trim().is_empty());

    tracing::info!(
        submission_id = %submission_id,
        answers = request.answers.len(),
        signed_in = user_id.is_some(),
        "Processing quiz submission"
    );

    let cancel = CancellationToken::new();
    let _cancel_on_drop = cancel.clone().drop_guard();

    let outcome = state
        .pipeline
        .recommend(
            RecommendationInput {
                answers: request.answers,
                user_id,
                locale,
                lookup_mode: request.lookup_mode,
            },
            &cancel,
        )
        .await;

    tracing::info!(
        submission_id = %submission_id,
        source = %outcome.source,
        degraded = outcome.degraded,
        results = outcome.recommendations.len(),
        "Quiz submission completed"
    );

    Json(RecommendationResponse {
        submission_id: submission_id.to_string(),
        outcome,
    })
}
