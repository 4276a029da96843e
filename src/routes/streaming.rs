use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{streaming::dedupe_by_service, AvailabilityRequest, StreamingOption},
    routes::AppState,
    services::answer_parser::DEFAULT_REGION,
};

#[derive(Debug, Deserialize)]
pub struct StreamingQuery {
    #[serde(default)]
    region: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    year: Option<i32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamingResponse {
    pub title_id: i64,
    pub region: String,
    pub available_on: Vec<String>,
    pub streaming_options: Vec<StreamingOption>,
}

/// Per-title availability for clients using lazy lookups
pub async fn title_streaming(
    State(state): State<Arc<AppState>>,
    Path(title_id): Path<i64>,
    Query(query): Query<StreamingQuery>,
) -> AppResult<Json<StreamingResponse>> {
    let region = query
        .region
        .as_deref()
        .map(str::trim)
        .unwrap_or(DEFAULT_REGION)
        .to_lowercase();
    if region.len() != 2 || !region.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(AppError::InvalidInput(format!(
            "region must be a two-letter country code, got '{}'",
            region
        )));
    }

    let request = AvailabilityRequest {
        id: title_id,
        region,
        title: query.title.unwrap_or_default(),
        release_year: query.year,
    };

    let streaming_options = dedupe_by_service(state.pipeline.availability(&request).await);
    let available_on = streaming_options.iter().map(|o| o.service.clone()).collect();

    Ok(Json(StreamingResponse {
        title_id,
        region: request.region,
        available_on,
        streaming_options,
    }))
}
