/// Candidate tiers backed by the external recommendation service.
///
/// The personalized endpoint receives the normalized filters plus a
/// natural-language summary; the basic endpoint only gets the raw answers.
/// Both responses go through `validate_payload` before being trusted.
use reqwest::Client as HttpClient;
use serde::Serialize;

use crate::{
    error::{AppError, AppResult},
    models::{MovieCandidate, QuizAnswer, QuizFilters},
    services::candidates::{validate_payload, CandidateRequest, CandidateTier, TierId},
};

const PERSONALIZED_PATH: &str = "recommendations/personalized";
const BASIC_PATH: &str = "recommendations";

/// HTTP client for the candidate recommendation service
#[derive(Clone)]
pub struct CandidateServiceClient {
    http_client: HttpClient,
    base_url: Option<String>,
}

impl CandidateServiceClient {
    pub fn new(base_url: Option<String>) -> Self {
        Self {
            http_client: HttpClient::new(),
            base_url: base_url.map(|url| url.trim_end_matches('/').to_string()),
        }
    }

    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> AppResult<Vec<MovieCandidate>> {
        let base_url = self.base_url.as_deref().ok_or_else(|| {
            AppError::ExternalApi("Candidate service URL is not configured".to_string())
        })?;

        let url = format!("{}/{}", base_url, path);
        let response = self.http_client.post(&url).json(body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Candidate service returned status {}: {}",
                status, body
            )));
        }

        let payload: serde_json::Value = response.json().await?;
        validate_payload(payload)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PersonalizedBody<'a> {
    filters: &'a QuizFilters,
    summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<&'a str>,
}

#[derive(Serialize)]
struct BasicBody<'a> {
    answers: &'a [QuizAnswer],
}

pub struct PersonalizedTier {
    client: CandidateServiceClient,
}

impl PersonalizedTier {
    pub fn new(client: CandidateServiceClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl CandidateTier for PersonalizedTier {
    fn id(&self) -> TierId {
        TierId::Personalized
    }

    async fn fetch(&self, request: &CandidateRequest) -> AppResult<Vec<MovieCandidate>> {
        let body = PersonalizedBody {
            filters: &request.filters,
            summary: request.filters.describe(),
            user_id: request.user_id.as_deref(),
        };
        self.client.post(PERSONALIZED_PATH, &body).await
    }
}

pub struct BasicTier {
    client: CandidateServiceClient,
}

impl BasicTier {
    pub fn new(client: CandidateServiceClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl CandidateTier for BasicTier {
    fn id(&self) -> TierId {
        TierId::Basic
    }

    async fn fetch(&self, request: &CandidateRequest) -> AppResult<Vec<MovieCandidate>> {
        self.client
            .post(BASIC_PATH, &BasicBody { answers: &request.answers })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> CandidateRequest {
        CandidateRequest {
            filters: QuizFilters {
                mood: "laugh".to_string(),
                ..QuizFilters::default()
            },
            answers: vec![QuizAnswer::new("mood", "laugh")],
            user_id: Some("user-1".to_string()),
        }
    }

    #[tokio::test]
    async fn test_personalized_tier_posts_filters_and_summary() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/recommendations/personalized"))
            .and(body_partial_json(json!({"userId": "user-1", "filters": {"mood": "laugh"}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 120467, "title": "The Grand Budapest Hotel", "voteAverage": 8.0, "genreIds": [35, 18]}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let tier = PersonalizedTier::new(CandidateServiceClient::new(Some(server.uri())));
        let candidates = tier.fetch(&request()).await.expect("fetch should succeed");

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title, "The Grand Budapest Hotel");
    }

    #[tokio::test]
    async fn test_basic_tier_posts_raw_answers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/recommendations"))
            .and(body_partial_json(json!({"answers": [{"questionId": "mood", "answer": "laugh"}]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 13, "title": "Forrest Gump", "voteAverage": 8.5}
            ])))
            .mount(&server)
            .await;

        let tier = BasicTier::new(CandidateServiceClient::new(Some(format!("{}/", server.uri()))));
        let candidates = tier.fetch(&request()).await.expect("fetch should succeed");

        assert_eq!(candidates[0].id, 13);
    }

    #[tokio::test]
    async fn test_error_status_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let tier = PersonalizedTier::new(CandidateServiceClient::new(Some(server.uri())));
        let err = tier.fetch(&request()).await.unwrap_err();

        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn test_invalid_payload_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": "no results"})))
            .mount(&server)
            .await;

        let tier = BasicTier::new(CandidateServiceClient::new(Some(server.uri())));
        assert!(tier.fetch(&request()).await.is_err());
    }

    #[tokio::test]
    async fn test_unconfigured_client_fails_fast() {
        let tier = PersonalizedTier::new(CandidateServiceClient::new(None));
        let err = tier.fetch(&request()).await.unwrap_err();
        assert!(err.to_string().contains("not configured"));
    }
}
