/// Streaming Availability API provider (via RapidAPI)
///
/// Titles are looked up by TMDB id first. Some ids are unknown to the API,
/// so a 404 falls back to a title search narrowed by release year.
use crate::{
    error::{AppError, AppResult},
    models::{ApiShowDetails, AvailabilityRequest, AvailabilityType, StreamingOption},
    services::providers::AvailabilityProvider,
};
use reqwest::{Client as HttpClient, Response, StatusCode};

const PROVIDER_NAME: &str = "streaming_availability";

#[derive(Clone)]
pub struct StreamingAvailabilityProvider {
    http_client: HttpClient,
    api_key: Option<String>,
    api_url: String,
}

impl StreamingAvailabilityProvider {
    pub fn new(api_key: Option<String>, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    fn api_key(&self) -> AppResult<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| AppError::ExternalApi("Streaming API key is not configured".to_string()))
    }

    async fn get(&self, path: &str, query: &[(&str, &str)]) -> AppResult<Response> {
        let url = format!("{}/{}", self.api_url, path);
        let response = self
            .http_client
            .get(&url)
            .header("X-RapidAPI-Key", self.api_key()?)
            .query(query)
            .send()
            .await?;
        Ok(response)
    }

    async fn lookup_by_id(&self, request: &AvailabilityRequest) -> AppResult<Option<ApiShowDetails>> {
        let response = self
            .get(
                &format!("shows/movie/{}", request.id),
                &[("country", request.region.as_str())],
            )
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let details = ensure_success(response).await?.json().await?;
        Ok(Some(details))
    }

    async fn search_by_title(&self, request: &AvailabilityRequest) -> AppResult<Option<ApiShowDetails>> {
        if request.title.trim().is_empty() {
            return Ok(None);
        }

        let response = self
            .get(
                "shows/search/title",
                &[
                    ("title", request.title.as_str()),
                    ("country", request.region.as_str()),
                    ("show_type", "movie"),
                ],
            )
            .await?;

        let shows: Vec<ApiShowDetails> = ensure_success(response).await?.json().await?;
        Ok(pick_search_match(shows, request.release_year))
    }
}

async fn ensure_success(response: Response) -> AppResult<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(AppError::ExternalApi(format!(
        "API returned status {}: {}",
        status, body
    )))
}

/// First search hit from the same release year, or the first hit when the
/// candidate's year is unknown
fn pick_search_match(shows: Vec<ApiShowDetails>, release_year: Option<i32>) -> Option<ApiShowDetails> {
    match release_year {
        Some(year) => shows.into_iter().find(|show| show.release_year == Some(year)),
        None => shows.into_iter().next(),
    }
}

/// Options listed for `region`. Unknown availability types are skipped.
pub fn convert_api_response(details: ApiShowDetails, region: &str) -> Vec<StreamingOption> {
    let Some(options) = details.streaming_options.get(&region.to_lowercase()) else {
        return Vec::new();
    };

    options
        .iter()
        .filter_map(|option| {
            let availability_type = AvailabilityType::parse(&option.availability_type)?;
            Some(StreamingOption {
                service: option.service.name.clone(),
                availability_type,
                link: option.link.clone(),
                quality: option.quality.clone(),
                price: option.price.as_ref().and_then(|p| p.to_price()),
            })
        })
        .collect()
}

#[async_trait::async_trait]
impl AvailabilityProvider for StreamingAvailabilityProvider {
    async fn fetch_options(&self, request: &AvailabilityRequest) -> AppResult<Vec<StreamingOption>> {
        let details = match self.lookup_by_id(request).await? {
            Some(details) => Some(details),
            None => {
                tracing::debug!(
                    candidate_id = request.id,
                    title = %request.title,
                    provider = PROVIDER_NAME,
                    "Title id unknown to provider, searching by title"
                );
                self.search_by_title(request).await?
            }
        };

        let options = details
            .map(|details| convert_api_response(details, &request.region))
            .unwrap_or_default();

        tracing::info!(
            candidate_id = request.id,
            region = %request.region,
            services = options.len(),
            provider = PROVIDER_NAME,
            "Availability fetched"
        );

        Ok(options)
    }

    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }
}
