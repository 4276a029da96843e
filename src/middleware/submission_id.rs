use axum::{
    body::Body,
    extract::Request,
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

/// HTTP header carrying the submission id
pub const SUBMISSION_ID_HEADER: &str = "x-submission-id";

/// Correlates every log line and the response of one request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubmissionId(pub Uuid);

impl SubmissionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubmissionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Takes the submission id from the `x-submission-id` header, or generates
/// one when the header is missing or not a UUID, and echoes it back on the
/// response.
pub async fn submission_id_middleware(mut request: Request, next: Next) -> Response {
    let submission_id = request
        .headers()
        .get(SUBMISSION_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| Uuid::parse_str(s.trim()).ok())
        .map(SubmissionId)
        .unwrap_or_default();

    request.extensions_mut().insert(submission_id);

    let mut response = next.run(request).await;

    if let Ok(header_value) = HeaderValue::from_str(&submission_id.to_string()) {
        response
            .headers_mut()
            .insert(SUBMISSION_ID_HEADER, header_value);
    }

    response
}

/// Request span carrying the submission id
pub fn make_span_with_submission_id(request: &Request<Body>) -> tracing::Span {
    let submission_id = request
        .extensions()
        .get::<SubmissionId>()
        .map(|id| id.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    tracing::info_span!(
        "http_request",
        method = %request.method(),
        uri = %request.uri(),
        submission_id = %submission_id,
    )
}
