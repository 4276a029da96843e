/// Streaming availability data sources
///
/// A provider turns one candidate into the list of ways it can be watched in
/// a region. Providers report failures as errors; deciding what a failed
/// lookup means for the response is left to the enricher.
use crate::{
    error::AppResult,
    models::{AvailabilityRequest, StreamingOption},
};

pub mod streaming_availability;

pub use streaming_availability::StreamingAvailabilityProvider;

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait AvailabilityProvider: Send + Sync {
    /// Streaming options for one title in `request.region`.
    ///
    /// An empty list means the title is known but not streamable there.
    async fn fetch_options(&self, request: &AvailabilityRequest) -> AppResult<Vec<StreamingOption>>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}
