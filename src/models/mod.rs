pub mod candidate;
pub mod history;
pub mod quiz;
pub mod streaming;

pub use candidate::{EnrichedCandidate, MovieCandidate, ScoredCandidate};
pub use history::{HistoryRecord, WatchSignals};
pub use quiz::{ContentType, QuizAnswer, QuizFilters, RuntimeBounds};
pub use streaming::{
    ApiPrice, ApiService, ApiShowDetails, ApiStreamingOption, AvailabilityRequest,
    AvailabilityType, Price, StreamingOption,
};
