pub mod answer_parser;
pub mod assembler;
pub mod candidates;
pub mod enricher;
pub mod fallback;
pub mod genres;
pub mod providers;
pub mod recommendations;
pub mod scoring;

pub use enricher::{LookupMode, StreamingEnricher};
pub use recommendations::{
    PipelineSettings, RecommendationInput, RecommendationOutcome, RecommendationPipeline,
};
