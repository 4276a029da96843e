use serde::{Deserialize, Deserializer, Serialize};

use super::StreamingOption;

/// A catalog title considered for recommendation, prior to scoring
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MovieCandidate {
    pub id: i64,
    pub title: String,
    #[serde(default, deserialize_with = "string_or_null")]
    pub overview: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    pub vote_average: f64,
    #[serde(default)]
    pub genre_ids: Vec<u32>,
    #[serde(default)]
    pub popularity: f64,
}

impl MovieCandidate {
    /// Year component of `release_date` ("2010-07-16" -> 2010)
    pub fn release_year(&self) -> Option<i32> {
        self.release_date
            .as_deref()
            .and_then(|date| date.get(..4))
            .and_then(|year| year.parse().ok())
    }

    /// Rating on the 0-100 display scale
    pub fn display_rating(&self) -> u8 {
        (self.vote_average * 10.0).round().clamp(0.0, 100.0) as u8
    }
}

fn string_or_null<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// A candidate with its preference score and the reasons behind it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScoredCandidate {
    #[serde(flatten)]
    pub candidate: MovieCandidate,
    pub score: f64,
    /// `voteAverage` rescaled to 0-100
    pub rating: u8,
    pub reasons: Vec<String>,
}

impl ScoredCandidate {
    /// Wraps a candidate with a zero score, used for placeholder results
    pub fn unscored(candidate: MovieCandidate) -> Self {
        let rating = candidate.display_rating();
        Self {
            candidate,
            score: 0.0,
            rating,
            reasons: Vec::new(),
        }
    }

    pub fn id(&self) -> i64 {
        self.candidate.id
    }
}

/// A scored candidate annotated with streaming availability
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedCandidate {
    #[serde(flatten)]
    pub scored: ScoredCandidate,
    pub available_on: Vec<String>,
    pub streaming_options: Vec<StreamingOption>,
    /// False when the availability lookup was deferred or abandoned
    pub availability_checked: bool,
}

impl EnrichedCandidate {
    /// Attaches looked-up options; `available_on` is derived from them
    pub fn with_options(scored: ScoredCandidate, streaming_options: Vec<StreamingOption>) -> Self {
        let streaming_options = super::streaming::dedupe_by_service(streaming_options);
        let available_on = streaming_options.iter().map(|o| o.service.clone()).collect();
        Self {
            scored,
            available_on,
            streaming_options,
            availability_checked: true,
        }
    }

    /// Candidate whose availability is not known
    pub fn unchecked(scored: ScoredCandidate) -> Self {
        Self {
            scored,
            available_on: Vec::new(),
            streaming_options: Vec::new(),
            availability_checked: false,
        }
    }

    pub fn id(&self) -> i64 {
        self.scored.id()
    }

    pub fn score(&self) -> f64 {
        self.scored.score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AvailabilityType;

    fn candidate(release_date: Option<&str>, vote_average: f64) -> MovieCandidate {
        MovieCandidate {
            id: 1,
            title: "Test".to_string(),
            overview: String::new(),
            poster_path: None,
            release_date: release_date.map(str::to_string),
            vote_average,
            genre_ids: vec![],
            popularity: 0.0,
        }
    }

    fn option(service: &str, availability_type: AvailabilityType) -> StreamingOption {
        StreamingOption {
            service: service.to_string(),
            availability_type,
            link: None,
            quality: None,
            price: None,
        }
    }

    #[test]
    fn test_release_year() {
        assert_eq!(candidate(Some("2010-07-16"), 8.0).release_year(), Some(2010));
        assert_eq!(candidate(Some("19"), 8.0).release_year(), None);
        assert_eq!(candidate(None, 8.0).release_year(), None);
    }

    #[test]
    fn test_display_rating_rounds() {
        assert_eq!(candidate(None, 9.26).display_rating(), 93);
        assert_eq!(candidate(None, 0.0).display_rating(), 0);
        assert_eq!(candidate(None, 12.0).display_rating(), 100);
    }

    #[test]
    fn test_deserialize_with_null_overview_and_missing_optionals() {
        let json = r#"{"id": 27205, "title": "Inception", "overview": null, "voteAverage": 8.4}"#;
        let parsed: MovieCandidate = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.overview, "");
        assert!(parsed.genre_ids.is_empty());
        assert_eq!(parsed.popularity, 0.0);
    }

    #[test]
    fn test_with_options_derives_available_on() {
        let scored = ScoredCandidate::unscored(candidate(None, 7.0));
        let enriched = EnrichedCandidate::with_options(
            scored,
            vec![
                option("Netflix", AvailabilityType::Rent),
                option("Hulu", AvailabilityType::Subscription),
                option("Netflix", AvailabilityType::Subscription),
            ],
        );

        assert_eq!(enriched.available_on, vec!["Netflix", "Hulu"]);
        assert_eq!(enriched.streaming_options.len(), 2);
        assert_eq!(
            enriched.streaming_options[0].availability_type,
            AvailabilityType::Subscription
        );
        assert!(enriched.availability_checked);
    }

    #[test]
    fn test_enriched_serializes_flat() {
        let enriched = EnrichedCandidate::unchecked(ScoredCandidate::unscored(candidate(None, 7.0)));
        let json = serde_json::to_value(&enriched).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["rating"], 70);
        assert_eq!(json["availableOn"], serde_json::json!([]));
        assert_eq!(json["availabilityChecked"], false);
    }
}
