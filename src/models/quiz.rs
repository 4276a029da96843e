use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One question/answer pair as submitted by the questionnaire
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QuizAnswer {
    #[serde(default)]
    pub question_id: String,
    /// Free-form answer; multi-select questions send a comma-separated
    /// list or a JSON list literal
    #[serde(default)]
    pub answer: String,
}

impl QuizAnswer {
    pub fn new(question_id: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question_id: question_id.into(),
            answer: answer.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Movie,
    Series,
    Documentary,
    Animation,
    #[default]
    Unsure,
}

/// Runtime bounds in minutes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct RuntimeBounds {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<u32>,
}

impl RuntimeBounds {
    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

/// Normalized preferences derived from a single quiz submission
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuizFilters {
    pub platforms: BTreeSet<String>,
    pub content_type: ContentType,
    pub mood: String,
    pub genres: BTreeSet<String>,
    pub runtime: RuntimeBounds,
    pub region: String,
    pub languages: Vec<String>,
    /// Applied by the personalized candidate service; local tiers ignore it
    pub min_rating: f64,
    pub max_results: usize,
}

impl Default for QuizFilters {
    fn default() -> Self {
        Self {
            platforms: BTreeSet::new(),
            content_type: ContentType::Unsure,
            mood: "unsure".to_string(),
            genres: BTreeSet::new(),
            runtime: RuntimeBounds::default(),
            region: "us".to_string(),
            languages: vec!["en".to_string()],
            min_rating: 0.0,
            max_results: 20,
        }
    }
}

impl QuizFilters {
    pub fn has_platform_selection(&self) -> bool {
        !self.platforms.is_empty()
    }

    /// Whether a streaming service name refers to one of the selected platforms.
    ///
    /// Names are compared on their alphanumeric characters only, and a
    /// containment match in either direction counts so that "Prime Video"
    /// selects "Amazon Prime Video".
    pub fn selects_platform(&self, service: &str) -> bool {
        let service = normalize_platform(service);
        if service.is_empty() {
            return false;
        }
        self.platforms.iter().any(|selected| {
            let selected = normalize_platform(selected);
            !selected.is_empty() && (service.contains(&selected) || selected.contains(&service))
        })
    }

    pub fn has_genre(&self, genre: &str) -> bool {
        self.genres.iter().any(|g| g.eq_ignore_ascii_case(genre))
    }

    /// Natural-language summary sent to the personalized candidate service
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();

        let kind = match self.content_type {
            ContentType::Movie => "a movie",
            ContentType::Series => "a series",
            ContentType::Documentary => "a documentary",
            ContentType::Animation => "an animated title",
            ContentType::Unsure => "something to watch",
        };
        parts.push(format!("Looking for {}", kind));

        if self.mood != "unsure" {
            parts.push(format!("in a {} mood", self.mood));
        }
        if !self.genres.is_empty() {
            parts.push(format!("preferably {}", join(&self.genres)));
        }
        if !self.platforms.is_empty() {
            parts.push(format!("streaming on {}", join(&self.platforms)));
        }
        match (self.runtime.min, self.runtime.max) {
            (Some(min), Some(max)) => parts.push(format!("between {} and {} minutes long", min, max)),
            (None, Some(max)) => parts.push(format!("under {} minutes", max)),
            (Some(min), None) => parts.push(format!("over {} minutes", min)),
            (None, None) => {}
        }
        if self.min_rating > 0.0 {
            parts.push(format!("rated at least {:.1}", self.min_rating));
        }
        parts.push(format!("available in region {}", self.region.to_uppercase()));

        format!("{}.", parts.join(", "))
    }
}

fn normalize_platform(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

fn join(items: &BTreeSet<String>) -> String {
    items.iter().cloned().collect::<Vec<_>>().join(", ")
}
