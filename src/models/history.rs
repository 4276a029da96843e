use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use super::{EnrichedCandidate, QuizAnswer};

/// Viewing signals for a signed-in user
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WatchSignals {
    /// Titles watched recently enough to avoid recommending again
    pub recently_watched: HashSet<i64>,
    /// Average rating the user gave per genre, keyed by lowercase genre name
    pub genre_ratings: HashMap<String, f64>,
}

impl WatchSignals {
    pub fn with_rating(mut self, genre: &str, average: f64) -> Self {
        self.genre_ratings.insert(genre.to_lowercase(), average);
        self
    }

    pub fn with_recent(mut self, title_id: i64) -> Self {
        self.recently_watched.insert(title_id);
        self
    }
}

/// One quiz submission persisted to the history log
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub user_id: String,
    pub answers: Vec<QuizAnswer>,
    pub recommendations: Vec<EnrichedCandidate>,
    pub timestamp: DateTime<Utc>,
}
