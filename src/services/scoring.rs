//! Additive preference scoring.
//!
//! Every candidate starts at zero and collects fixed weights for each
//! preference it satisfies. The platform term depends on streaming data and
//! is applied later through [`apply_platform_match`], only once availability
//! for the candidate is actually known.
use std::cmp::Ordering;

use crate::{
    error::AppResult,
    models::{MovieCandidate, QuizFilters, ScoredCandidate, WatchSignals},
    services::genres::{genre_names, mood_genres, mood_key},
};

pub const GENRE_MATCH_WEIGHT: f64 = 30.0;
pub const MOOD_MATCH_WEIGHT: f64 = 25.0;
pub const PLATFORM_MATCH_WEIGHT: f64 = 20.0;
pub const HISTORY_AFFINITY_WEIGHT: f64 = 15.0;
pub const RECENTLY_WATCHED_PENALTY: f64 = -15.0;
pub const HIGH_RATING_WEIGHT: f64 = 10.0;
pub const GOOD_RATING_WEIGHT: f64 = 5.0;

const HIGH_RATING_THRESHOLD: f64 = 75.0;
const GOOD_RATING_THRESHOLD: f64 = 60.0;
const AFFINITY_THRESHOLD: f64 = 7.0;

/// Per-user viewing signals consulted while scoring.
///
/// Lookups may fail independently; a failed lookup only drops the term it
/// was feeding for that one candidate.
#[cfg_attr(test, mockall::automock)]
pub trait WatchHistory: Send + Sync {
    fn was_recently_watched(&self, title_id: i64) -> AppResult<bool>;

    /// Average rating the user gave to titles of this genre, if any
    fn average_rating(&self, genre: &str) -> AppResult<Option<f64>>;
}

impl WatchHistory for WatchSignals {
    fn was_recently_watched(&self, title_id: i64) -> AppResult<bool> {
        Ok(self.recently_watched.contains(&title_id))
    }

    fn average_rating(&self, genre: &str) -> AppResult<Option<f64>> {
        Ok(self.genre_ratings.get(&genre.to_lowercase()).copied())
    }
}

/// Scores and ranks candidates, keeping the best `filters.max_results`.
///
/// Ordering is by score, then `vote_average`, then the incoming order.
pub fn score_candidates(
    candidates: Vec<MovieCandidate>,
    filters: &QuizFilters,
    history: Option<&dyn WatchHistory>,
) -> Vec<ScoredCandidate> {
    let mut scored: Vec<ScoredCandidate> = candidates
        .into_iter()
        .map(|candidate| score_candidate(candidate, filters, history))
        .collect();

    sort_by_rank(&mut scored);
    scored.truncate(filters.max_results);
    scored
}

pub fn score_candidate(
    candidate: MovieCandidate,
    filters: &QuizFilters,
    history: Option<&dyn WatchHistory>,
) -> ScoredCandidate {
    let genres = genre_names(&candidate.genre_ids);
    let mut score = 0.0;
    let mut reasons = Vec::new();

    if let Some(genre) = genres.iter().find(|g| filters.has_genre(g)) {
        score += GENRE_MATCH_WEIGHT;
        reasons.push(format!("Matches your preferred genre: {}", genre));
    }

    let mood_genres = mood_genres(&filters.mood);
    if let Some(mood) = mood_key(&filters.mood) {
        if genres.iter().any(|g| mood_genres.contains(g)) {
            score += MOOD_MATCH_WEIGHT;
            reasons.push(format!("Fits your {} mood", mood));
        }
    }

    if let Some(history) = history {
        let (delta, history_reasons) = history_terms(&candidate, &genres, history);
        score += delta;
        reasons.extend(history_reasons);
    }

    let rating = candidate.vote_average * 10.0;
    if rating > HIGH_RATING_THRESHOLD {
        score += HIGH_RATING_WEIGHT;
        reasons.push("Critically acclaimed".to_string());
    } else if rating > GOOD_RATING_THRESHOLD {
        score += GOOD_RATING_WEIGHT;
        reasons.push("Well reviewed".to_string());
    }

    ScoredCandidate {
        rating: candidate.display_rating(),
        candidate,
        score,
        reasons,
    }
}

fn history_terms(
    candidate: &MovieCandidate,
    genres: &[&str],
    history: &dyn WatchHistory,
) -> (f64, Vec<String>) {
    let mut delta = 0.0;
    let mut reasons = Vec::new();

    let liked_genre = genres.iter().find_map(|genre| match history.average_rating(genre) {
        Ok(Some(average)) if average > AFFINITY_THRESHOLD => Some(*genre),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(
                candidate_id = candidate.id,
                genre = %genre,
                error = %e,
                "Genre rating lookup failed"
            );
            None
        }
    });
    if let Some(genre) = liked_genre {
        delta += HISTORY_AFFINITY_WEIGHT;
        reasons.push(format!("You enjoy {} titles", genre));
    }

    match history.was_recently_watched(candidate.id) {
        Ok(true) => {
            delta += RECENTLY_WATCHED_PENALTY;
            reasons.push("You watched this recently".to_string());
        }
        Ok(false) => {}
        Err(e) => {
            tracing::warn!(
                candidate_id = candidate.id,
                error = %e,
                "Recently watched lookup failed"
            );
        }
    }

    (delta, reasons)
}

/// Adds the platform term when the candidate streams on a selected service.
/// Returns whether the bonus was applied.
pub fn apply_platform_match(
    scored: &mut ScoredCandidate,
    available_on: &[String],
    filters: &QuizFilters,
) -> bool {
    if !filters.has_platform_selection() {
        return false;
    }
    if available_on.iter().any(|service| filters.selects_platform(service)) {
        scored.score += PLATFORM_MATCH_WEIGHT;
        return true;
    }
    false
}

/// Stable sort by score, then `vote_average`, both descending
pub fn sort_by_rank(scored: &mut [ScoredCandidate]) {
    scored.sort_by(|a, b| compare_rank(a, b));
}

pub fn compare_rank(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| b.candidate.vote_average.total_cmp(&a.candidate.vote_average))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    fn candidate(id: i64, vote_average: f64, genre_ids: &[u32]) -> MovieCandidate {
        MovieCandidate {
            id,
            title: format!("Title {}", id),
            overview: String::new(),
            poster_path: None,
            release_date: None,
            vote_average,
            genre_ids: genre_ids.to_vec(),
            popularity: 0.0,
        }
    }

    fn drama_filters() -> QuizFilters {
        QuizFilters {
            genres: ["Drama".to_string()].into_iter().collect(),
            mood: "touching".to_string(),
            platforms: ["Netflix".to_string()].into_iter().collect(),
            ..QuizFilters::default()
        }
    }

    #[test]
    fn test_all_terms_add_up() {
        let filters = drama_filters();
        let mut scored = score_candidate(candidate(1, 8.0, &[18]), &filters, None);
        assert_eq!(scored.score, 65.0);

        assert!(apply_platform_match(&mut scored, &["Netflix".to_string()], &filters));
        assert_eq!(scored.score, 85.0);
        assert_eq!(scored.rating, 80);
        assert_eq!(
            scored.reasons,
            vec![
                "Matches your preferred genre: Drama",
                "Fits your touching mood",
                "Critically acclaimed",
            ]
        );
    }

    #[test]
    fn test_free_text_mood_reason_uses_keyword() {
        let filters = QuizFilters {
            mood: "i want to laugh".to_string(),
            ..QuizFilters::default()
        };
        let scored = score_candidate(candidate(1, 5.0, &[35]), &filters, None);
        assert_eq!(scored.score, MOOD_MATCH_WEIGHT);
        assert_eq!(scored.reasons, vec!["Fits your laugh mood"]);
    }

    #[test]
    fn test_rating_bands() {
        let filters = QuizFilters::default();
        assert_eq!(score_candidate(candidate(1, 7.6, &[]), &filters, None).score, 10.0);
        assert_eq!(score_candidate(candidate(1, 7.5, &[]), &filters, None).score, 5.0);
        assert_eq!(score_candidate(candidate(1, 6.1, &[]), &filters, None).score, 5.0);
        assert_eq!(score_candidate(candidate(1, 6.0, &[]), &filters, None).score, 0.0);
    }

    #[test]
    fn test_genre_match_is_case_insensitive() {
        let filters = QuizFilters {
            genres: ["science fiction".to_string()].into_iter().collect(),
            ..QuizFilters::default()
        };
        let scored = score_candidate(candidate(1, 5.0, &[878]), &filters, None);
        assert_eq!(scored.score, GENRE_MATCH_WEIGHT);
    }

    #[test]
    fn test_platform_not_applied_without_match_or_selection() {
        let filters = drama_filters();
        let mut scored = score_candidate(candidate(1, 5.0, &[]), &filters, None);
        assert!(!apply_platform_match(&mut scored, &["Hulu".to_string()], &filters));
        assert!(!apply_platform_match(&mut scored, &[], &filters));

        let mut unselected = score_candidate(candidate(2, 5.0, &[]), &QuizFilters::default(), None);
        assert!(!apply_platform_match(&mut unselected, &["Netflix".to_string()], &QuizFilters::default()));
        assert_eq!(unselected.score, 0.0);
    }

    #[test]
    fn test_history_affinity_and_recent_penalty() {
        let signals = WatchSignals::default().with_rating("Comedy", 8.5).with_recent(2);
        let filters = QuizFilters::default();

        let liked = score_candidate(candidate(1, 5.0, &[35]), &filters, Some(&signals));
        assert_eq!(liked.score, HISTORY_AFFINITY_WEIGHT);
        assert!(liked.reasons.contains(&"You enjoy Comedy titles".to_string()));

        let seen = score_candidate(candidate(2, 5.0, &[35]), &filters, Some(&signals));
        assert_eq!(seen.score, 0.0);

        let neutral = WatchSignals::default().with_rating("Comedy", 7.0);
        assert_eq!(score_candidate(candidate(3, 5.0, &[35]), &filters, Some(&neutral)).score, 0.0);
    }

    #[test]
    fn test_failing_history_lookup_is_isolated() {
        let mut history = MockWatchHistory::new();
        history
            .expect_was_recently_watched()
            .returning(|id| {
                if id == 1 {
                    Err(AppError::Database(sqlx::Error::PoolTimedOut))
                } else {
                    Ok(id == 2)
                }
            });
        history.expect_average_rating().returning(|_| Ok(None));

        let filters = QuizFilters::default();
        let scored = score_candidates(
            vec![candidate(1, 8.0, &[]), candidate(2, 8.0, &[])],
            &filters,
            Some(&history),
        );

        assert_eq!(scored[0].id(), 1);
        assert_eq!(scored[0].score, 10.0);
        assert_eq!(scored[1].score, -5.0);
    }

    #[test]
    fn test_ties_break_on_vote_then_input_order() {
        let filters = QuizFilters::default();
        let scored = score_candidates(
            vec![
                candidate(1, 7.0, &[]),
                candidate(2, 7.4, &[]),
                candidate(3, 7.0, &[]),
                candidate(4, 9.0, &[]),
            ],
            &filters,
            None,
        );

        let ids: Vec<i64> = scored.iter().map(|s| s.id()).collect();
        assert_eq!(ids, vec![4, 2, 1, 3]);
    }

    #[test]
    fn test_truncates_to_max_results() {
        let filters = QuizFilters {
            max_results: 2,
            ..QuizFilters::default()
        };
        let candidates = (1..=5).map(|id| candidate(id, 7.0, &[])).collect();
        assert_eq!(score_candidates(candidates, &filters, None).len(), 2);
    }

    #[test]
    fn test_scoring_is_deterministic() {
        let filters = drama_filters();
        let signals = WatchSignals::default().with_rating("Drama", 9.0).with_rating("Romance", 8.0);
        let candidates: Vec<MovieCandidate> = vec![
            candidate(1, 7.9, &[18, 10749]),
            candidate(2, 6.2, &[35]),
            candidate(3, 8.8, &[10749, 18]),
        ];

        let first = score_candidates(candidates.clone(), &filters, Some(&signals));
        let second = score_candidates(candidates, &filters, Some(&signals));
        assert_eq!(first, second);
    }
}
