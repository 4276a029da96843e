use std::collections::HashSet;

use crate::{
    models::{EnrichedCandidate, QuizFilters},
    services::scoring::{apply_platform_match, compare_rank},
};

pub const DEFAULT_RESULT_SIZE: usize = 12;
pub const DEFAULT_MIN_PLATFORM_RESULTS: usize = 5;

const HIGHLY_RATED_THRESHOLD: f64 = 8.0;
const RECENT_RELEASE_YEARS: i32 = 2;
const MAX_LISTED_SERVICES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssemblySettings {
    pub result_size: usize,
    /// Platform filtering backfills with other titles below this count
    pub min_platform_results: usize,
}

impl Default for AssemblySettings {
    fn default() -> Self {
        Self {
            result_size: DEFAULT_RESULT_SIZE,
            min_platform_results: DEFAULT_MIN_PLATFORM_RESULTS,
        }
    }
}

/// Builds the final ranked list from enriched candidates.
///
/// Duplicates are dropped keeping the first occurrence, the platform term
/// is added where availability is known, and with a platform selection the
/// list keeps matching titles plus enough of the next best titles to reach
/// `min_platform_results`. The result is ranked by score, truncated to
/// `result_size` and given its display reasons.
pub fn assemble(
    candidates: Vec<EnrichedCandidate>,
    filters: &QuizFilters,
    settings: &AssemblySettings,
    current_year: i32,
) -> Vec<EnrichedCandidate> {
    let mut seen = HashSet::new();
    let mut merged: Vec<EnrichedCandidate> = candidates
        .into_iter()
        .filter(|c| seen.insert(c.id()))
        .map(|mut c| {
            if c.availability_checked {
                apply_platform_match(&mut c.scored, &c.available_on, filters);
            }
            c
        })
        .collect();
    merged.sort_by(|a, b| compare_rank(&a.scored, &b.scored));

    if filters.has_platform_selection() {
        merged = filter_by_platform(merged, filters, settings.min_platform_results);
    }

    merged.sort_by(|a, b| compare_rank(&a.scored, &b.scored));
    merged.truncate(settings.result_size);

    for candidate in &mut merged {
        candidate.scored.reasons = build_reasons(candidate, filters, current_year);
    }
    merged
}

/// Keeps candidates on a selected platform, backfilling in rank order.
///
/// Candidates whose availability was never checked are always kept; the
/// filter and the backfill only apply to titles with known availability.
fn filter_by_platform(
    ranked: Vec<EnrichedCandidate>,
    filters: &QuizFilters,
    min_results: usize,
) -> Vec<EnrichedCandidate> {
    let keep = |c: &EnrichedCandidate| {
        !c.availability_checked || c.available_on.iter().any(|s| filters.selects_platform(s))
    };

    let kept = ranked.iter().filter(|c| keep(c)).count();
    let mut backfill = min_results.saturating_sub(kept);

    if backfill > 0 {
        tracing::debug!(
            kept = kept,
            backfill = backfill,
            "Too few titles on selected platforms, backfilling"
        );
    }

    ranked
        .into_iter()
        .filter(|c| {
            if keep(c) {
                true
            } else if backfill > 0 {
                backfill -= 1;
                true
            } else {
                false
            }
        })
        .collect()
}

fn build_reasons(candidate: &EnrichedCandidate, filters: &QuizFilters, current_year: i32) -> Vec<String> {
    let mut reasons = candidate.scored.reasons.clone();

    if !candidate.available_on.is_empty() {
        let selected: Vec<&str> = candidate
            .available_on
            .iter()
            .filter(|s| filters.selects_platform(s))
            .map(String::as_str)
            .collect();
        let listed: Vec<&str> = if selected.is_empty() {
            candidate.available_on.iter().map(String::as_str).collect()
        } else {
            selected
        };
        let listed: Vec<&str> = listed.into_iter().take(MAX_LISTED_SERVICES).collect();
        reasons.push(format!("Available on {}", listed.join(", ")));
    }

    let movie = &candidate.scored.candidate;
    if movie.vote_average >= HIGHLY_RATED_THRESHOLD {
        reasons.push("Highly rated".to_string());
    }
    if movie
        .release_year()
        .is_some_and(|year| year >= current_year - RECENT_RELEASE_YEARS)
    {
        reasons.push("Recent release".to_string());
    }

    let mut seen = HashSet::new();
    reasons.retain(|reason| seen.insert(reason.clone()));
    reasons
}
