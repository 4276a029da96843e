use crate::{
    error::{AppError, AppResult},
    models::{ContentType, MovieCandidate, QuizFilters},
    services::{
        candidates::{CandidateRequest, CandidateTier, TierId},
        genres::genre_id,
    },
};

const CATALOG_JSON: &str = include_str!("../../../data/fallback_catalog.json");

const DOCUMENTARY_GENRE_ID: u32 = 99;
const ANIMATION_GENRE_ID: u32 = 16;

/// Served when nothing in the catalog matches the requested genres:
/// a drama, a sci-fi, an animation, a comedy and a documentary
const CROSS_GENRE_IDS: &[i64] = &[278, 27205, 129, 120467, 515042];

/// Tier backed by a small catalog compiled into the binary
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalCatalogTier;

impl LocalCatalogTier {
    pub fn new() -> Self {
        Self
    }

    fn catalog() -> AppResult<Vec<MovieCandidate>> {
        serde_json::from_str(CATALOG_JSON)
            .map_err(|e| AppError::Internal(format!("Embedded catalog is malformed: {}", e)))
    }
}

#[async_trait::async_trait]
impl CandidateTier for LocalCatalogTier {
    fn id(&self) -> TierId {
        TierId::LocalCatalog
    }

    async fn fetch(&self, request: &CandidateRequest) -> AppResult<Vec<MovieCandidate>> {
        Ok(select(Self::catalog()?, &request.filters))
    }
}

/// Filters the catalog by content type and genre, best rated first.
/// `min_rating` is not applied; the catalog is already hand-picked.
fn select(catalog: Vec<MovieCandidate>, filters: &QuizFilters) -> Vec<MovieCandidate> {
    let wanted: Vec<u32> = filters.genres.iter().filter_map(|g| genre_id(g)).collect();

    let mut matches: Vec<MovieCandidate> = catalog
        .iter()
        .filter(|c| matches_content_type(c, filters.content_type))
        .filter(|c| wanted.is_empty() || c.genre_ids.iter().any(|id| wanted.contains(id)))
        .cloned()
        .collect();

    if matches.is_empty() {
        tracing::debug!(
            genres = ?filters.genres,
            "No catalog title matches, using cross-genre selection"
        );
        matches = CROSS_GENRE_IDS
            .iter()
            .filter_map(|id| catalog.iter().find(|c| c.id == *id).cloned())
            .collect();
    }

    matches.sort_by(|a, b| b.vote_average.total_cmp(&a.vote_average));
    matches.truncate(filters.max_results);
    matches
}

fn matches_content_type(candidate: &MovieCandidate, content_type: ContentType) -> bool {
    match content_type {
        ContentType::Documentary => candidate.genre_ids.contains(&DOCUMENTARY_GENRE_ID),
        ContentType::Animation => candidate.genre_ids.contains(&ANIMATION_GENRE_ID),
        ContentType::Movie | ContentType::Series | ContentType::Unsure => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filters(genres: &[&str], content_type: ContentType) -> QuizFilters {
        QuizFilters {
            genres: genres.iter().map(|g| g.to_string()).collect(),
            content_type,
            ..QuizFilters::default()
        }
    }

    fn request(filters: QuizFilters) -> CandidateRequest {
        CandidateRequest {
            filters,
            answers: vec![],
            user_id: None,
        }
    }

    #[test]
    fn test_embedded_catalog_parses() {
        let catalog = LocalCatalogTier::catalog().unwrap();
        assert!(catalog.len() >= 20);
        for id in CROSS_GENRE_IDS {
            assert!(catalog.iter().any(|c| c.id == *id), "missing cross-genre id {}", id);
        }
    }

    #[tokio::test]
    async fn test_filters_by_genre_and_orders_by_rating() {
        let candidates = LocalCatalogTier::new()
            .fetch(&request(filters(&["Horror"], ContentType::Unsure)))
            .await
            .unwrap();

        assert!(!candidates.is_empty());
        assert!(candidates.iter().all(|c| c.genre_ids.contains(&27)));
        assert!(candidates
            .windows(2)
            .all(|pair| pair[0].vote_average >= pair[1].vote_average));
    }

    #[tokio::test]
    async fn test_documentary_content_type() {
        let candidates = LocalCatalogTier::new()
            .fetch(&request(filters(&[], ContentType::Documentary)))
            .await
            .unwrap();

        assert_eq!(candidates.len(), 3);
        assert!(candidates.iter().all(|c| c.genre_ids == vec![99]));
    }

    #[tokio::test]
    async fn test_unmatched_genre_uses_cross_genre_set() {
        let candidates = LocalCatalogTier::new()
            .fetch(&request(filters(&["Western"], ContentType::Unsure)))
            .await
            .unwrap();

        let mut ids: Vec<i64> = candidates.iter().map(|c| c.id).collect();
        ids.sort();
        let mut expected = CROSS_GENRE_IDS.to_vec();
        expected.sort();
        assert_eq!(ids, expected);
    }

    #[tokio::test]
    async fn test_truncates_to_max_results() {
        let mut wanted = filters(&[], ContentType::Unsure);
        wanted.max_results = 4;

        let candidates = LocalCatalogTier::new().fetch(&request(wanted)).await.unwrap();
        assert_eq!(candidates.len(), 4);
        assert_eq!(candidates[0].vote_average, 8.7);
    }

    #[tokio::test]
    async fn test_min_rating_is_not_applied_locally() {
        let mut strict = filters(&["Horror"], ContentType::Unsure);
        strict.min_rating = 9.9;

        let candidates = LocalCatalogTier::new().fetch(&request(strict)).await.unwrap();
        assert!(!candidates.is_empty());
        assert!(candidates.iter().all(|c| c.vote_average < 9.9));
    }
}
