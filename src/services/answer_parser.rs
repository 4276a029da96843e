use std::collections::BTreeSet;

use crate::models::{ContentType, QuizAnswer, QuizFilters, RuntimeBounds};
use crate::services::genres::{canonical_genre, mood_genres};

pub const DEFAULT_REGION: &str = "us";
pub const DEFAULT_MAX_RESULTS: usize = 20;
const MAX_RESULTS_CAP: usize = 50;

const PREMIUM_MIN_RATING: f64 = 6.5;
const STANDARD_MIN_RATING: f64 = 6.0;

/// Major subscription services whose users get a higher quality bar
const PREMIUM_PLATFORMS: &[&str] = &[
    "netflix",
    "max",
    "hbo max",
    "hbo",
    "disney+",
    "disney plus",
    "prime video",
    "amazon prime video",
    "amazon prime",
    "apple tv+",
    "apple tv plus",
];

const NO_PREFERENCE: &[&str] = &["any", "all", "no preference", "none", "doesn't matter"];

const COUNTRIES: &[(&str, &str)] = &[
    ("poland", "pl"),
    ("polska", "pl"),
    ("united states", "us"),
    ("usa", "us"),
    ("america", "us"),
    ("united kingdom", "gb"),
    ("great britain", "gb"),
    ("england", "gb"),
    ("uk", "gb"),
    ("germany", "de"),
    ("deutschland", "de"),
    ("france", "fr"),
    ("spain", "es"),
    ("italy", "it"),
    ("canada", "ca"),
    ("australia", "au"),
    ("brazil", "br"),
    ("mexico", "mx"),
    ("japan", "jp"),
    ("india", "in"),
    ("netherlands", "nl"),
    ("sweden", "se"),
];

/// Region and platform hints from outside the questionnaire
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseContext {
    /// `preferred-region` from the user preference store
    pub stored_region: Option<String>,
    /// `preferred-platforms` from the user preference store
    pub stored_platforms: Option<String>,
    /// Device locale, e.g. an `Accept-Language` value like "pl-PL,pl;q=0.9"
    pub locale: Option<String>,
}

/// Converts raw questionnaire answers into normalized filters.
///
/// Never fails: unknown question ids are ignored and anything missing or
/// unreadable falls back to a default. When a question is answered twice
/// the last answer wins.
pub fn parse_answers(answers: &[QuizAnswer], context: &ParseContext) -> QuizFilters {
    let mut platforms: Option<Vec<String>> = None;
    let mut content_type = ContentType::Unsure;
    let mut mood = "unsure".to_string();
    let mut genres: Vec<String> = Vec::new();
    let mut runtime = RuntimeBounds::default();
    let mut region: Option<String> = None;
    let mut languages: Option<Vec<String>> = None;
    let mut min_rating: Option<f64> = None;
    let mut max_results = DEFAULT_MAX_RESULTS;

    for answer in answers {
        let value = answer.answer.trim();
        match answer.question_id.trim() {
            "platforms" => platforms = Some(parse_platforms(value)),
            "contentType" => content_type = parse_content_type(value),
            "mood" => {
                if !value.is_empty() {
                    mood = value.to_lowercase();
                }
            }
            "genre" | "genres" | "preferredGenres" => {
                genres = parse_list(value).iter().map(|g| canonical_genre(g)).collect();
            }
            "movieLength" => runtime = parse_runtime(value),
            "region" => region = detect_region(value),
            "language" | "languages" => {
                let parsed: Vec<String> = parse_list(value).iter().map(|l| l.to_lowercase()).collect();
                if !parsed.is_empty() {
                    languages = Some(parsed);
                }
            }
            "minRating" => {
                min_rating = value
                    .parse::<f64>()
                    .ok()
                    .filter(|r| r.is_finite())
                    .map(|r| r.clamp(0.0, 10.0));
            }
            "maxResults" => {
                if let Ok(n) = value.parse::<usize>() {
                    max_results = n.clamp(1, MAX_RESULTS_CAP);
                }
            }
            other => {
                tracing::debug!(question_id = %other, "Ignoring unknown quiz question");
            }
        }
    }

    let platforms: BTreeSet<String> = platforms
        .or_else(|| context.stored_platforms.as_deref().map(parse_platforms))
        .unwrap_or_default()
        .into_iter()
        .collect();

    let mut genres: BTreeSet<String> = genres.into_iter().collect();
    if genres.is_empty() {
        genres = mood_genres(&mood).iter().map(|g| g.to_string()).collect();
    }

    let locale = context.locale.as_deref().and_then(parse_locale);
    let region = region
        .or_else(|| context.stored_region.as_deref().and_then(detect_region))
        .or_else(|| locale.as_ref().and_then(|(_, region)| region.clone()))
        .unwrap_or_else(|| DEFAULT_REGION.to_string());

    let languages = languages.unwrap_or_else(|| {
        default_languages(&region, locale.as_ref().map(|(language, _)| language.as_str()))
    });

    let min_rating = min_rating.unwrap_or_else(|| default_min_rating(&platforms));

    QuizFilters {
        platforms,
        content_type,
        mood,
        genres,
        runtime,
        region,
        languages,
        min_rating,
        max_results,
    }
}

/// Splits a multi-select answer. A JSON list literal is used as-is,
/// anything else is split on commas.
pub fn parse_list(answer: &str) -> Vec<String> {
    let answer = answer.trim();

    let items: Vec<String> = if answer.starts_with('[') {
        match serde_json::from_str::<Vec<String>>(answer) {
            Ok(items) => items,
            Err(_) => split_commas(answer.trim_start_matches('[').trim_end_matches(']')),
        }
    } else {
        split_commas(answer)
    };

    let mut seen = Vec::with_capacity(items.len());
    for item in items {
        let item = item.trim().trim_matches('"').trim().to_string();
        if !item.is_empty() && !seen.iter().any(|s: &String| s.eq_ignore_ascii_case(&item)) {
            seen.push(item);
        }
    }
    seen
}

fn split_commas(value: &str) -> Vec<String> {
    value.split(',').map(str::to_string).collect()
}

fn parse_platforms(answer: &str) -> Vec<String> {
    let platforms = parse_list(answer);
    if platforms
        .iter()
        .all(|p| NO_PREFERENCE.contains(&p.to_lowercase().as_str()))
    {
        return Vec::new();
    }
    platforms
}

fn parse_content_type(answer: &str) -> ContentType {
    match answer.to_lowercase().as_str() {
        "movie" | "movies" | "film" | "films" => ContentType::Movie,
        "series" | "tv" | "tv series" | "show" | "shows" | "tv show" => ContentType::Series,
        "documentary" | "documentaries" => ContentType::Documentary,
        "animation" | "animated" | "anime" => ContentType::Animation,
        _ => ContentType::Unsure,
    }
}

/// "short" -> under 90, "standard" -> 90-120, "long" -> over 120
pub fn parse_runtime(answer: &str) -> RuntimeBounds {
    let answer = answer.to_lowercase();
    if answer.starts_with("short") {
        RuntimeBounds {
            min: None,
            max: Some(90),
        }
    } else if answer.starts_with("standard") || answer.starts_with("medium") {
        RuntimeBounds {
            min: Some(90),
            max: Some(120),
        }
    } else if answer.starts_with("long") {
        RuntimeBounds {
            min: Some(120),
            max: None,
        }
    } else {
        RuntimeBounds::default()
    }
}

/// Resolves a country name or two-letter code to a lowercase region code
pub fn detect_region(answer: &str) -> Option<String> {
    let answer = answer.trim().to_lowercase();
    if answer.is_empty() {
        return None;
    }

    if let Some((_, code)) = COUNTRIES.iter().find(|(name, _)| *name == answer) {
        return Some(code.to_string());
    }
    if answer.len() == 2 && answer.chars().all(|c| c.is_ascii_alphabetic()) {
        return Some(answer);
    }

    COUNTRIES
        .iter()
        .find(|(name, _)| name.len() > 3 && answer.contains(name))
        .map(|(_, code)| code.to_string())
}

/// Extracts (language, region) from a locale such as "pl-PL,pl;q=0.9"
fn parse_locale(locale: &str) -> Option<(String, Option<String>)> {
    let tag = locale.split(',').next()?.split(';').next()?.trim();
    let mut parts = tag.split(['-', '_']);

    let language = parts.next()?.to_lowercase();
    if language.len() != 2 || !language.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }

    let region = parts
        .next()
        .map(str::to_lowercase)
        .filter(|r| r.len() == 2 && r.chars().all(|c| c.is_ascii_alphabetic()));

    Some((language, region))
}

fn default_languages(region: &str, locale_language: Option<&str>) -> Vec<String> {
    if region == "pl" {
        return vec!["pl".to_string(), "en".to_string()];
    }
    match locale_language {
        Some(language) if language != "en" => vec![language.to_string(), "en".to_string()],
        _ => vec!["en".to_string()],
    }
}

fn default_min_rating(platforms: &BTreeSet<String>) -> f64 {
    if platforms.is_empty() {
        0.0
    } else if platforms.iter().any(|p| is_premium_platform(p)) {
        PREMIUM_MIN_RATING
    } else {
        STANDARD_MIN_RATING
    }
}

fn is_premium_platform(platform: &str) -> bool {
    PREMIUM_PLATFORMS.contains(&platform.trim().to_lowercase().as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answers(pairs: &[(&str, &str)]) -> Vec<QuizAnswer> {
        pairs.iter().map(|(q, a)| QuizAnswer::new(*q, *a)).collect()
    }

    fn parse(pairs: &[(&str, &str)]) -> QuizFilters {
        parse_answers(&answers(pairs), &ParseContext::default())
    }

    #[test]
    fn test_empty_answers_use_defaults() {
        let filters = parse(&[]);
        assert_eq!(filters.content_type, ContentType::Unsure);
        assert_eq!(filters.mood, "unsure");
        assert_eq!(filters.min_rating, 0.0);
        assert_eq!(filters.max_results, 20);
        assert_eq!(filters.region, "us");
        assert_eq!(filters.languages, vec!["en"]);
        assert!(filters.platforms.is_empty());
        assert!(filters.genres.is_empty());
        assert!(filters.runtime.is_unbounded());
    }

    #[test]
    fn test_unknown_question_ids_are_ignored() {
        let filters = parse(&[("favouriteSnack", "popcorn"), ("mood", "laugh")]);
        assert_eq!(filters.mood, "laugh");
    }

    #[test]
    fn test_runtime_mapping() {
        let short = parse(&[("movieLength", "short")]);
        assert_eq!(short.runtime, RuntimeBounds { min: None, max: Some(90) });

        let standard = parse(&[("movieLength", "standard")]);
        assert_eq!(standard.runtime, RuntimeBounds { min: Some(90), max: Some(120) });

        let long = parse(&[("movieLength", "long")]);
        assert_eq!(long.runtime, RuntimeBounds { min: Some(120), max: None });

        let none = parse(&[("movieLength", "no preference")]);
        assert!(none.runtime.is_unbounded());
    }

    #[test]
    fn test_platforms_comma_separated() {
        let filters = parse(&[("platforms", "Netflix, Hulu,,netflix")]);
        let platforms: Vec<_> = filters.platforms.iter().cloned().collect();
        assert_eq!(platforms, vec!["Hulu", "Netflix"]);
    }

    #[test]
    fn test_platforms_list_literal() {
        let filters = parse(&[("platforms", r#"["HBO Max", "Disney+"]"#)]);
        assert!(filters.platforms.contains("HBO Max"));
        assert!(filters.platforms.contains("Disney+"));
        assert_eq!(filters.platforms.len(), 2);
    }

    #[test]
    fn test_platforms_no_preference_means_no_selection() {
        let filters = parse(&[("platforms", "Any")]);
        assert!(filters.platforms.is_empty());
        assert_eq!(filters.min_rating, 0.0);
    }

    #[test]
    fn test_stored_platforms_used_when_unanswered() {
        let context = ParseContext {
            stored_platforms: Some("Netflix".to_string()),
            ..ParseContext::default()
        };
        let filters = parse_answers(&[], &context);
        assert!(filters.platforms.contains("Netflix"));
    }

    #[test]
    fn test_genres_from_answer_are_canonicalized() {
        let filters = parse(&[("preferredGenres", "sci-fi,drama")]);
        assert!(filters.genres.contains("Science Fiction"));
        assert!(filters.genres.contains("Drama"));
    }

    #[test]
    fn test_genres_derived_from_mood_when_empty() {
        let filters = parse(&[("mood", "adrenaline"), ("genre", "")]);
        let genres: Vec<_> = filters.genres.iter().cloned().collect();
        assert_eq!(genres, vec!["Action", "Adventure", "Thriller"]);
    }

    #[test]
    fn test_content_type_parsing() {
        assert_eq!(parse(&[("contentType", "Movie")]).content_type, ContentType::Movie);
        assert_eq!(parse(&[("contentType", "tv")]).content_type, ContentType::Series);
        assert_eq!(parse(&[("contentType", "documentary")]).content_type, ContentType::Documentary);
        assert_eq!(parse(&[("contentType", "animated")]).content_type, ContentType::Animation);
        assert_eq!(parse(&[("contentType", "whatever")]).content_type, ContentType::Unsure);
    }

    #[test]
    fn test_min_rating_policy() {
        assert_eq!(parse(&[("platforms", "Netflix")]).min_rating, 6.5);
        assert_eq!(parse(&[("platforms", "Tubi, Pluto TV")]).min_rating, 6.0);
        assert_eq!(parse(&[("platforms", "Tubi, Max")]).min_rating, 6.5);
        assert_eq!(parse(&[]).min_rating, 0.0);
        assert_eq!(parse(&[("platforms", "Netflix"), ("minRating", "8")]).min_rating, 8.0);
        assert_eq!(parse(&[("minRating", "42")]).min_rating, 10.0);
    }

    #[test]
    fn test_max_results_override_is_clamped() {
        assert_eq!(parse(&[("maxResults", "5")]).max_results, 5);
        assert_eq!(parse(&[("maxResults", "500")]).max_results, 50);
        assert_eq!(parse(&[("maxResults", "lots")]).max_results, 20);
    }

    #[test]
    fn test_region_from_country_name() {
        let filters = parse(&[("region", "Poland")]);
        assert_eq!(filters.region, "pl");
        assert_eq!(filters.languages, vec!["pl", "en"]);

        assert_eq!(parse(&[("region", "I live in Germany")]).region, "de");
        assert_eq!(parse(&[("region", "UK")]).region, "gb");
        assert_eq!(parse(&[("region", "FR")]).region, "fr");
    }

    #[test]
    fn test_region_fallback_chain() {
        let stored = ParseContext {
            stored_region: Some("ca".to_string()),
            locale: Some("de-DE,de;q=0.9".to_string()),
            ..ParseContext::default()
        };
        assert_eq!(parse_answers(&[], &stored).region, "ca");
        assert_eq!(parse_answers(&answers(&[("region", "spain")]), &stored).region, "es");

        let locale_only = ParseContext {
            locale: Some("de-DE,de;q=0.9".to_string()),
            ..ParseContext::default()
        };
        let filters = parse_answers(&[], &locale_only);
        assert_eq!(filters.region, "de");
        assert_eq!(filters.languages, vec!["de", "en"]);

        let unreadable = ParseContext {
            stored_region: Some("???".to_string()),
            locale: Some("*".to_string()),
            ..ParseContext::default()
        };
        assert_eq!(parse_answers(&[], &unreadable).region, "us");
    }

    #[test]
    fn test_locale_without_region_keeps_language() {
        let context = ParseContext {
            locale: Some("fr".to_string()),
            ..ParseContext::default()
        };
        let filters = parse_answers(&[], &context);
        assert_eq!(filters.region, "us");
        assert_eq!(filters.languages, vec!["fr", "en"]);
    }

    #[test]
    fn test_parse_list_handles_broken_literal() {
        assert_eq!(parse_list(r#"["Netflix", "Hulu""#), vec!["Netflix", "Hulu"]);
        assert!(parse_list("  ").is_empty());
    }
}
