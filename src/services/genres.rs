//! Genre and mood lookup tables shared by answer parsing and scoring.
//!
//! Genre ids follow the TMDB movie genre list, which is what the candidate
//! services return in `genreIds`.

const GENRES: &[(u32, &str)] = &[
    (28, "Action"),
    (12, "Adventure"),
    (16, "Animation"),
    (35, "Comedy"),
    (80, "Crime"),
    (99, "Documentary"),
    (18, "Drama"),
    (10751, "Family"),
    (14, "Fantasy"),
    (36, "History"),
    (27, "Horror"),
    (10402, "Music"),
    (9648, "Mystery"),
    (10749, "Romance"),
    (878, "Science Fiction"),
    (10770, "TV Movie"),
    (53, "Thriller"),
    (10752, "War"),
    (37, "Western"),
];

const GENRE_ALIASES: &[(&str, &str)] = &[
    ("sci-fi", "Science Fiction"),
    ("scifi", "Science Fiction"),
    ("science-fiction", "Science Fiction"),
    ("animated", "Animation"),
    ("romantic", "Romance"),
    ("comedies", "Comedy"),
    ("docs", "Documentary"),
    ("documentaries", "Documentary"),
    ("kids", "Family"),
];

const MOOD_GENRES: &[(&str, &[&str])] = &[
    ("laugh", &["Comedy", "Family"]),
    ("touching", &["Drama", "Romance"]),
    ("adrenaline", &["Action", "Thriller", "Adventure"]),
    ("relax", &["Documentary", "Animation", "Family"]),
    ("scared", &["Horror", "Thriller"]),
    ("think", &["Mystery", "Science Fiction", "Documentary"]),
];

pub fn genre_name(id: u32) -> Option<&'static str> {
    GENRES
        .iter()
        .find(|(genre_id, _)| *genre_id == id)
        .map(|(_, name)| *name)
}

pub fn genre_id(name: &str) -> Option<u32> {
    let canonical = canonical_genre(name);
    GENRES
        .iter()
        .find(|(_, genre)| genre.eq_ignore_ascii_case(&canonical))
        .map(|(id, _)| *id)
}

/// Known genres map to their catalog spelling; anything else is kept as typed
pub fn canonical_genre(name: &str) -> String {
    let trimmed = name.trim();

    if let Some((_, genre)) = GENRES.iter().find(|(_, g)| g.eq_ignore_ascii_case(trimmed)) {
        return genre.to_string();
    }
    if let Some((_, genre)) = GENRE_ALIASES
        .iter()
        .find(|(alias, _)| alias.eq_ignore_ascii_case(trimmed))
    {
        return genre.to_string();
    }

    trimmed.to_string()
}

/// Genre names for a candidate's ids, skipping ids outside the table
pub fn genre_names(ids: &[u32]) -> Vec<&'static str> {
    ids.iter().filter_map(|id| genre_name(*id)).collect()
}

/// The mood keyword an answer refers to. Free-text moods such as
/// "I want to laugh" match on the contained keyword.
pub fn mood_key(mood: &str) -> Option<&'static str> {
    mood_entry(mood).map(|(key, _)| key)
}

/// Genres associated with a mood answer
pub fn mood_genres(mood: &str) -> &'static [&'static str] {
    mood_entry(mood).map(|(_, genres)| genres).unwrap_or(&[])
}

fn mood_entry(mood: &str) -> Option<(&'static str, &'static [&'static str])> {
    let mood = mood.trim().to_lowercase();
    MOOD_GENRES
        .iter()
        .find(|(key, _)| mood.contains(key))
        .map(|(key, genres)| (*key, *genres))
}
