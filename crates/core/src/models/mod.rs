//! Shared domain models mirrored from the movie catalog.

use std::{collections::BTreeSet, fmt};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Catalog identifier of a movie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovieId(pub u64);

impl fmt::Display for MovieId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Catalog identifier of a genre.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenreId(pub u32);

impl fmt::Display for GenreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable identifier issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Build an identifier from any string-like value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identifier is blank and therefore unusable as a document key.
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Genre reference entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    /// Genre identifier.
    pub id: GenreId,
    /// Display name, e.g. `Action`.
    pub name: String,
}

/// Summary record returned by every list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    /// Unique catalog identifier.
    pub id: MovieId,
    /// Localised title.
    #[serde(default)]
    pub title: String,
    /// Plot summary.
    #[serde(default)]
    pub overview: String,
    /// Raw release date as reported by the catalog (`YYYY-MM-DD`, possibly partial or empty).
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub release_date: Option<String>,
    /// Poster image path, relative to the image base URL.
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub poster_path: Option<String>,
    /// Backdrop image path, relative to the image base URL.
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub backdrop_path: Option<String>,
    /// Genres the movie belongs to.
    #[serde(default)]
    pub genre_ids: BTreeSet<GenreId>,
    /// Average user rating on a 0-10 scale.
    #[serde(default)]
    pub vote_average: f64,
}

impl Movie {
    /// Parsed release date when the catalog reported a full date.
    pub fn release_date(&self) -> Option<NaiveDate> {
        self.release_date
            .as_deref()
            .and_then(|raw| NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok())
    }

    /// Release year, tolerating partial dates such as `2024` or `2024-05`.
    pub fn release_year(&self) -> Option<i32> {
        let raw = self.release_date.as_deref()?.trim();
        raw.get(..4).and_then(|year| year.parse().ok())
    }

    /// Returns a user-facing label combining title and year.
    pub fn display_name(&self) -> String {
        match self.release_year() {
            Some(year) => format!("{} ({year})", self.title),
            None => self.title.clone(),
        }
    }
}

/// Full record fetched on demand for the details view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieDetails {
    /// Summary fields shared with list results.
    #[serde(flatten)]
    pub movie: Movie,
    /// Resolved genres.
    #[serde(default)]
    pub genres: Vec<Genre>,
    /// Runtime in minutes.
    #[serde(default, deserialize_with = "null_as_default")]
    pub runtime: u32,
    /// Release status, e.g. `Released`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
    /// Marketing tagline.
    #[serde(default, deserialize_with = "null_as_default")]
    pub tagline: String,
    /// Official homepage URL.
    #[serde(default, deserialize_with = "null_as_default")]
    pub homepage: String,
}

impl MovieDetails {
    /// Collapse the details into a list summary, filling `genre_ids` from resolved genres.
    pub fn summary(&self) -> Movie {
        let mut movie = self.movie.clone();
        movie
            .genre_ids
            .extend(self.genres.iter().map(|genre| genre.id));
        movie
    }

    /// Comma separated genre names for display.
    pub fn genre_names(&self) -> String {
        self.genres
            .iter()
            .map(|genre| genre.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Credited cast member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastMember {
    /// Person identifier.
    pub id: u64,
    /// Performer name.
    #[serde(default)]
    pub name: String,
    /// Profile image path.
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub profile_path: Option<String>,
    /// Character played.
    #[serde(default, deserialize_with = "null_as_default")]
    pub character: String,
}

/// One page of list results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoviePage {
    /// 1-based page number.
    #[serde(default = "first_page")]
    pub page: u32,
    /// Movies on this page in catalog order.
    #[serde(default)]
    pub results: Vec<Movie>,
    /// Total pages available for the query.
    #[serde(default)]
    pub total_pages: u32,
    /// Total results available for the query.
    #[serde(default)]
    pub total_results: u32,
}

impl MoviePage {
    /// Page with no results, used whenever a list cannot be produced.
    pub fn empty() -> Self {
        Self {
            page: 1,
            results: Vec::new(),
            total_pages: 0,
            total_results: 0,
        }
    }

    /// Whether the page holds no movies.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

impl Default for MoviePage {
    fn default() -> Self {
        Self::empty()
    }
}

fn first_page() -> u32 {
    1
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_list_entry_with_missing_fields() {
        let movie: Movie = serde_json::from_value(json!({
            "id": 1229244,
            "title": "The Seductress From Hell",
            "release_date": "",
            "poster_path": null,
            "genre_ids": [27, 53, 27],
            "vote_average": 0.0
        }))
        .expect("movie should parse");

        assert_eq!(movie.id, MovieId(1229244));
        assert!(movie.release_date.is_none());
        assert!(movie.poster_path.is_none());
        assert_eq!(movie.genre_ids.len(), 2);
        assert_eq!(movie.display_name(), "The Seductress From Hell");
    }

    #[test]
    fn release_year_tolerates_partial_dates() {
        let mut movie: Movie = serde_json::from_value(json!({"id": 1, "title": "Heat"}))
            .expect("movie should parse");
        movie.release_date = Some("1995".to_string());
        assert_eq!(movie.release_year(), Some(1995));
        assert!(movie.release_date().is_none());

        movie.release_date = Some("1995-12-15".to_string());
        assert_eq!(
            movie.release_date(),
            NaiveDate::from_ymd_opt(1995, 12, 15)
        );
        assert_eq!(movie.display_name(), "Heat (1995)");
    }

    #[test]
    fn details_summary_resolves_genres() {
        let details: MovieDetails = serde_json::from_value(json!({
            "id": 603,
            "title": "The Matrix",
            "overview": "",
            "release_date": "1999-03-30",
            "poster_path": "/f89U3ADr1oiB1s9GkdPOEpXUk5H.jpg",
            "vote_average": 8.2,
            "genres": [{"id": 28, "name": "Action"}, {"id": 878, "name": "Science Fiction"}],
            "runtime": 136,
            "status": "Released",
            "tagline": null,
            "homepage": ""
        }))
        .expect("details should parse");

        assert_eq!(details.runtime, 136);
        assert_eq!(details.tagline, "");
        assert_eq!(details.genre_names(), "Action, Science Fiction");
        let summary = details.summary();
        assert!(summary.genre_ids.contains(&GenreId(28)));
        assert!(summary.genre_ids.contains(&GenreId(878)));
    }
}
