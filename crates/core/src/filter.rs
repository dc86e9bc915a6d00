//! Local search and filter evaluation over an already-fetched movie list.

use serde::{Deserialize, Serialize};

use crate::models::{GenreId, Movie, MovieDetails};

/// Combination of title, genre and rating predicates selected by the user.
///
/// An absent predicate matches everything for its dimension.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    /// Case-insensitive substring the title must contain.
    pub title_query: Option<String>,
    /// Genre the movie must belong to.
    pub genre_id: Option<GenreId>,
    /// Inclusive lower bound on the average rating.
    pub min_rating: Option<f64>,
}

impl FilterSpec {
    /// Filter with no predicates.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to titles containing `query`.
    pub fn with_title(mut self, query: impl Into<String>) -> Self {
        self.title_query = Some(query.into());
        self
    }

    /// Restrict to movies tagged with `genre`.
    pub fn with_genre(mut self, genre: GenreId) -> Self {
        self.genre_id = Some(genre);
        self
    }

    /// Restrict to movies rated at least `rating`.
    pub fn with_min_rating(mut self, rating: f64) -> Self {
        self.min_rating = Some(rating);
        self
    }

    /// Whether no predicate is active.
    pub fn is_empty(&self) -> bool {
        self.needle().is_none() && self.genre_id.is_none() && self.min_rating.is_none()
    }

    fn needle(&self) -> Option<String> {
        self.title_query
            .as_deref()
            .map(|query| query.trim().to_lowercase())
            .filter(|query| !query.is_empty())
    }

    /// Evaluate all predicates against a single record.
    pub fn matches<T: Filterable + ?Sized>(&self, item: &T) -> bool {
        self.matches_with(self.needle().as_deref(), item)
    }

    fn matches_with<T: Filterable + ?Sized>(&self, needle: Option<&str>, item: &T) -> bool {
        let title_ok = needle
            .map(|needle| item.title().to_lowercase().contains(needle))
            .unwrap_or(true);
        let genre_ok = self
            .genre_id
            .map(|genre| item.has_genre(genre))
            .unwrap_or(true);
        let rating_ok = self
            .min_rating
            .map(|min| item.vote_average() >= min)
            .unwrap_or(true);
        title_ok && genre_ok && rating_ok
    }
}

/// Records the evaluator can inspect.
pub trait Filterable {
    /// Title used by the text predicate.
    fn title(&self) -> &str;
    /// Genre membership used by the genre predicate.
    fn has_genre(&self, genre: GenreId) -> bool;
    /// Average rating used by the rating predicate.
    fn vote_average(&self) -> f64;
}

impl Filterable for Movie {
    fn title(&self) -> &str {
        &self.title
    }

    fn has_genre(&self, genre: GenreId) -> bool {
        self.genre_ids.contains(&genre)
    }

    fn vote_average(&self) -> f64 {
        self.vote_average
    }
}

impl Filterable for MovieDetails {
    fn title(&self) -> &str {
        &self.movie.title
    }

    fn has_genre(&self, genre: GenreId) -> bool {
        self.genres.iter().any(|entry| entry.id == genre) || self.movie.genre_ids.contains(&genre)
    }

    fn vote_average(&self) -> f64 {
        self.movie.vote_average
    }
}

/// Return the matching subset of `items`, preserving input order.
pub fn evaluate<T: Filterable + Clone>(items: &[T], spec: &FilterSpec) -> Vec<T> {
    let needle = spec.needle();
    items
        .iter()
        .filter(|item| spec.matches_with(needle.as_deref(), *item))
        .cloned()
        .collect()
}
