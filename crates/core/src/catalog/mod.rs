//! Movie catalog access.

/// REST client for The Movie Database.
pub mod tmdb;

use async_trait::async_trait;

use crate::{
    error::CatalogUnavailable,
    models::{CastMember, Genre, GenreId, MovieDetails, MovieId, MoviePage},
};

pub use tmdb::TmdbClient;

/// Default poster size used by list and detail views.
pub const DEFAULT_IMAGE_SIZE: &str = "w500";

/// Read-only movie catalog.
///
/// Every operation fails with [`CatalogUnavailable`]; callers decide how to
/// degrade (usually an empty list plus an inline message).
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Popular movies.
    async fn popular(&self, page: u32) -> Result<MoviePage, CatalogUnavailable>;
    /// Movies currently in theatres.
    async fn now_playing(&self, page: u32) -> Result<MoviePage, CatalogUnavailable>;
    /// Upcoming releases.
    async fn upcoming(&self, page: u32) -> Result<MoviePage, CatalogUnavailable>;
    /// Best rated movies.
    async fn top_rated(&self, page: u32) -> Result<MoviePage, CatalogUnavailable>;
    /// Movies tagged with a genre.
    async fn by_genre(&self, genre: GenreId, page: u32) -> Result<MoviePage, CatalogUnavailable>;
    /// Movies rated at least `min_rating`, best first.
    async fn by_rating(&self, min_rating: f64, page: u32)
        -> Result<MoviePage, CatalogUnavailable>;
    /// Server-side genre and rating discovery; either filter may be absent.
    async fn by_genre_and_rating(
        &self,
        genre: Option<GenreId>,
        min_rating: Option<f64>,
        page: u32,
    ) -> Result<MoviePage, CatalogUnavailable>;
    /// Title search. A blank query yields an empty page without a request.
    async fn search(&self, query: &str, page: u32) -> Result<MoviePage, CatalogUnavailable>;
    /// Full details of one movie.
    async fn details(&self, id: MovieId) -> Result<MovieDetails, CatalogUnavailable>;
    /// Cast of one movie.
    async fn credits(&self, id: MovieId) -> Result<Vec<CastMember>, CatalogUnavailable>;
    /// Genre reference table.
    async fn genres(&self) -> Result<Vec<Genre>, CatalogUnavailable>;
}

/// Join an image path onto the CDN base. Absent or blank paths yield `""`.
pub fn image_url(base: &str, path: Option<&str>, size: &str) -> String {
    match path.map(str::trim) {
        Some(path) if !path.is_empty() => {
            let base = base.trim_end_matches('/');
            let path = path.trim_start_matches('/');
            format!("{base}/{size}/{path}")
        }
        _ => String::new(),
    }
}
