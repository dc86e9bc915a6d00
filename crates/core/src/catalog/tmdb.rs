use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize};
use tracing::debug;

use super::{image_url, Catalog};
use crate::{
    config::TmdbConfig,
    error::CatalogUnavailable,
    models::{CastMember, Genre, GenreId, MovieDetails, MovieId, MoviePage},
};

type Params = Vec<(&'static str, String)>;

#[derive(Debug, Deserialize)]
struct StatusBody {
    status_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenreList {
    #[serde(default)]
    genres: Vec<Genre>,
}

#[derive(Debug, Deserialize)]
struct Credits {
    #[serde(default)]
    cast: Vec<CastMember>,
}

/// Catalog backed by the TMDb v3 REST API.
#[derive(Debug, Clone)]
pub struct TmdbClient {
    http: Client,
    api_key: String,
    base_url: String,
    image_base_url: String,
}

impl TmdbClient {
    /// Build a client from configuration.
    pub fn new(config: &TmdbConfig) -> Result<Self, CatalogUnavailable> {
        let http = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            image_base_url: config.image_base_url.clone(),
        })
    }

    /// Resolve an image path at the given size (e.g. `w500`).
    pub fn image_url(&self, path: Option<&str>, size: &str) -> String {
        image_url(&self.image_base_url, path, size)
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: Params,
    ) -> Result<T, CatalogUnavailable> {
        if self.api_key.trim().is_empty() {
            return Err(CatalogUnavailable::new("no TMDb API key configured"));
        }

        let url = format!("{}{}", self.base_url, endpoint);
        debug!(%endpoint, "catalog request");
        let response = self
            .http
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<StatusBody>()
                .await
                .ok()
                .and_then(|body| body.status_message)
                .unwrap_or_else(|| status.to_string());
            return Err(CatalogUnavailable::new(format!(
                "TMDb API request failed: {message}"
            )));
        }

        response.json::<T>().await.map_err(|err| {
            CatalogUnavailable::new(format!("failed to decode TMDb response: {err}"))
        })
    }

    async fn list(&self, endpoint: &str, page: u32) -> Result<MoviePage, CatalogUnavailable> {
        self.fetch(endpoint, page_params(page)).await
    }
}

#[async_trait]
impl Catalog for TmdbClient {
    async fn popular(&self, page: u32) -> Result<MoviePage, CatalogUnavailable> {
        self.list("/movie/popular", page).await
    }

    async fn now_playing(&self, page: u32) -> Result<MoviePage, CatalogUnavailable> {
        self.list("/movie/now_playing", page).await
    }

    async fn upcoming(&self, page: u32) -> Result<MoviePage, CatalogUnavailable> {
        self.list("/movie/upcoming", page).await
    }

    async fn top_rated(&self, page: u32) -> Result<MoviePage, CatalogUnavailable> {
        self.list("/movie/top_rated", page).await
    }

    async fn by_genre(&self, genre: GenreId, page: u32) -> Result<MoviePage, CatalogUnavailable> {
        self.fetch("/discover/movie", discover_params(Some(genre), None, page))
            .await
    }

    async fn by_rating(
        &self,
        min_rating: f64,
        page: u32,
    ) -> Result<MoviePage, CatalogUnavailable> {
        self.fetch("/discover/movie", discover_params(None, Some(min_rating), page))
            .await
    }

    async fn by_genre_and_rating(
        &self,
        genre: Option<GenreId>,
        min_rating: Option<f64>,
        page: u32,
    ) -> Result<MoviePage, CatalogUnavailable> {
        self.fetch("/discover/movie", discover_params(genre, min_rating, page))
            .await
    }

    async fn search(&self, query: &str, page: u32) -> Result<MoviePage, CatalogUnavailable> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(MoviePage::empty());
        }
        let mut params = page_params(page);
        params.push(("query", query.to_string()));
        self.fetch("/search/movie", params).await
    }

    async fn details(&self, id: MovieId) -> Result<MovieDetails, CatalogUnavailable> {
        self.fetch(&format!("/movie/{id}"), Vec::new()).await
    }

    async fn credits(&self, id: MovieId) -> Result<Vec<CastMember>, CatalogUnavailable> {
        let credits: Credits = self.fetch(&format!("/movie/{id}/credits"), Vec::new()).await?;
        Ok(credits.cast)
    }

    async fn genres(&self) -> Result<Vec<Genre>, CatalogUnavailable> {
        let list: GenreList = self.fetch("/genre/movie/list", Vec::new()).await?;
        Ok(list.genres)
    }
}

fn page_params(page: u32) -> Params {
    vec![("page", page.max(1).to_string())]
}

fn discover_params(genre: Option<GenreId>, min_rating: Option<f64>, page: u32) -> Params {
    let mut params = page_params(page);
    if let Some(genre) = genre {
        params.push(("with_genres", genre.to_string()));
    }
    if let Some(min_rating) = min_rating {
        params.push(("vote_average.gte", min_rating.to_string()));
        params.push(("sort_by", "vote_average.desc".to_string()));
    }
    params
}
