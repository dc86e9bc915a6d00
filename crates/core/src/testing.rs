//! In-memory collaborators for unit tests.

use std::{
    collections::{BTreeSet, HashMap},
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::{
    catalog::Catalog,
    error::{AuthError, CatalogUnavailable, StoreError},
    favorites::FavoritesStore,
    identity::{AuthListener, IdentityProvider, User},
    models::{CastMember, Genre, GenreId, Movie, MovieDetails, MovieId, MoviePage, UserId},
};

pub fn movie(id: u64, title: &str, genres: &[u32], rating: f64) -> Movie {
    Movie {
        id: MovieId(id),
        title: title.to_string(),
        overview: String::new(),
        release_date: None,
        poster_path: None,
        backdrop_path: None,
        genre_ids: genres.iter().copied().map(GenreId).collect(),
        vote_average: rating,
    }
}

pub fn details(movie: Movie) -> MovieDetails {
    MovieDetails {
        genres: movie
            .genre_ids
            .iter()
            .map(|id| Genre {
                id: *id,
                name: format!("genre-{id}"),
            })
            .collect(),
        movie,
        runtime: 120,
        status: "Released".to_string(),
        tagline: String::new(),
        homepage: String::new(),
    }
}

#[derive(Default)]
pub struct MemoryStore {
    docs: Mutex<HashMap<UserId, BTreeSet<MovieId>>>,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
    read_delay: Mutex<Option<Duration>>,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Answer reads with the ids as they were when the read started,
    /// after `delay`.
    pub fn slow_reads(&self, delay: Duration) {
        *self.read_delay.lock() = Some(delay);
    }

    pub fn seed(&self, user: &str, ids: &[u64]) {
        self.docs
            .lock()
            .insert(UserId::new(user), ids.iter().copied().map(MovieId).collect());
    }

    pub fn ids(&self, user: &UserId) -> Vec<MovieId> {
        self.docs
            .lock()
            .get(user)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn write(&self, movie_id: MovieId, apply: impl FnOnce()) -> Result<(), StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::WriteFailed {
                movie_id,
                reason: "simulated outage".to_string(),
            });
        }
        apply();
        Ok(())
    }
}

#[async_trait]
impl FavoritesStore for MemoryStore {
    async fn merge_add_id(&self, user: &User, movie_id: MovieId) -> Result<(), StoreError> {
        self.write(movie_id, || {
            self.docs
                .lock()
                .entry(user.id.clone())
                .or_default()
                .insert(movie_id);
        })
    }

    async fn merge_remove_id(&self, user: &User, movie_id: MovieId) -> Result<(), StoreError> {
        self.write(movie_id, || {
            if let Some(ids) = self.docs.lock().get_mut(&user.id) {
                ids.remove(&movie_id);
            }
        })
    }

    async fn load_ids(&self, user: &User) -> Result<Vec<MovieId>, StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::ReadFailed("simulated outage".to_string()));
        }
        let ids = self.ids(&user.id);
        let delay = *self.read_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(ids)
    }
}

#[derive(Default)]
pub struct FakeCatalog {
    movies: Vec<MovieDetails>,
    offline: AtomicBool,
    requests: AtomicUsize,
}

impl FakeCatalog {
    pub fn new(movies: Vec<Movie>) -> Self {
        Self {
            movies: movies.into_iter().map(details).collect(),
            ..Self::default()
        }
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    fn request(&self) -> Result<(), CatalogUnavailable> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(CatalogUnavailable::new("simulated outage"));
        }
        Ok(())
    }

    fn page_of(&self, page: u32, keep: impl Fn(&Movie) -> bool) -> MoviePage {
        let results: Vec<Movie> = self
            .movies
            .iter()
            .map(|details| details.movie.clone())
            .filter(|movie| keep(movie))
            .collect();
        MoviePage {
            page,
            total_pages: 1,
            total_results: results.len() as u32,
            results,
        }
    }
}

#[async_trait]
impl Catalog for FakeCatalog {
    async fn popular(&self, page: u32) -> Result<MoviePage, CatalogUnavailable> {
        self.request()?;
        Ok(self.page_of(page, |_| true))
    }

    async fn now_playing(&self, page: u32) -> Result<MoviePage, CatalogUnavailable> {
        self.popular(page).await
    }

    async fn upcoming(&self, page: u32) -> Result<MoviePage, CatalogUnavailable> {
        self.popular(page).await
    }

    async fn top_rated(&self, page: u32) -> Result<MoviePage, CatalogUnavailable> {
        self.request()?;
        let mut result = self.page_of(page, |_| true);
        result
            .results
            .sort_by(|a, b| b.vote_average.total_cmp(&a.vote_average));
        Ok(result)
    }

    async fn by_genre(&self, genre: GenreId, page: u32) -> Result<MoviePage, CatalogUnavailable> {
        self.by_genre_and_rating(Some(genre), None, page).await
    }

    async fn by_rating(
        &self,
        min_rating: f64,
        page: u32,
    ) -> Result<MoviePage, CatalogUnavailable> {
        self.by_genre_and_rating(None, Some(min_rating), page).await
    }

    async fn by_genre_and_rating(
        &self,
        genre: Option<GenreId>,
        min_rating: Option<f64>,
        page: u32,
    ) -> Result<MoviePage, CatalogUnavailable> {
        self.request()?;
        Ok(self.page_of(page, |movie| {
            genre.map(|g| movie.genre_ids.contains(&g)).unwrap_or(true)
                && min_rating.map(|min| movie.vote_average >= min).unwrap_or(true)
        }))
    }

    async fn search(&self, query: &str, page: u32) -> Result<MoviePage, CatalogUnavailable> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(MoviePage::empty());
        }
        self.request()?;
        Ok(self.page_of(page, |movie| movie.title.to_lowercase().contains(&needle)))
    }

    async fn details(&self, id: MovieId) -> Result<MovieDetails, CatalogUnavailable> {
        self.request()?;
        self.movies
            .iter()
            .find(|details| details.movie.id == id)
            .cloned()
            .ok_or_else(|| CatalogUnavailable::new(format!("movie {id} not found")))
    }

    async fn credits(&self, id: MovieId) -> Result<Vec<CastMember>, CatalogUnavailable> {
        self.details(id).await?;
        Ok(vec![CastMember {
            id: 1,
            name: "Keanu Reeves".to_string(),
            profile_path: None,
            character: "Neo".to_string(),
        }])
    }

    async fn genres(&self) -> Result<Vec<Genre>, CatalogUnavailable> {
        self.request()?;
        Ok(vec![Genre {
            id: GenreId(28),
            name: "Action".to_string(),
        }])
    }
}

#[derive(Default)]
pub struct FakeIdentity {
    current: Mutex<Option<User>>,
    listeners: Mutex<Vec<AuthListener>>,
    accounts: Mutex<HashMap<String, (String, User)>>,
    sign_out_error: Mutex<Option<AuthError>>,
}

impl FakeIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(self, email: &str, password: &str, user_id: &str) -> Self {
        self.accounts.lock().insert(
            email.to_string(),
            (password.to_string(), User::new(user_id, email)),
        );
        self
    }

    pub fn fail_sign_out(&self, error: AuthError) {
        *self.sign_out_error.lock() = Some(error);
    }

    fn set_current(&self, user: Option<User>) {
        *self.current.lock() = user.clone();
        self.listeners
            .lock()
            .retain(|listener| listener.send(user.clone()).is_ok());
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn sign_in(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let user = match self.accounts.lock().get(email) {
            Some((expected, user)) if expected == password => user.clone(),
            Some(_) => return Err(AuthError::InvalidCredentials),
            None => return Err(AuthError::UserNotFound),
        };
        self.set_current(Some(user.clone()));
        Ok(user)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let user = {
            let mut accounts = self.accounts.lock();
            if accounts.contains_key(email) {
                return Err(AuthError::EmailInUse);
            }
            let user = User::new(format!("uid-{}", accounts.len() + 1), email);
            accounts.insert(email.to_string(), (password.to_string(), user.clone()));
            user
        };
        self.set_current(Some(user.clone()));
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        if let Some(error) = self.sign_out_error.lock().clone() {
            return Err(error);
        }
        self.set_current(None);
        Ok(())
    }

    async fn delete_account(&self) -> Result<(), AuthError> {
        let user = self.current_user().ok_or(AuthError::UserNotFound)?;
        self.accounts.lock().remove(&user.email);
        self.set_current(None);
        Ok(())
    }

    fn current_user(&self) -> Option<User> {
        self.current.lock().clone()
    }

    fn on_auth_state_changed(&self, listener: AuthListener) {
        if listener.send(self.current_user()).is_ok() {
            self.listeners.lock().push(listener);
        }
    }
}
