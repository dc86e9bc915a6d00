//! List screens: which feed to fetch, and what is currently visible.

#![allow(missing_docs)]

use rand::Rng;
use tracing::{debug, error};

use crate::{
    catalog::Catalog,
    error::CatalogUnavailable,
    filter::{evaluate, FilterSpec},
    models::{GenreId, Movie, MoviePage},
};

/// Highest page the catalog serves for the shuffled feed.
pub const MAX_SHUFFLE_PAGE: u32 = 500;

/// A list source together with the requested page.
#[derive(Debug, Clone, PartialEq)]
pub enum ListQuery {
    Popular { page: u32 },
    NowPlaying { page: u32 },
    Upcoming { page: u32 },
    TopRated { page: u32 },
    ByGenre { genre: GenreId, page: u32 },
    ByRating { min_rating: f64, page: u32 },
    ByGenreAndRating {
        genre: Option<GenreId>,
        min_rating: Option<f64>,
        page: u32,
    },
    Search { query: String, page: u32 },
}

impl ListQuery {
    /// Popular feed on a random page.
    pub fn shuffled() -> Self {
        ListQuery::Popular {
            page: random_popular_page(),
        }
    }

    /// Requested page.
    pub fn page(&self) -> u32 {
        match self {
            ListQuery::Popular { page }
            | ListQuery::NowPlaying { page }
            | ListQuery::Upcoming { page }
            | ListQuery::TopRated { page }
            | ListQuery::ByGenre { page, .. }
            | ListQuery::ByRating { page, .. }
            | ListQuery::ByGenreAndRating { page, .. }
            | ListQuery::Search { page, .. } => *page,
        }
    }

    /// Run the query against `catalog`.
    pub async fn fetch(&self, catalog: &dyn Catalog) -> Result<MoviePage, CatalogUnavailable> {
        match self {
            ListQuery::Popular { page } => catalog.popular(*page).await,
            ListQuery::NowPlaying { page } => catalog.now_playing(*page).await,
            ListQuery::Upcoming { page } => catalog.upcoming(*page).await,
            ListQuery::TopRated { page } => catalog.top_rated(*page).await,
            ListQuery::ByGenre { genre, page } => catalog.by_genre(*genre, *page).await,
            ListQuery::ByRating { min_rating, page } => catalog.by_rating(*min_rating, *page).await,
            ListQuery::ByGenreAndRating {
                genre,
                min_rating,
                page,
            } => {
                catalog
                    .by_genre_and_rating(*genre, *min_rating, *page)
                    .await
            }
            ListQuery::Search { query, page } => catalog.search(query, *page).await,
        }
    }
}

/// Page for the shuffled home feed, uniformly in `1..=MAX_SHUFFLE_PAGE`.
pub fn random_popular_page() -> u32 {
    rand::thread_rng().gen_range(1..=MAX_SHUFFLE_PAGE)
}

/// Handle for one in-flight fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

/// What [`Browser::complete`] did with a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The response replaced the visible list.
    Applied,
    /// A newer request was started; the response was dropped.
    Stale,
}

/// State behind one list screen.
#[derive(Debug, Default)]
pub struct Browser {
    query: Option<ListQuery>,
    page: MoviePage,
    filter: FilterSpec,
    visible: Vec<Movie>,
    message: Option<String>,
    generation: u64,
}

impl Browser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a request; any ticket handed out earlier becomes stale.
    pub fn begin(&mut self, query: ListQuery) -> Ticket {
        self.generation += 1;
        debug!(?query, generation = self.generation, "list request started");
        self.query = Some(query);
        Ticket(self.generation)
    }

    /// Apply a response if `ticket` is still the newest request.
    ///
    /// An unavailable catalog empties the list and sets an inline message.
    pub fn complete(
        &mut self,
        ticket: Ticket,
        result: Result<MoviePage, CatalogUnavailable>,
    ) -> Outcome {
        if ticket.0 != self.generation {
            debug!(
                ticket = ticket.0,
                generation = self.generation,
                "discarding stale list response"
            );
            return Outcome::Stale;
        }
        match result {
            Ok(page) => {
                self.page = page;
                self.message = None;
            }
            Err(err) => {
                error!(%err, query = ?self.query, "catalog request failed");
                self.page = MoviePage::empty();
                self.message = Some(err.to_string());
            }
        }
        self.refresh();
        Outcome::Applied
    }

    /// Fetch `query` and apply the response.
    pub async fn load(&mut self, catalog: &dyn Catalog, query: ListQuery) -> Outcome {
        let ticket = self.begin(query.clone());
        let result = query.fetch(catalog).await;
        self.complete(ticket, result)
    }

    /// Replace the local filter and recompute the visible list.
    pub fn set_filter(&mut self, filter: FilterSpec) {
        self.filter = filter;
        self.refresh();
    }

    fn refresh(&mut self) {
        self.visible = evaluate(&self.page.results, &self.filter);
    }

    /// Movies passing the active filter, in catalog order.
    pub fn visible(&self) -> &[Movie] {
        &self.visible
    }

    /// Last page received, before filtering.
    pub fn page(&self) -> &MoviePage {
        &self.page
    }

    pub fn filter(&self) -> &FilterSpec {
        &self.filter
    }

    pub fn query(&self) -> Option<&ListQuery> {
        self.query.as_ref()
    }

    /// Inline error shown in place of the list.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{movie, FakeCatalog};

    fn catalog() -> FakeCatalog {
        FakeCatalog::new(vec![
            movie(603, "The Matrix", &[28, 878], 8.2),
            movie(604, "The Matrix Reloaded", &[28, 878], 7.0),
            movie(13, "Forrest Gump", &[18], 8.8),
        ])
    }

    fn page_of(movies: Vec<Movie>) -> MoviePage {
        MoviePage {
            page: 1,
            total_pages: 1,
            total_results: movies.len() as u32,
            results: movies,
        }
    }

    #[tokio::test]
    async fn load_shows_the_page() {
        let catalog = catalog();
        let mut browser = Browser::new();

        let outcome = browser.load(&catalog, ListQuery::Popular { page: 1 }).await;
        assert_eq!(outcome, Outcome::Applied);
        assert_eq!(browser.visible().len(), 3);
        assert!(browser.message().is_none());
    }

    #[tokio::test]
    async fn filter_applies_locally() {
        let catalog = catalog();
        let mut browser = Browser::new();
        browser.load(&catalog, ListQuery::Popular { page: 1 }).await;
        let requests = catalog.request_count();

        browser.set_filter(FilterSpec::new().with_title("matrix").with_min_rating(7.5));
        let titles: Vec<_> = browser.visible().iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["The Matrix"]);
        assert_eq!(browser.page().results.len(), 3);
        assert_eq!(catalog.request_count(), requests);

        browser.set_filter(FilterSpec::new());
        assert_eq!(browser.visible().len(), 3);
    }

    #[tokio::test]
    async fn unavailable_catalog_yields_empty_list_and_message() {
        let catalog = catalog();
        catalog.set_offline(true);
        let mut browser = Browser::new();

        let outcome = browser.load(&catalog, ListQuery::TopRated { page: 1 }).await;
        assert_eq!(outcome, Outcome::Applied);
        assert!(browser.visible().is_empty());
        assert!(browser.message().is_some_and(|m| m.contains("simulated outage")));
    }

    #[test]
    fn stale_responses_are_discarded() {
        let mut browser = Browser::new();
        let first = browser.begin(ListQuery::Search {
            query: "mat".into(),
            page: 1,
        });
        let second = browser.begin(ListQuery::Search {
            query: "matrix".into(),
            page: 1,
        });

        let newer = page_of(vec![movie(603, "The Matrix", &[28], 8.2)]);
        assert_eq!(browser.complete(second, Ok(newer)), Outcome::Applied);

        let older = page_of(vec![movie(1, "Matador", &[18], 6.0)]);
        assert_eq!(browser.complete(first, Ok(older)), Outcome::Stale);
        assert_eq!(browser.visible()[0].id.0, 603);
    }

    #[tokio::test]
    async fn blank_search_makes_no_request() {
        let catalog = catalog();
        let mut browser = Browser::new();
        browser
            .load(
                &catalog,
                ListQuery::Search {
                    query: "   ".into(),
                    page: 1,
                },
            )
            .await;
        assert!(browser.visible().is_empty());
        assert_eq!(catalog.request_count(), 0);
    }

    #[test]
    fn shuffled_page_is_in_range() {
        for _ in 0..200 {
            let page = random_popular_page();
            assert!((1..=MAX_SHUFFLE_PAGE).contains(&page));
        }
        assert!(matches!(ListQuery::shuffled(), ListQuery::Popular { .. }));
    }
}
