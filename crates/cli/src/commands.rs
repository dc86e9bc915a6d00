use std::{path::Path, time::Duration};

use anyhow::{anyhow, bail, Context, Result};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{error, info};

use reelmark_core::{
    catalog::{image_url, DEFAULT_IMAGE_SIZE},
    config::{self, AppConfig},
    models::CastMember,
    AppContext, Browser, CatalogUnavailable, FavoritesEvent, GenreId, ListQuery, Movie,
    MovieDetails, MovieId, Notice,
};

use crate::{Credentials, FavoritesAction, FilterArgs, ListArgs};

const SYNC_TIMEOUT: Duration = Duration::from_secs(30);

/// Renders results as text or JSON.
pub struct Output {
    json: bool,
    image_base_url: String,
}

impl Output {
    pub fn new(json: bool, config: &AppConfig) -> Self {
        Self {
            json,
            image_base_url: config.tmdb.image_base_url.clone(),
        }
    }

    fn json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    fn movies(&self, movies: &[Movie]) -> Result<()> {
        if self.json {
            return self.json(movies);
        }
        if movies.is_empty() {
            println!("No movies found.");
        }
        for movie in movies {
            println!("{}", movie_line(movie));
        }
        Ok(())
    }

    fn details(&self, details: &MovieDetails, cast: &[CastMember]) -> Result<()> {
        let poster_url = image_url(
            &self.image_base_url,
            details.movie.poster_path.as_deref(),
            DEFAULT_IMAGE_SIZE,
        );
        if self.json {
            return self.json(&DetailsView {
                details,
                cast,
                poster_url,
            });
        }

        let movie = &details.movie;
        println!("{}", movie.display_name());
        if !details.tagline.is_empty() {
            println!("\"{}\"", details.tagline);
        }
        println!(
            "Rating {:.1} | {} min | {}",
            movie.vote_average, details.runtime, details.status
        );
        println!("Genres: {}", details.genre_names());
        if !poster_url.is_empty() {
            println!("Poster: {poster_url}");
        }
        if !movie.overview.is_empty() {
            println!("\n{}", movie.overview);
        }
        if !cast.is_empty() {
            println!("\nCast:");
            for member in cast {
                println!("  {} as {}", member.name, member.character);
            }
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct DetailsView<'a> {
    #[serde(flatten)]
    details: &'a MovieDetails,
    cast: &'a [CastMember],
    poster_url: String,
}

fn movie_line(movie: &Movie) -> String {
    format!(
        "{:>8}  {:>4.1}  {}",
        movie.id.0,
        movie.vote_average,
        movie.display_name()
    )
}

/// Replace an unavailable catalog result with an empty list and report why.
fn or_empty<T>(result: Result<Vec<T>, CatalogUnavailable>) -> Vec<T> {
    result.unwrap_or_else(|err| {
        error!(%err, "catalog request failed");
        eprintln!("{err}");
        Vec::new()
    })
}

fn notice_error(notice: Notice) -> anyhow::Error {
    anyhow!("{notice}")
}

async fn show_list(
    ctx: &AppContext,
    out: &Output,
    query: ListQuery,
    filter: &FilterArgs,
) -> Result<()> {
    let mut browser = Browser::new();
    browser.set_filter(filter.spec());
    browser.load(ctx.catalog(), query).await;
    if let Some(message) = browser.message() {
        eprintln!("{message}");
    }
    out.movies(browser.visible())
}

pub async fn popular(ctx: &AppContext, out: &Output, list: &ListArgs) -> Result<()> {
    show_list(ctx, out, ListQuery::Popular { page: list.page }, &list.filter).await
}

pub async fn now_playing(ctx: &AppContext, out: &Output, list: &ListArgs) -> Result<()> {
    show_list(ctx, out, ListQuery::NowPlaying { page: list.page }, &list.filter).await
}

pub async fn upcoming(ctx: &AppContext, out: &Output, list: &ListArgs) -> Result<()> {
    show_list(ctx, out, ListQuery::Upcoming { page: list.page }, &list.filter).await
}

pub async fn top_rated(ctx: &AppContext, out: &Output, list: &ListArgs) -> Result<()> {
    show_list(ctx, out, ListQuery::TopRated { page: list.page }, &list.filter).await
}

pub async fn shuffle(ctx: &AppContext, out: &Output, filter: &FilterArgs) -> Result<()> {
    let query = ListQuery::shuffled();
    info!(page = query.page(), "shuffled popular page");
    show_list(ctx, out, query, filter).await
}

pub async fn genre(ctx: &AppContext, out: &Output, genre: GenreId, list: &ListArgs) -> Result<()> {
    let query = ListQuery::ByGenre {
        genre,
        page: list.page,
    };
    show_list(ctx, out, query, &list.filter).await
}

pub async fn rating(ctx: &AppContext, out: &Output, min: f64, list: &ListArgs) -> Result<()> {
    let query = ListQuery::ByRating {
        min_rating: min,
        page: list.page,
    };
    show_list(ctx, out, query, &list.filter).await
}

pub async fn search(ctx: &AppContext, out: &Output, query: String, list: &ListArgs) -> Result<()> {
    let query = ListQuery::Search {
        query,
        page: list.page,
    };
    show_list(ctx, out, query, &list.filter).await
}

pub async fn details(ctx: &AppContext, out: &Output, id: u64) -> Result<()> {
    let id = MovieId(id);
    let (details, cast) = tokio::join!(ctx.catalog().details(id), ctx.catalog().credits(id));
    let details = details.with_context(|| format!("looking up movie {id}"))?;
    out.details(&details, &or_empty(cast))
}

pub async fn genres(ctx: &AppContext, out: &Output) -> Result<()> {
    let genres = or_empty(ctx.catalog().genres().await);
    if out.json {
        return out.json(&genres);
    }
    for genre in genres {
        println!("{:>6}  {}", genre.id.0, genre.name);
    }
    Ok(())
}

pub async fn register(ctx: &AppContext, credentials: &Credentials) -> Result<()> {
    let user = ctx
        .sign_up(&credentials.email, &credentials.password)
        .await
        .map_err(notice_error)?;
    info!(user_id = %user.id, "registered");
    println!("{}", Notice::registered());
    Ok(())
}

pub async fn delete_account(ctx: &AppContext, credentials: &Credentials) -> Result<()> {
    ctx.sign_in(&credentials.email, &credentials.password)
        .await
        .map_err(notice_error)?;
    let notice = ctx.delete_account().await.map_err(notice_error)?;
    println!("{notice}");
    Ok(())
}

pub async fn favorites(ctx: AppContext, out: &Output, action: FavoritesAction) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let ctx = ctx.with_favorite_events(tx);

    let credentials = match &action {
        FavoritesAction::List(credentials)
        | FavoritesAction::Add { credentials, .. }
        | FavoritesAction::Remove { credentials, .. } => credentials,
    };
    ctx.sign_in(&credentials.email, &credentials.password)
        .await
        .map_err(notice_error)?;

    match action {
        FavoritesAction::List(_) => {}
        FavoritesAction::Add { id, .. } => {
            let details = ctx
                .catalog()
                .details(MovieId(id))
                .await
                .with_context(|| format!("looking up movie {id}"))?;
            if !ctx.favorites().add_favorite(details.summary()) {
                eprintln!("{} is already a favorite.", details.movie.display_name());
            }
            wait_for_sync(&mut rx).await?;
        }
        FavoritesAction::Remove { id, .. } => {
            if !ctx.favorites().remove_favorite(MovieId(id)) {
                eprintln!("Movie {id} is not a favorite.");
            }
            wait_for_sync(&mut rx).await?;
        }
    }

    out.movies(&ctx.favorites().list())
}

async fn wait_for_sync(rx: &mut mpsc::UnboundedReceiver<FavoritesEvent>) -> Result<()> {
    loop {
        let event = tokio::time::timeout(SYNC_TIMEOUT, rx.recv())
            .await
            .context("timed out waiting for favorites sync")?
            .context("favorites sync channel closed")?;
        match event {
            FavoritesEvent::Synced { movie_id, op } => {
                info!(%movie_id, ?op, "favorites synced");
                return Ok(());
            }
            FavoritesEvent::Skipped { .. } => continue,
            FavoritesEvent::Failed { error, .. } => bail!(error),
        }
    }
}

pub fn init_config(path: Option<&Path>) -> Result<()> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => config::config_path()?,
    };
    if config::write_default_config(&path)? {
        println!("Wrote default configuration to {}", path.display());
    } else {
        println!("Configuration already exists at {}", path.display());
    }
    Ok(())
}
