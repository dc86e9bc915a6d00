mod commands;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
    sync::Mutex,
};

use reelmark_core::{
    config::{self, AppConfig},
    AppContext, FilterSpec, GenreId,
};
use tracing_subscriber::{prelude::*, EnvFilter};

/// Browse movies and keep a synced favorites list.
#[derive(Debug, Parser)]
#[command(name = "reelmark", version, about)]
struct Cli {
    /// Configuration file to use instead of the default location.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Popular movies.
    Popular(ListArgs),
    /// Movies currently in theatres.
    NowPlaying(ListArgs),
    /// Upcoming releases.
    Upcoming(ListArgs),
    /// Best rated movies.
    TopRated(ListArgs),
    /// Popular movies from a random page.
    Shuffle(FilterArgs),
    /// Movies in a genre.
    Genre {
        #[arg(value_name = "GENRE_ID")]
        genre_id: u32,
        #[command(flatten)]
        list: ListArgs,
    },
    /// Movies rated at least MIN.
    Rating {
        min: f64,
        #[command(flatten)]
        list: ListArgs,
    },
    /// Search by title.
    Search {
        query: String,
        #[command(flatten)]
        list: ListArgs,
    },
    /// Details and cast of one movie.
    Details { id: u64 },
    /// Genre reference table.
    Genres,
    /// Create an account.
    Register(Credentials),
    /// Show or edit the favorites of an account.
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },
    /// Delete an account.
    DeleteAccount(Credentials),
    /// Write the default configuration file if none exists.
    InitConfig,
}

#[derive(Debug, Subcommand)]
pub(crate) enum FavoritesAction {
    /// List favorites.
    List(Credentials),
    /// Add a movie to the favorites.
    Add {
        id: u64,
        #[command(flatten)]
        credentials: Credentials,
    },
    /// Remove a movie from the favorites.
    Remove {
        id: u64,
        #[command(flatten)]
        credentials: Credentials,
    },
}

#[derive(Debug, Args)]
pub(crate) struct Credentials {
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub password: String,
}

#[derive(Debug, Args)]
pub(crate) struct ListArgs {
    #[arg(long, default_value_t = 1)]
    pub page: u32,
    #[command(flatten)]
    pub filter: FilterArgs,
}

/// Local filters applied to the fetched page.
#[derive(Debug, Args)]
pub(crate) struct FilterArgs {
    /// Keep titles containing this text.
    #[arg(long)]
    pub title: Option<String>,
    /// Keep movies tagged with this genre id.
    #[arg(long)]
    pub genre: Option<u32>,
    /// Keep movies rated at least this.
    #[arg(long)]
    pub min_rating: Option<f64>,
}

impl FilterArgs {
    pub fn spec(&self) -> FilterSpec {
        FilterSpec {
            title_query: self.title.clone(),
            genre_id: self.genre.map(GenreId),
            min_rating: self.min_rating,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Command::InitConfig = cli.command {
        init_logging(None)?;
        return commands::init_config(cli.config.as_deref());
    }

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => {
            config::ensure_default_config()?;
            AppConfig::load()?
        }
    };
    init_logging(config.log_dir.as_deref())?;

    let ctx = AppContext::from_config(&config)?;
    let out = commands::Output::new(cli.json, &config);
    match cli.command {
        Command::Popular(list) => commands::popular(&ctx, &out, &list).await,
        Command::NowPlaying(list) => commands::now_playing(&ctx, &out, &list).await,
        Command::Upcoming(list) => commands::upcoming(&ctx, &out, &list).await,
        Command::TopRated(list) => commands::top_rated(&ctx, &out, &list).await,
        Command::Shuffle(filter) => commands::shuffle(&ctx, &out, &filter).await,
        Command::Genre { genre_id, list } => {
            commands::genre(&ctx, &out, GenreId(genre_id), &list).await
        }
        Command::Rating { min, list } => commands::rating(&ctx, &out, min, &list).await,
        Command::Search { query, list } => commands::search(&ctx, &out, query, &list).await,
        Command::Details { id } => commands::details(&ctx, &out, id).await,
        Command::Genres => commands::genres(&ctx, &out).await,
        Command::Register(credentials) => commands::register(&ctx, &credentials).await,
        Command::Favorites { action } => commands::favorites(ctx, &out, action).await,
        Command::DeleteAccount(credentials) => commands::delete_account(&ctx, &credentials).await,
        // written before any configuration is loaded
        Command::InitConfig => Ok(()),
    }
}

fn init_logging(log_dir: Option<&Path>) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr);

    let file_layer = match log_dir {
        Some(dir) => {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating log directory {}", dir.display()))?;
            let log_path = dir.join("reelmark.log");
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_path)
                .with_context(|| format!("opening log file {}", log_path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_ansi(false)
                    .compact()
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(())
}
