#![warn(clippy::all, missing_docs)]

//! Core domain logic for the Reelmark movie browser.
//!
//! This crate hosts the catalog client, identity and favorites
//! backends, the session projection, and the local filter used by
//! the command-line frontend and any future frontends.

pub mod browse;
pub mod catalog;
pub mod config;
pub mod context;
pub mod error;
pub mod favorites;
pub mod filter;
pub mod identity;
pub mod models;
pub mod session;

#[cfg(test)]
mod testing;

pub use browse::{Browser, ListQuery, Outcome};
pub use catalog::{Catalog, TmdbClient};
pub use config::AppConfig;
pub use context::AppContext;
pub use error::{AuthError, CatalogUnavailable, CredentialError, StoreError};
pub use favorites::{Favorites, FavoritesEvent, FavoritesStore, SyncOp};
pub use filter::{evaluate, FilterSpec};
pub use identity::{IdentityProvider, User};
pub use models::{Genre, GenreId, Movie, MovieDetails, MovieId, MoviePage, UserId};
pub use session::{Notice, Route, Session, SessionProjection, SessionTransition};
