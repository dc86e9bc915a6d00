//! Wiring between the identity provider, the session and favorites.

use std::sync::Arc;

use anyhow::Context as _;
use futures::future::join_all;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{info, warn};

use crate::{
    catalog::{Catalog, TmdbClient},
    config::AppConfig,
    error::StoreError,
    favorites::{Favorites, FavoritesEvent, FavoritesStore, FirestoreFavoritesStore},
    identity::{
        credentials::{validate_sign_in, validate_sign_up},
        FirebaseIdentity, IdentityProvider, User,
    },
    session::{Notice, SessionProjection, SessionTransition},
};

/// Everything a frontend needs, built once at startup.
///
/// Cloning yields another handle to the same state.
#[derive(Clone)]
pub struct AppContext {
    catalog: Arc<dyn Catalog>,
    identity: Arc<dyn IdentityProvider>,
    store: Arc<dyn FavoritesStore>,
    session: SessionProjection,
    favorites: Favorites,
}

impl AppContext {
    /// Assemble a context from explicit collaborators.
    pub fn new(
        catalog: Arc<dyn Catalog>,
        identity: Arc<dyn IdentityProvider>,
        store: Arc<dyn FavoritesStore>,
    ) -> Self {
        let session = SessionProjection::new();
        let favorites = Favorites::new(Arc::clone(&store), session.clone());
        Self {
            catalog,
            identity,
            store,
            session,
            favorites,
        }
    }

    /// Context backed by TMDb and Firebase as configured.
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let catalog = TmdbClient::new(&config.tmdb).context("building catalog client")?;
        let identity =
            FirebaseIdentity::new(&config.firebase).context("building identity client")?;
        let store =
            FirestoreFavoritesStore::new(&config.firebase).context("building favorites store")?;
        Ok(Self::new(
            Arc::new(catalog),
            Arc::new(identity),
            Arc::new(store),
        ))
    }

    /// Report favorites sync outcomes on `sender`.
    pub fn with_favorite_events(mut self, sender: mpsc::UnboundedSender<FavoritesEvent>) -> Self {
        self.favorites = self.favorites.with_events(sender);
        self
    }

    /// Movie catalog.
    pub fn catalog(&self) -> &dyn Catalog {
        self.catalog.as_ref()
    }

    /// Identity provider.
    pub fn identity(&self) -> &dyn IdentityProvider {
        self.identity.as_ref()
    }

    /// Session projection fed by identity events.
    pub fn session(&self) -> &SessionProjection {
        &self.session
    }

    /// Favorites of the current session.
    pub fn favorites(&self) -> &Favorites {
        &self.favorites
    }

    /// Subscribe to identity events and feed them into the session.
    ///
    /// Must be called from within a Tokio runtime. The task ends when the
    /// provider drops its listeners.
    pub fn attach_identity(&self) -> JoinHandle<()> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        self.identity.on_auth_state_changed(tx);
        let ctx = self.clone();
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                ctx.handle_identity_event(event).await;
            }
        })
    }

    /// Apply one identity event and update favorites accordingly.
    pub async fn handle_identity_event(&self, event: Option<User>) -> SessionTransition {
        let transition = self.session.apply(event);
        match &transition {
            SessionTransition::SignedIn(user) => {
                if let Err(err) = self.restore_favorites(user).await {
                    warn!(user_id = %user.id, %err, "could not restore favorites");
                }
            }
            SessionTransition::SignedOut => self.favorites.clear_on_sign_out(),
            SessionTransition::Unchanged => {}
        }
        transition
    }

    /// Load the user's remote favorites and merge them locally.
    ///
    /// Ids the catalog cannot resolve are skipped. Nothing is merged if the
    /// session changes hands while loading. Returns how many favorites were
    /// added.
    pub async fn restore_favorites(&self, user: &User) -> Result<usize, StoreError> {
        let ticket = self.favorites.begin_restore(&user.id);
        let ids = match self.store.load_ids(user).await {
            Ok(ids) => ids,
            Err(err) => {
                self.favorites.finish_restore(ticket, Vec::new());
                return Err(err);
            }
        };
        let lookups = ids.iter().map(|id| self.catalog.details(*id));
        let movies = join_all(lookups)
            .await
            .into_iter()
            .zip(&ids)
            .filter_map(|(result, id)| match result {
                Ok(details) => Some(details.summary()),
                Err(err) => {
                    warn!(movie_id = %id, %err, "skipping unresolved favorite");
                    None
                }
            });
        let restored = self.favorites.finish_restore(ticket, movies);
        info!(user_id = %user.id, remote = ids.len(), restored, "favorites restored");
        Ok(restored)
    }

    /// Validate credentials, sign in and apply the resulting session.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<User, Notice> {
        validate_sign_in(email, password).map_err(|err| Notice::error(err.to_string()))?;
        let user = self
            .identity
            .sign_in(email.trim(), password)
            .await
            .map_err(|err| {
                warn!(%err, "sign in failed");
                Notice::error(err.user_message())
            })?;
        self.handle_identity_event(Some(user.clone())).await;
        Ok(user)
    }

    /// Validate credentials, register and apply the resulting session.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<User, Notice> {
        validate_sign_up(email, password).map_err(|err| Notice::error(err.to_string()))?;
        let user = self
            .identity
            .sign_up(email.trim(), password)
            .await
            .map_err(|err| {
                warn!(%err, "registration failed");
                Notice::error(err.user_message())
            })?;
        self.handle_identity_event(Some(user.clone())).await;
        Ok(user)
    }

    /// Sign out; the session stays authenticated if the provider fails.
    pub async fn sign_out(&self) -> Result<(), Notice> {
        let transition = self.session.sign_out(self.identity.as_ref()).await?;
        if transition == SessionTransition::SignedOut {
            self.favorites.clear_on_sign_out();
        }
        Ok(())
    }

    /// Delete the signed-in account and end the session.
    pub async fn delete_account(&self) -> Result<Notice, Notice> {
        match self.identity.delete_account().await {
            Ok(()) => {
                self.handle_identity_event(None).await;
                Ok(Notice::account_deleted())
            }
            Err(err) => {
                warn!(%err, "account deletion failed");
                Err(Notice::account_delete_failed())
            }
        }
    }
}
