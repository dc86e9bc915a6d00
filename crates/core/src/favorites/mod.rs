//! Favorites state machine and its remote reconciliation.
//!
//! Local mutations apply synchronously and are immediately visible. Each
//! mutation made while a user is signed in spawns a detached task that
//! mirrors it into the [`FavoritesStore`]; failures are reported but never
//! roll back local state.
//!
//! Sync tasks for the same user and movie run one at a time on a per-id
//! lane, and a task whose intent was superseded by a newer mutation skips
//! its write. The remote membership of an id therefore converges to the
//! last local intent even under rapid add/remove toggling.

/// Firestore-backed store.
pub mod firestore;
/// Remote store contract.
pub mod store;

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use parking_lot::RwLock;
use tokio::{runtime::Handle, sync::mpsc};
use tracing::{debug, warn};

use crate::{
    error::StoreError,
    identity::User,
    models::{Movie, MovieId, UserId},
    session::SessionProjection,
};

pub use firestore::FirestoreFavoritesStore;
pub use store::FavoritesStore;

/// Remote operation mirrored from a local mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOp {
    /// Union the id into the remote set.
    Add,
    /// Remove the id from the remote set.
    Remove,
}

/// Outcome of one detached reconciliation task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FavoritesEvent {
    /// The store accepted the write.
    Synced {
        /// Movie whose membership was written.
        movie_id: MovieId,
        /// Operation sent to the store.
        op: SyncOp,
    },
    /// A newer mutation of the same id made this write redundant.
    Skipped {
        /// Movie whose write was dropped.
        movie_id: MovieId,
        /// Operation that was not sent.
        op: SyncOp,
    },
    /// The store rejected the write; local state is unchanged.
    Failed {
        /// Movie whose write failed.
        movie_id: MovieId,
        /// Operation that failed.
        op: SyncOp,
        /// Store error.
        error: StoreError,
    },
}

type IntentKey = (UserId, MovieId);

/// Handle for one remote load started with [`Favorites::begin_restore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestoreTicket(u64);

struct PendingRestore {
    ticket: u64,
    user_id: UserId,
    touched: HashSet<MovieId>,
}

#[derive(Default)]
struct Inner {
    entries: Vec<Movie>,
    index: HashSet<MovieId>,
    intents: HashMap<IntentKey, u64>,
    lanes: HashMap<IntentKey, Arc<tokio::sync::Mutex<()>>>,
    pending_restore: Option<PendingRestore>,
    next_seq: u64,
}

impl Inner {
    fn insert(&mut self, movie: Movie) -> bool {
        if !self.index.insert(movie.id) {
            return false;
        }
        self.entries.push(movie);
        true
    }

    fn remove(&mut self, movie_id: MovieId) -> bool {
        if !self.index.remove(&movie_id) {
            return false;
        }
        self.entries.retain(|movie| movie.id != movie_id);
        true
    }

    fn is_latest(&self, key: &IntentKey, seq: u64) -> bool {
        self.intents.get(key).copied() == Some(seq)
    }

    fn touch(&mut self, movie_id: MovieId) {
        if let Some(pending) = self.pending_restore.as_mut() {
            pending.touched.insert(movie_id);
        }
    }

    /// Drop the bookkeeping for `key` once its newest task has settled.
    fn settle(&mut self, key: &IntentKey, seq: u64) {
        if self.is_latest(key, seq) {
            self.intents.remove(key);
            self.lanes.remove(key);
        }
    }

    fn merge(&mut self, movies: impl IntoIterator<Item = Movie>) -> usize {
        movies
            .into_iter()
            .filter(|movie| self.insert(movie.clone()))
            .count()
    }
}

/// In-session favorites set keyed by movie id, in insertion order.
///
/// Cloning yields another handle to the same state.
#[derive(Clone)]
pub struct Favorites {
    inner: Arc<RwLock<Inner>>,
    store: Arc<dyn FavoritesStore>,
    session: SessionProjection,
    events: Option<mpsc::UnboundedSender<FavoritesEvent>>,
}

impl Favorites {
    /// Empty favorites scoped to the given session.
    pub fn new(store: Arc<dyn FavoritesStore>, session: SessionProjection) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
            store,
            session,
            events: None,
        }
    }

    /// Report sync outcomes on `sender`.
    pub fn with_events(mut self, sender: mpsc::UnboundedSender<FavoritesEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    /// Add a movie. Returns `false` when it was already a favorite.
    pub fn add_favorite(&self, movie: Movie) -> bool {
        let movie_id = movie.id;
        let inserted = {
            let mut inner = self.inner.write();
            inner.touch(movie_id);
            inner.insert(movie)
        };
        self.reconcile(SyncOp::Add, movie_id);
        inserted
    }

    /// Remove a movie by id. Returns `false` when it was not a favorite.
    pub fn remove_favorite(&self, movie_id: MovieId) -> bool {
        let removed = {
            let mut inner = self.inner.write();
            inner.touch(movie_id);
            inner.remove(movie_id)
        };
        self.reconcile(SyncOp::Remove, movie_id);
        removed
    }

    /// Flip the favorite status of `movie`, returning the new status.
    pub fn toggle(&self, movie: Movie) -> bool {
        if self.is_favorite(movie.id) {
            self.remove_favorite(movie.id);
            false
        } else {
            self.add_favorite(movie);
            true
        }
    }

    /// Whether `movie_id` is a favorite.
    pub fn is_favorite(&self, movie_id: MovieId) -> bool {
        self.inner.read().index.contains(&movie_id)
    }

    /// Snapshot of all favorites in insertion order.
    pub fn list(&self) -> Vec<Movie> {
        self.inner.read().entries.clone()
    }

    /// Number of favorites.
    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    /// Whether there are no favorites.
    pub fn is_empty(&self) -> bool {
        self.inner.read().entries.is_empty()
    }

    /// Drop every local favorite; called when the session becomes anonymous.
    ///
    /// In-flight sync tasks keep the user they were issued for. A pending
    /// restore is abandoned.
    pub fn clear_on_sign_out(&self) {
        let mut inner = self.inner.write();
        inner.entries.clear();
        inner.index.clear();
        inner.pending_restore = None;
    }

    /// Merge movies loaded from the store without issuing writes.
    ///
    /// Returns how many were new.
    pub fn restore(&self, movies: impl IntoIterator<Item = Movie>) -> usize {
        self.inner.write().merge(movies)
    }

    /// Start loading `user_id`'s remote favorites.
    ///
    /// Replaces any restore still pending.
    pub fn begin_restore(&self, user_id: &UserId) -> RestoreTicket {
        let mut inner = self.inner.write();
        inner.next_seq += 1;
        let ticket = inner.next_seq;
        inner.pending_restore = Some(PendingRestore {
            ticket,
            user_id: user_id.clone(),
            touched: HashSet::new(),
        });
        RestoreTicket(ticket)
    }

    /// Merge the movies loaded for `ticket`.
    ///
    /// Nothing is merged when the restore was abandoned or replaced, or the
    /// session no longer belongs to its user. Ids mutated locally since
    /// [`Favorites::begin_restore`] keep their local state. Returns how
    /// many movies were added.
    pub fn finish_restore(
        &self,
        ticket: RestoreTicket,
        movies: impl IntoIterator<Item = Movie>,
    ) -> usize {
        let mut inner = self.inner.write();
        let pending = match inner.pending_restore.take() {
            Some(pending) if pending.ticket == ticket.0 => pending,
            other => {
                inner.pending_restore = other;
                debug!("favorites restore superseded");
                return 0;
            }
        };
        let current = self.session.user().map(|user| user.id);
        if current.as_ref() != Some(&pending.user_id) {
            debug!(user_id = %pending.user_id, "session changed during favorites restore");
            return 0;
        }
        inner.merge(
            movies
                .into_iter()
                .filter(|movie| !pending.touched.contains(&movie.id)),
        )
    }

    fn reconcile(&self, op: SyncOp, movie_id: MovieId) {
        let user = match self.session.user() {
            Some(user) if !user.id.is_empty() => user,
            _ => {
                debug!(%movie_id, ?op, "no signed-in user, favorite kept locally");
                return;
            }
        };
        let Ok(runtime) = Handle::try_current() else {
            warn!(%movie_id, ?op, "no async runtime, remote favorites not updated");
            return;
        };

        let key = (user.id.clone(), movie_id);
        let (seq, lane) = {
            let mut inner = self.inner.write();
            inner.next_seq += 1;
            let seq = inner.next_seq;
            inner.intents.insert(key.clone(), seq);
            let lane = Arc::clone(inner.lanes.entry(key.clone()).or_default());
            (seq, lane)
        };

        let inner = Arc::clone(&self.inner);
        let store = Arc::clone(&self.store);
        let events = self.events.clone();
        runtime.spawn(async move {
            let _lane = lane.lock().await;
            let latest = inner.read().is_latest(&key, seq);
            let event = if !latest {
                debug!(%movie_id, ?op, seq, "favorite sync superseded");
                FavoritesEvent::Skipped { movie_id, op }
            } else {
                match push(store.as_ref(), &user, op, movie_id).await {
                    Ok(()) => {
                        debug!(user_id = %user.id, %movie_id, ?op, "favorite synced");
                        FavoritesEvent::Synced { movie_id, op }
                    }
                    Err(error) => {
                        warn!(user_id = %user.id, %movie_id, ?op, %error, "favorite sync failed");
                        FavoritesEvent::Failed {
                            movie_id,
                            op,
                            error,
                        }
                    }
                }
            };
            inner.write().settle(&key, seq);
            if let Some(events) = events {
                let _ = events.send(event);
            }
        });
    }
}

async fn push(
    store: &dyn FavoritesStore,
    user: &User,
    op: SyncOp,
    movie_id: MovieId,
) -> Result<(), StoreError> {
    match op {
        SyncOp::Add => store.merge_add_id(user, movie_id).await,
        SyncOp::Remove => store.merge_remove_id(user, movie_id).await,
    }
}
