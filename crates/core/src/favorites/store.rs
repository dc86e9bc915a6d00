use async_trait::async_trait;

use crate::{error::StoreError, identity::User, models::MovieId};

/// Durable per-user set of favorite movie ids.
///
/// Writes are idempotent merges keyed by the user's id, so repeating or
/// reordering operations on different ids is harmless.
#[async_trait]
pub trait FavoritesStore: Send + Sync {
    /// Union `movie_id` into the user's set.
    async fn merge_add_id(&self, user: &User, movie_id: MovieId) -> Result<(), StoreError>;
    /// Remove `movie_id` from the user's set.
    async fn merge_remove_id(&self, user: &User, movie_id: MovieId) -> Result<(), StoreError>;
    /// Read the user's set; a missing document is an empty set.
    async fn load_ids(&self, user: &User) -> Result<Vec<MovieId>, StoreError>;
}
