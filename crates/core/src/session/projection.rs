use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, warn};

use super::models::{Notice, Route, Session, SessionTransition};
use crate::identity::{IdentityProvider, User};

/// Synchronously readable session state fed by identity events.
///
/// Starts `Uninitialized`, leaves it on the first event and never returns
/// to it. Cloning yields another handle to the same state.
#[derive(Debug, Clone, Default)]
pub struct SessionProjection {
    inner: Arc<RwLock<Session>>,
}

impl SessionProjection {
    /// New projection in the `Uninitialized` state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current session.
    pub fn current(&self) -> Session {
        self.inner.read().clone()
    }

    /// Signed-in user, if any.
    pub fn user(&self) -> Option<User> {
        self.inner.read().user().cloned()
    }

    /// Navigation tree for the current session.
    pub fn route(&self) -> Route {
        self.inner.read().route()
    }

    /// Apply one identity event (`None` = signed out).
    pub fn apply(&self, event: Option<User>) -> SessionTransition {
        let mut session = self.inner.write();
        let transition = match event {
            None if *session == Session::Anonymous => SessionTransition::Unchanged,
            None => {
                *session = Session::Anonymous;
                SessionTransition::SignedOut
            }
            Some(user) => {
                // same account re-announced, possibly with a refreshed token
                let same_account = session.user_id() == Some(&user.id);
                *session = Session::Authenticated(user.clone());
                if same_account {
                    SessionTransition::Unchanged
                } else {
                    SessionTransition::SignedIn(user)
                }
            }
        };

        match &transition {
            SessionTransition::SignedIn(user) => info!(user_id = %user.id, "session authenticated"),
            SessionTransition::SignedOut => info!("session anonymous"),
            SessionTransition::Unchanged => {}
        }
        transition
    }

    /// Sign out through the provider.
    ///
    /// The session only becomes anonymous once the provider confirms; on
    /// failure it stays authenticated and a notice is returned.
    pub async fn sign_out(
        &self,
        provider: &dyn IdentityProvider,
    ) -> Result<SessionTransition, Notice> {
        match provider.sign_out().await {
            Ok(()) => Ok(self.apply(None)),
            Err(err) => {
                warn!(%err, "sign out failed");
                Err(Notice::sign_out_failed())
            }
        }
    }
}
