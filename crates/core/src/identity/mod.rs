//! Identity provider contract, credential checks and the Firebase backend.

/// Local credential validation.
pub mod credentials;
/// Identity Toolkit REST backend.
pub mod firebase;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::{error::AuthError, models::UserId};

pub use credentials::{validate_sign_in, validate_sign_up};
pub use firebase::FirebaseIdentity;

/// Receives `Some(user)` on sign-in and `None` on sign-out.
pub type AuthListener = mpsc::UnboundedSender<Option<User>>;

/// An authenticated account.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Stable identifier issued by the provider.
    pub id: UserId,
    /// Sign-in email.
    pub email: String,
    /// Bearer token used against the document store.
    pub id_token: String,
}

impl User {
    /// Build a user without a bearer token.
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: UserId::new(id),
            email: email.into(),
            id_token: String::new(),
        }
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("id_token", &"<redacted>")
            .finish()
    }
}

/// Authenticates users and reports sign-in state transitions.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Sign in with email and password.
    async fn sign_in(&self, email: &str, password: &str) -> Result<User, AuthError>;
    /// Create an account; the new account is signed in.
    async fn sign_up(&self, email: &str, password: &str) -> Result<User, AuthError>;
    /// Sign the current user out.
    async fn sign_out(&self) -> Result<(), AuthError>;
    /// Permanently delete the signed-in account.
    async fn delete_account(&self) -> Result<(), AuthError>;
    /// Currently signed-in user, if any.
    fn current_user(&self) -> Option<User>;
    /// Register a listener. The current state is delivered immediately,
    /// then every subsequent transition.
    fn on_auth_state_changed(&self, listener: AuthListener);
}
