use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{identity::User, models::UserId};

/// The app's view of whether, and as whom, the user is authenticated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Session {
    /// No identity event has arrived yet.
    #[default]
    Uninitialized,
    /// Determined: nobody is signed in.
    Anonymous,
    /// Determined: the given user is signed in.
    Authenticated(User),
}

impl Session {
    /// Signed-in user, if any.
    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    /// Identifier of the signed-in user, if any.
    pub fn user_id(&self) -> Option<&UserId> {
        self.user().map(|user| &user.id)
    }

    /// Whether a user is signed in.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    /// Which navigation tree the frontend should show.
    pub fn route(&self) -> Route {
        match self {
            Self::Uninitialized => Route::Loading,
            Self::Anonymous => Route::SignedOut,
            Self::Authenticated(_) => Route::SignedIn,
        }
    }
}

/// Top-level navigation tree selected from the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Route {
    /// Show a loading indicator and neither tree.
    Loading,
    /// Login/registration screens.
    SignedOut,
    /// Main tabs.
    SignedIn,
}

/// Result of feeding one identity event into the projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionTransition {
    /// A (different) user is now signed in.
    SignedIn(User),
    /// The session became anonymous.
    SignedOut,
    /// The event repeated the current state.
    Unchanged,
}

/// Dismissible message surfaced to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    /// Short heading.
    pub title: String,
    /// Body text.
    pub message: String,
}

impl Notice {
    /// Build a notice.
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }

    /// Notice reported when signing out fails.
    pub fn sign_out_failed() -> Self {
        Self::new("Error", "Something went wrong while logging out.")
    }

    /// Generic failure notice.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new("Error", message)
    }

    /// Notice reported after a successful registration.
    pub fn registered() -> Self {
        Self::new("Success", "User registered successfully.")
    }

    /// Notice reported after account deletion.
    pub fn account_deleted() -> Self {
        Self::new("Success", "The Account has been deleted.")
    }

    /// Notice reported when account deletion fails.
    pub fn account_delete_failed() -> Self {
        Self::new("Failed", "The Account could not be deleted.")
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.message)
    }
}
