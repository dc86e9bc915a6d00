#![allow(missing_docs)]

//! Error taxonomy shared by the catalog, identity and favorites layers.

use thiserror::Error;

use crate::models::MovieId;

/// The movie catalog could not produce a response.
///
/// Raised for transport failures, non-success statuses and undecodable
/// payloads alike; callers render an empty list with the message.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("catalog unavailable: {0}")]
pub struct CatalogUnavailable(pub String);

impl CatalogUnavailable {
    /// Build the error from any displayable cause.
    pub fn new(cause: impl ToString) -> Self {
        Self(cause.to_string())
    }

    /// Reason reported by the transport or the catalog.
    pub fn reason(&self) -> &str {
        &self.0
    }
}

impl From<reqwest::Error> for CatalogUnavailable {
    fn from(err: reqwest::Error) -> Self {
        Self::new(err)
    }
}

/// Failures reported by the identity provider.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid email")]
    InvalidEmail,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("user not found")]
    UserNotFound,
    #[error("user disabled")]
    UserDisabled,
    #[error("email already in use")]
    EmailInUse,
    #[error("weak password")]
    WeakPassword,
    #[error("identity provider error: {0}")]
    Unknown(String),
}

impl AuthError {
    /// Map an Identity Toolkit error code onto the taxonomy.
    ///
    /// Codes sometimes carry a trailing explanation (`WEAK_PASSWORD : ...`),
    /// so only the leading token is matched.
    pub fn from_code(code: &str) -> Self {
        let token = code
            .split(|c: char| c == ':' || c.is_whitespace())
            .next()
            .unwrap_or_default();
        match token {
            "INVALID_EMAIL" => Self::InvalidEmail,
            "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" | "INVALID_CREDENTIAL" => {
                Self::InvalidCredentials
            }
            "EMAIL_NOT_FOUND" | "USER_NOT_FOUND" => Self::UserNotFound,
            "USER_DISABLED" => Self::UserDisabled,
            "EMAIL_EXISTS" => Self::EmailInUse,
            "WEAK_PASSWORD" => Self::WeakPassword,
            _ => Self::Unknown(code.to_string()),
        }
    }

    /// Message shown to the user for this failure.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidEmail => "Invalid email format.",
            Self::InvalidCredentials => "Invalid credentials provided.",
            Self::UserNotFound => "No user found with this email.",
            Self::UserDisabled => "This account has been disabled.",
            Self::EmailInUse => "This email is already in use.",
            Self::WeakPassword => "Password must be at least 6 characters long.",
            Self::Unknown(_) => "An error occurred. Please try again later.",
        }
    }
}

/// Failures talking to the remote favorites document.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("remote favorites write failed for movie {movie_id}: {reason}")]
    WriteFailed { movie_id: MovieId, reason: String },
    #[error("remote favorites read failed: {0}")]
    ReadFailed(String),
}

/// Local validation of credentials before contacting the identity provider.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("Fill in all fields.")]
    MissingFields,
    #[error("Please enter a valid email address.")]
    MalformedEmail,
    #[error("Password must be at least 6 characters long.")]
    PasswordTooShort,
}

/// Configuration could not be loaded or written.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("failed to write configuration {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("no configuration directory available on this platform")]
    NoConfigDir,
}
