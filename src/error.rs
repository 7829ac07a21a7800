//! Error types for Staybook
//!
//! This module defines the error taxonomy shared by the session store, the
//! gated request pipeline and the entity caches, using `thiserror` for
//! ergonomic error handling.

use thiserror::Error;

/// Classified failure of a credential exchange (login or signup).
///
/// The remote identity endpoint reports failures as an `error.message` code;
/// [`AuthError::from_code`] maps the known codes and folds everything else
/// into [`AuthError::Unknown`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Signup attempted with an address that already has an account
    #[error("email address already exists")]
    EmailExists,

    /// Login attempted with an address that has no account
    #[error("email address not found")]
    EmailNotFound,

    /// Login attempted with the wrong password
    #[error("invalid password")]
    InvalidPassword,

    /// Any other failure code returned by the identity endpoint
    #[error("authentication failed: {0}")]
    Unknown(String),
}

impl AuthError {
    /// Maps an identity endpoint error code to its classification.
    ///
    /// Codes may carry a trailing explanation (`"INVALID_PASSWORD : ..."`);
    /// only the leading token is inspected.
    ///
    /// # Examples
    ///
    /// ```
    /// use staybook::error::AuthError;
    ///
    /// assert_eq!(AuthError::from_code("EMAIL_EXISTS"), AuthError::EmailExists);
    /// assert_eq!(
    ///     AuthError::from_code("TOO_MANY_ATTEMPTS_TRY_LATER"),
    ///     AuthError::Unknown("TOO_MANY_ATTEMPTS_TRY_LATER".to_string())
    /// );
    /// ```
    pub fn from_code(code: &str) -> Self {
        let head = code.split(':').next().unwrap_or(code).trim();
        match head {
            "EMAIL_EXISTS" => AuthError::EmailExists,
            "EMAIL_NOT_FOUND" => AuthError::EmailNotFound,
            "INVALID_PASSWORD" => AuthError::InvalidPassword,
            _ => AuthError::Unknown(code.to_string()),
        }
    }

    /// Text shown to a person after a failed sign-in or sign-up.
    pub fn user_message(&self) -> &'static str {
        match self {
            AuthError::EmailExists => "This email address already exists!",
            AuthError::EmailNotFound => "E-mail address could not be found",
            AuthError::InvalidPassword => "This password is not correct.",
            AuthError::Unknown(_) => "Could not sign you up, please try again",
        }
    }
}

/// Main error type for Staybook operations
///
/// Gated cache operations never recover from these; every variant travels
/// to the caller unchanged.
#[derive(Error, Debug)]
pub enum StaybookError {
    /// Credential exchange failed with a classified code
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// A gated operation was attempted without an authenticated session
    #[error("No active session")]
    NoActiveSession,

    /// A single-entity lookup resolved to nothing
    #[error("Not found: {0}")]
    NotFound(String),

    /// Non-success status or malformed payload from the remote store
    #[error("Transport error: {0}")]
    Transport(String),

    /// Input rejected before any network call
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Keyring/credential storage errors
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),
}

impl StaybookError {
    /// Returns `true` for network and decoding failures not otherwise
    /// classified.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            StaybookError::Transport(_) | StaybookError::Http(_) | StaybookError::Serialization(_)
        )
    }
}

/// Result type alias for Staybook operations
///
/// Uses `anyhow::Error` so callers can attach context while still being able
/// to `downcast_ref::<StaybookError>()` for classification.
pub type Result<T> = anyhow::Result<T>;
