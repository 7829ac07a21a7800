//! Configuration management for Staybook
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{Result, StaybookError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

/// Main configuration structure for Staybook
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Remote document store and identity endpoint
    #[serde(default)]
    pub remote: RemoteConfig,
    /// Persisted session settings
    #[serde(default)]
    pub session: SessionConfig,
}

/// Remote endpoints configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Root of the JSON document store holding the collections
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Base of the identity endpoints (`accounts:signInWithPassword`,
    /// `accounts:signUp` are appended)
    #[serde(default = "default_auth_url")]
    pub auth_url: String,

    /// Web API key passed to the identity endpoints
    #[serde(default)]
    pub api_key: String,

    /// Endpoint receiving place image uploads
    #[serde(default = "default_image_upload_url")]
    pub image_upload_url: String,
}

fn default_database_url() -> String {
    "http://localhost:9000".to_string()
}

fn default_auth_url() -> String {
    "https://identitytoolkit.googleapis.com/v1".to_string()
}

fn default_image_upload_url() -> String {
    "http://localhost:5001/storeImage".to_string()
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            auth_url: default_auth_url(),
            api_key: String::new(),
            image_upload_url: default_image_upload_url(),
        }
    }
}

/// Session persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Keyring service name the session record is stored under
    #[serde(default = "default_keyring_service")]
    pub keyring_service: String,

    /// Keyring user name the session record is stored under
    #[serde(default = "default_keyring_user")]
    pub keyring_user: String,
}

fn default_keyring_service() -> String {
    "staybook".to_string()
}

fn default_keyring_user() -> String {
    "session".to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            keyring_service: default_keyring_service(),
            keyring_user: default_keyring_user(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(StaybookError::Io)?;
        let config = serde_yaml::from_str(&contents).map_err(StaybookError::Yaml)?;
        Ok(config)
    }

    fn apply_env_vars(&mut self) {
        if let Ok(database_url) = std::env::var("STAYBOOK_DATABASE_URL") {
            self.remote.database_url = database_url;
        }

        if let Ok(auth_url) = std::env::var("STAYBOOK_AUTH_URL") {
            self.remote.auth_url = auth_url;
        }

        if let Ok(api_key) = std::env::var("STAYBOOK_API_KEY") {
            self.remote.api_key = api_key;
        }

        if let Ok(upload_url) = std::env::var("STAYBOOK_IMAGE_UPLOAD_URL") {
            self.remote.image_upload_url = upload_url;
        }

        if let Ok(service) = std::env::var("STAYBOOK_KEYRING_SERVICE") {
            self.session.keyring_service = service;
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(database_url) = &cli.database_url {
            tracing::debug!("Using database URL override: {}", database_url);
            self.remote.database_url = database_url.clone();
        }
    }

    /// Parsed document store root.
    pub fn database_url(&self) -> Result<Url> {
        parse_url("remote.database_url", &self.remote.database_url)
    }

    /// Parsed identity endpoint base.
    pub fn auth_url(&self) -> Result<Url> {
        parse_url("remote.auth_url", &self.remote.auth_url)
    }

    /// Parsed image upload endpoint.
    pub fn image_upload_url(&self) -> Result<Url> {
        parse_url("remote.image_upload_url", &self.remote.image_upload_url)
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if either URL does not parse or a required field is
    /// empty
    pub fn validate(&self) -> Result<()> {
        self.database_url()?;
        self.auth_url()?;
        self.image_upload_url()?;

        if self.remote.api_key.trim().is_empty() {
            return Err(StaybookError::Config(
                "remote.api_key must be set (or STAYBOOK_API_KEY)".to_string(),
            )
            .into());
        }

        if self.session.keyring_service.is_empty() || self.session.keyring_user.is_empty() {
            return Err(StaybookError::Config(
                "session.keyring_service and session.keyring_user cannot be empty".to_string(),
            )
            .into());
        }

        Ok(())
    }
}

fn parse_url(field: &str, value: &str) -> Result<Url> {
    Url::parse(value)
        .map_err(|e| StaybookError::Config(format!("Invalid {} '{}': {}", field, value, e)).into())
}
