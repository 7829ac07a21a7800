//! Email/password credential exchange
//!
//! The identity endpoint trades an email address and password for an
//! `idToken`/`localId` pair valid for `expiresIn` seconds. Failures come back
//! as `{ "error": { "message": "<CODE>" } }` and are classified into
//! [`AuthError`].

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AuthError, Result, StaybookError};

/// Which credential exchange to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Login,
    Signup,
}

impl AuthMode {
    /// Endpoint name appended to the identity base URL.
    pub fn endpoint(&self) -> &'static str {
        match self {
            AuthMode::Login => "accounts:signInWithPassword",
            AuthMode::Signup => "accounts:signUp",
        }
    }
}

/// Successful credential exchange response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponseData {
    pub id_token: String,
    pub local_id: String,
    /// Token lifetime in seconds, transmitted as a decimal string.
    pub expires_in: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registered: Option<bool>,
}

impl AuthResponseData {
    /// Parses `expires_in` into whole seconds.
    ///
    /// # Errors
    ///
    /// Returns [`StaybookError::Transport`] when the field is not a
    /// non-negative integer.
    pub fn expires_in_seconds(&self) -> Result<i64> {
        self.expires_in
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|secs| *secs >= 0)
            .ok_or_else(|| {
                StaybookError::Transport(format!("invalid expiresIn '{}'", self.expires_in)).into()
            })
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Abstraction over the identity endpoint.
#[async_trait::async_trait]
pub trait CredentialExchange: Send + Sync + std::fmt::Debug {
    /// Exchanges `email`/`password` for a token.
    ///
    /// # Errors
    ///
    /// Returns [`StaybookError::Auth`] carrying the classified code when the
    /// endpoint rejects the credentials.
    async fn exchange(&self, mode: AuthMode, email: &str, password: &str)
        -> Result<AuthResponseData>;
}

/// `reqwest`-backed credential exchange.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use staybook::auth::exchange::{AuthMode, HttpCredentialExchange};
///
/// let exchange = HttpCredentialExchange::new(
///     Url::parse("https://identitytoolkit.googleapis.com/v1").unwrap(),
///     "api-key".to_string(),
/// );
/// assert_eq!(
///     exchange.endpoint_url(AuthMode::Signup).unwrap().as_str(),
///     "https://identitytoolkit.googleapis.com/v1/accounts:signUp?key=api-key"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct HttpCredentialExchange {
    http: reqwest::Client,
    auth_url: Url,
    api_key: String,
}

impl HttpCredentialExchange {
    pub fn new(auth_url: Url, api_key: String) -> Self {
        Self::with_client(reqwest::Client::new(), auth_url, api_key)
    }

    pub fn with_client(http: reqwest::Client, auth_url: Url, api_key: String) -> Self {
        Self {
            http,
            auth_url,
            api_key,
        }
    }

    /// Full endpoint URL for `mode`, including the API key.
    ///
    /// Built by string concatenation: `accounts:signUp` would otherwise be
    /// read as an absolute URL with an `accounts` scheme by `Url::join`.
    pub fn endpoint_url(&self, mode: AuthMode) -> Result<Url> {
        let raw = format!(
            "{}/{}",
            self.auth_url.as_str().trim_end_matches('/'),
            mode.endpoint()
        );
        let mut url = Url::parse(&raw)
            .map_err(|e| StaybookError::Config(format!("invalid auth url '{}': {}", raw, e)))?;
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }
}

#[async_trait::async_trait]
impl CredentialExchange for HttpCredentialExchange {
    async fn exchange(
        &self,
        mode: AuthMode,
        email: &str,
        password: &str,
    ) -> Result<AuthResponseData> {
        let url = self.endpoint_url(mode)?;
        tracing::debug!(endpoint = mode.endpoint(), "credential exchange");

        let response = self
            .http
            .post(url)
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "returnSecureToken": true,
            }))
            .send()
            .await
            .map_err(StaybookError::Http)?;

        let status = response.status();
        let text = response.text().await.map_err(StaybookError::Http)?;

        if !status.is_success() {
            let auth_error = match serde_json::from_str::<ErrorEnvelope>(&text) {
                Ok(envelope) => AuthError::from_code(&envelope.error.message),
                Err(_) => AuthError::Unknown(format!("HTTP {}", status)),
            };
            tracing::debug!(%status, error = %auth_error, "credential exchange rejected");
            return Err(StaybookError::Auth(auth_error).into());
        }

        let data = serde_json::from_str(&text).map_err(StaybookError::Serialization)?;
        Ok(data)
    }
}
