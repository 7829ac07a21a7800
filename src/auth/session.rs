//! Session life-cycle state machine
//!
//! [`SessionStore`] owns the authenticated identity of the process:
//!
//! ```text
//! LoggedOut --login/signup/auto_login--> Authenticating --ok--> Authenticated
//!     ^                                        |                     |
//!     +------------------ error ---------------+                     |
//!     +----------------- logout / token expiry ----------------------+
//! ```
//!
//! The user id and the token are published as two independent
//! [`Observable`] streams. Both are present or both are absent; on login the
//! token is published before the user id and on logout the user id is
//! cleared first, so a reader that finds a user id can always find a token.
//!
//! Every transition that publishes or unpublishes a session, or replaces the
//! expiry timer, runs under one lock. Each scheduled timer carries a
//! generation number; a timer that fires after a newer login or a logout
//! finds a different generation and does nothing.

use std::sync::{Arc, Mutex, MutexGuard, OnceLock, Weak};

use chrono::{DateTime, Duration, Utc};
use futures::stream::{BoxStream, StreamExt};
use regex::Regex;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;

use crate::auth::exchange::{AuthMode, CredentialExchange};
use crate::auth::record_store::{SessionRecord, SessionRecordStore};
use crate::error::{Result, StaybookError};
use crate::observable::Observable;

/// Shortest password accepted before a credential exchange is attempted.
pub const MIN_PASSWORD_LEN: usize = 6;

/// An authenticated identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn to_record(&self) -> SessionRecord {
        SessionRecord {
            user_id: self.user_id.clone(),
            token: self.token.clone(),
            token_expires_at: self.expires_at,
        }
    }

    pub fn from_record(record: SessionRecord) -> Self {
        Self {
            user_id: record.user_id,
            token: record.token,
            expires_at: record.token_expires_at,
        }
    }
}

/// Observable state of the session machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    LoggedOut,
    Authenticating,
    Authenticated(Session),
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }
}

/// Rejects credentials the identity endpoint would refuse anyway.
///
/// # Errors
///
/// Returns [`StaybookError::InvalidInput`] for a malformed email address or
/// a password shorter than [`MIN_PASSWORD_LEN`].
pub fn validate_credentials(email: &str, password: &str) -> Result<()> {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    // Literal pattern, always compiles.
    let email_re = EMAIL
        .get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email pattern"));

    if !email_re.is_match(email.trim()) {
        return Err(StaybookError::InvalidInput(format!("'{}' is not an email address", email)).into());
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(StaybookError::InvalidInput(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        ))
        .into());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// SessionCore
// ---------------------------------------------------------------------------

/// The pending expiry timer and the generation it was scheduled under.
#[derive(Debug, Default)]
struct ExpirySlot {
    generation: u64,
    timer: Option<JoinHandle<()>>,
}

impl ExpirySlot {
    /// Invalidates any timer already running and aborts the pending one.
    fn cancel(&mut self) {
        self.generation += 1;
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

/// State shared with the expiry timer task.
#[derive(Debug)]
struct SessionCore {
    records: Arc<dyn SessionRecordStore>,
    state: Observable<SessionState>,
    user_id: Observable<Option<String>>,
    token: Observable<Option<String>>,
    expiry: Mutex<ExpirySlot>,
}

impl SessionCore {
    fn expiry_slot(&self) -> MutexGuard<'_, ExpirySlot> {
        self.expiry
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Publishes `session`, persisting it first when `persist` is set, and
    /// replaces the expiry timer.
    fn establish(self: &Arc<Self>, session: &Session, persist: bool) {
        let mut slot = self.expiry_slot();
        slot.cancel();

        if persist {
            if let Err(e) = self.records.save(&session.to_record()) {
                tracing::warn!("failed to persist session record: {}", e);
            }
        }
        self.publish(session);

        let remaining = (session.expires_at - Utc::now())
            .to_std()
            .unwrap_or(std::time::Duration::ZERO);
        let generation = slot.generation;
        let core: Weak<SessionCore> = Arc::downgrade(self);
        slot.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(remaining).await;
            if let Some(core) = core.upgrade() {
                core.expire(generation);
            }
        }));
        tracing::debug!(seconds = remaining.as_secs(), generation, "session expiry scheduled");
    }

    /// Unpublishes the session and clears the persisted record.
    fn end(&self) -> Result<()> {
        let mut slot = self.expiry_slot();
        slot.cancel();
        self.unpublish();
        self.records.clear()
    }

    /// Puts back the state seen before a failed credential exchange, unless
    /// another transition happened meanwhile.
    fn restore_after_failure(&self, previous: SessionState) {
        let _slot = self.expiry_slot();
        if self.state.get() == SessionState::Authenticating {
            self.state.replace(previous);
        }
    }

    fn publish(&self, session: &Session) {
        self.state
            .set_if_changed(SessionState::Authenticated(session.clone()));
        self.token.set_if_changed(Some(session.token.clone()));
        self.user_id.set_if_changed(Some(session.user_id.clone()));
    }

    fn unpublish(&self) {
        self.user_id.set_if_changed(None);
        self.token.set_if_changed(None);
        self.state.set_if_changed(SessionState::LoggedOut);
    }

    /// Runs on the timer task once the token lifetime has elapsed.
    fn expire(&self, generation: u64) {
        let mut slot = self.expiry_slot();
        if slot.generation != generation {
            tracing::debug!(generation, current = slot.generation, "stale expiry timer ignored");
            return;
        }
        // Detach our own handle; aborting it here would cancel this task.
        drop(slot.timer.take());
        slot.generation += 1;
        tracing::info!("session token expired, logging out");
        self.unpublish();
        if let Err(e) = self.records.clear() {
            tracing::warn!("failed to clear persisted session after expiry: {}", e);
        }
    }
}

// ---------------------------------------------------------------------------
// SessionStore
// ---------------------------------------------------------------------------

/// Owner of the authentication state machine.
///
/// Construct one per process and share it by `Arc`.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use url::Url;
/// use staybook::auth::exchange::HttpCredentialExchange;
/// use staybook::auth::record_store::MemoryRecordStore;
/// use staybook::auth::session::SessionStore;
///
/// # async fn example() -> staybook::error::Result<()> {
/// let exchange = HttpCredentialExchange::new(
///     Url::parse("https://identitytoolkit.googleapis.com/v1")?,
///     "api-key".to_string(),
/// );
/// let session = SessionStore::new(Arc::new(exchange), Arc::new(MemoryRecordStore::new()));
///
/// if !session.auto_login().await? {
///     session.login("a@b.com", "secret").await?;
/// }
/// println!("signed in as {:?}", session.current_user_id());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SessionStore {
    exchange: Arc<dyn CredentialExchange>,
    core: Arc<SessionCore>,
}

impl SessionStore {
    /// Creates a store in the `LoggedOut` state.
    pub fn new(
        exchange: Arc<dyn CredentialExchange>,
        records: Arc<dyn SessionRecordStore>,
    ) -> Self {
        Self {
            exchange,
            core: Arc::new(SessionCore {
                records,
                state: Observable::new(SessionState::LoggedOut),
                user_id: Observable::new(None),
                token: Observable::new(None),
                expiry: Mutex::new(ExpirySlot::default()),
            }),
        }
    }

    /// Signs in with an existing account.
    ///
    /// # Errors
    ///
    /// [`StaybookError::InvalidInput`] before any network call for malformed
    /// input, [`StaybookError::Auth`] with the classified code when the
    /// identity endpoint rejects the credentials.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        self.authenticate(AuthMode::Login, email, password).await
    }

    /// Creates an account and signs in with it.
    pub async fn signup(&self, email: &str, password: &str) -> Result<Session> {
        self.authenticate(AuthMode::Signup, email, password).await
    }

    async fn authenticate(&self, mode: AuthMode, email: &str, password: &str) -> Result<Session> {
        validate_credentials(email, password)?;

        let previous = self.core.state.get();
        self.core.state.replace(SessionState::Authenticating);

        let session = match self.exchange_session(mode, email, password).await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(?mode, "credential exchange failed: {}", e);
                self.core.restore_after_failure(previous);
                return Err(e);
            }
        };

        self.core.establish(&session, true);
        tracing::info!(user_id = %session.user_id, ?mode, "session authenticated");
        Ok(session)
    }

    async fn exchange_session(&self, mode: AuthMode, email: &str, password: &str) -> Result<Session> {
        let response = self.exchange.exchange(mode, email, password).await?;
        let lifetime = response.expires_in_seconds()?;
        let expires_at = Duration::try_seconds(lifetime)
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
            .ok_or_else(|| {
                StaybookError::Transport(format!("invalid expiresIn '{}'", response.expires_in))
            })?;
        Ok(Session {
            user_id: response.local_id,
            token: response.id_token,
            expires_at,
        })
    }

    /// Restores the session from the persisted record.
    ///
    /// Returns `Ok(false)` and leaves the state untouched when no record
    /// exists or the stored token has already expired.
    pub async fn auto_login(&self) -> Result<bool> {
        let Some(record) = self.core.records.load()? else {
            tracing::debug!("no persisted session record");
            return Ok(false);
        };
        if record.is_expired_at(Utc::now()) {
            tracing::debug!(user_id = %record.user_id, "persisted session record has expired");
            return Ok(false);
        }

        let session = Session::from_record(record);
        self.core.establish(&session, false);
        tracing::info!(user_id = %session.user_id, "session restored");
        Ok(true)
    }

    /// Host notification that the process returned to the foreground.
    ///
    /// Re-runs [`auto_login`](Self::auto_login); when the session cannot be
    /// restored the store logs out, clearing any stale record.
    pub async fn on_resume(&self) -> Result<bool> {
        match self.auto_login().await {
            Ok(true) => Ok(true),
            Ok(false) => {
                self.logout()?;
                Ok(false)
            }
            Err(e) => {
                self.logout()?;
                Err(e)
            }
        }
    }

    /// Ends the session unconditionally.
    ///
    /// The state becomes `LoggedOut` before the persisted record is cleared,
    /// so a keyring failure is reported without leaving the process
    /// authenticated.
    pub fn logout(&self) -> Result<()> {
        let result = self.core.end();
        tracing::info!("session logged out");
        result
    }

    /// Token stream: replays the latest value, then emits on change.
    pub fn token(&self) -> WatchStream<Option<String>> {
        self.core.token.stream()
    }

    /// User id stream: replays the latest value, then emits on change.
    pub fn user_id(&self) -> WatchStream<Option<String>> {
        self.core.user_id.stream()
    }

    /// Whether a user id is present, emitted once per edge.
    pub fn is_authenticated(&self) -> BoxStream<'static, bool> {
        let mut last: Option<bool> = None;
        self.core
            .user_id
            .stream()
            .filter_map(move |user_id| {
                let authenticated = user_id.is_some();
                let edge = last != Some(authenticated);
                last = Some(authenticated);
                futures::future::ready(edge.then_some(authenticated))
            })
            .boxed()
    }

    /// Full state stream, mainly for diagnostics.
    pub fn state_changes(&self) -> WatchStream<SessionState> {
        self.core.state.stream()
    }

    pub fn state(&self) -> SessionState {
        self.core.state.get()
    }

    /// One-shot snapshot of the user id.
    pub fn current_user_id(&self) -> Option<String> {
        self.core.user_id.get()
    }

    /// One-shot snapshot of the token.
    pub fn current_token(&self) -> Option<String> {
        self.core.token.get()
    }
}

impl Drop for SessionStore {
    fn drop(&mut self) {
        self.core.expiry_slot().cancel();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
