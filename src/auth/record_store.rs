//! Session credential record persistence
//!
//! Exactly one session record is persisted at a time: it is written on every
//! successful authentication, read by auto-login, and cleared on logout.
//!
//! Two stores are provided:
//!
//! - [`KeyringRecordStore`] -- the operating system's native credential
//!   store (Keychain on macOS, Secret Service on Linux, Windows Credential
//!   Manager on Windows). The record is serialized to JSON.
//! - [`MemoryRecordStore`] -- process-local storage for tests and
//!   ephemeral sessions.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StaybookError};

// ---------------------------------------------------------------------------
// SessionRecord
// ---------------------------------------------------------------------------

/// Persisted form of an authenticated session.
///
/// # Examples
///
/// ```
/// use chrono::{Duration, Utc};
/// use staybook::auth::record_store::SessionRecord;
///
/// let record = SessionRecord {
///     user_id: "U1".to_string(),
///     token: "T1".to_string(),
///     token_expires_at: Utc::now() + Duration::hours(1),
/// };
/// assert!(!record.is_expired_at(Utc::now()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub user_id: String,
    pub token: String,
    pub token_expires_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Returns `true` once `now` has reached the token expiry.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.token_expires_at
    }
}

// ---------------------------------------------------------------------------
// SessionRecordStore
// ---------------------------------------------------------------------------

/// Storage for the single persisted session record.
pub trait SessionRecordStore: Send + Sync + std::fmt::Debug {
    /// Loads the record, `Ok(None)` when nothing has been saved.
    fn load(&self) -> Result<Option<SessionRecord>>;

    /// Replaces the stored record.
    fn save(&self, record: &SessionRecord) -> Result<()>;

    /// Removes the stored record; a no-op when none exists.
    fn clear(&self) -> Result<()>;
}

// ---------------------------------------------------------------------------
// KeyringRecordStore
// ---------------------------------------------------------------------------

/// Record store backed by the OS keyring.
#[derive(Debug, Clone)]
pub struct KeyringRecordStore {
    service: String,
    user: String,
}

impl KeyringRecordStore {
    pub fn new(service: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            user: user.into(),
        }
    }

    fn entry(&self) -> Result<keyring::Entry> {
        keyring::Entry::new(&self.service, &self.user).map_err(|e| StaybookError::Keyring(e).into())
    }
}

impl SessionRecordStore for KeyringRecordStore {
    fn load(&self) -> Result<Option<SessionRecord>> {
        match self.entry()?.get_password() {
            Ok(json_str) => {
                let record: SessionRecord =
                    serde_json::from_str(&json_str).map_err(StaybookError::Serialization)?;
                Ok(Some(record))
            }
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(StaybookError::Keyring(e).into()),
        }
    }

    fn save(&self, record: &SessionRecord) -> Result<()> {
        let json_str = serde_json::to_string(record).map_err(StaybookError::Serialization)?;
        self.entry()?
            .set_password(&json_str)
            .map_err(StaybookError::Keyring)?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match self.entry()?.delete_password() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(StaybookError::Keyring(e).into()),
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryRecordStore
// ---------------------------------------------------------------------------

/// Process-local record store.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    record: Mutex<Option<SessionRecord>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with `record`, as if a previous process saved it.
    pub fn with_record(record: SessionRecord) -> Self {
        Self {
            record: Mutex::new(Some(record)),
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<SessionRecord>> {
        self.record
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SessionRecordStore for MemoryRecordStore {
    fn load(&self) -> Result<Option<SessionRecord>> {
        Ok(self.slot().clone())
    }

    fn save(&self, record: &SessionRecord) -> Result<()> {
        *self.slot() = Some(record.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.slot() = None;
        Ok(())
    }
}
