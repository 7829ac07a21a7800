//! Test utilities for Staybook
//!
//! This module provides session fixtures and JSON record builders shared by
//! the unit tests of the resource caches.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tempfile::TempDir;

use crate::auth::exchange::{AuthMode, AuthResponseData, CredentialExchange};
use crate::auth::record_store::{MemoryRecordStore, SessionRecord};
use crate::auth::session::SessionStore;
use crate::error::{Result, StaybookError};

/// Credential exchange that refuses every attempt.
///
/// Fixtures authenticate through a seeded record instead.
#[derive(Debug, Default)]
pub struct RefusingExchange;

#[async_trait::async_trait]
impl CredentialExchange for RefusingExchange {
    async fn exchange(&self, mode: AuthMode, _: &str, _: &str) -> Result<AuthResponseData> {
        Err(StaybookError::Transport(format!("{:?} not available in tests", mode)).into())
    }
}

/// Session store authenticated as `user_id` with `token`
///
/// # Panics
///
/// Panics if the seeded record cannot be restored
pub async fn logged_in_session(user_id: &str, token: &str) -> Arc<SessionStore> {
    let records = MemoryRecordStore::with_record(SessionRecord {
        user_id: user_id.to_string(),
        token: token.to_string(),
        token_expires_at: Utc::now() + Duration::hours(1),
    });
    let store = SessionStore::new(Arc::new(RefusingExchange), Arc::new(records));
    assert!(
        store.auto_login().await.expect("auto login"),
        "seeded session record was not restored"
    );
    Arc::new(store)
}

/// Session store that never authenticated
pub fn logged_out_session() -> Arc<SessionStore> {
    Arc::new(SessionStore::new(
        Arc::new(RefusingExchange),
        Arc::new(MemoryRecordStore::new()),
    ))
}

/// Wire record of a place offered by `owner_id`
pub fn place_json(title: &str, owner_id: &str) -> serde_json::Value {
    serde_json::json!({
        "title": title,
        "description": "In the heart of the city",
        "imageUrl": "https://img.example/place.jpg",
        "price": 149.99,
        "availableFrom": "2019-01-01T00:00:00Z",
        "availableTo": "2019-12-31T00:00:00Z",
        "ownerId": owner_id
    })
}

/// Wire record of a two-guest booking of `place_id` by `owner_id`
pub fn booking_json(place_id: &str, owner_id: &str) -> serde_json::Value {
    serde_json::json!({
        "placeId": place_id,
        "placeTitle": "Manhattan Mansion",
        "placeImage": "https://img.example/place.jpg",
        "firstName": "Ada",
        "lastName": "Lovelace",
        "guestNumber": 2,
        "bookedFrom": "2019-03-01T00:00:00Z",
        "bookedTo": "2019-03-05T00:00:00Z",
        "ownerId": owner_id
    })
}

/// Create a temporary directory for testing
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temporary directory")
}

/// Create a test configuration YAML string
pub fn test_config_yaml() -> String {
    r#"
remote:
  database_url: https://staybook-test.firebaseio.example
  auth_url: https://identity.example/v1
  api_key: test-key

session:
  keyring_service: staybook-test
  keyring_user: session
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_logged_in_session_is_authenticated() {
        let session = logged_in_session("U1", "T1").await;
        assert_eq!(session.current_user_id().as_deref(), Some("U1"));
        assert_eq!(session.current_token().as_deref(), Some("T1"));
    }

    #[test]
    fn test_logged_out_session_has_no_identity() {
        let session = logged_out_session();
        assert!(session.current_user_id().is_none());
        assert!(session.current_token().is_none());
    }

    #[tokio::test]
    async fn test_refusing_exchange_fails_login() {
        let session = logged_out_session();
        assert!(session.login("a@b.com", "secret").await.is_err());
        assert!(!session.state().is_authenticated());
    }
}
