//! Session-gated request construction
//!
//! Every cache operation runs the same sequence:
//!
//! 1. snapshot the current user id (one read, not a subscription);
//! 2. fail with [`StaybookError::NoActiveSession`] if it is absent, before
//!    any network call;
//! 3. snapshot the current token the same way;
//! 4. attach `auth=<token>` and, for owner-scoped reads, the
//!    `orderBy`/`equalTo` filter on the snapshotted user id;
//! 5. hand the payload to the caller, or propagate the failure unchanged.

use std::sync::Arc;

use crate::auth::session::SessionStore;
use crate::error::{Result, StaybookError};
use crate::gateway::{collection_path, GatewayRequest, RemoteGateway};

/// Record field holding the creator's user id.
pub const OWNER_FIELD: &str = "ownerId";

/// Which records a collection read returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Every record the session may read.
    All,
    /// Only records whose owner is the session's user.
    Owned,
}

/// User id and token captured at the start of one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub user_id: String,
    pub token: String,
}

/// Request pipeline shared by every entity cache.
#[derive(Debug, Clone)]
pub struct SessionGatedPipeline {
    session: Arc<SessionStore>,
    gateway: Arc<dyn RemoteGateway>,
}

impl SessionGatedPipeline {
    pub fn new(session: Arc<SessionStore>, gateway: Arc<dyn RemoteGateway>) -> Self {
        Self { session, gateway }
    }

    /// Takes the two one-shot session snapshots.
    ///
    /// # Errors
    ///
    /// [`StaybookError::NoActiveSession`] when either value is absent.
    pub fn snapshot(&self) -> Result<SessionSnapshot> {
        let user_id = self
            .session
            .current_user_id()
            .ok_or(StaybookError::NoActiveSession)?;
        let token = self
            .session
            .current_token()
            .ok_or(StaybookError::NoActiveSession)?;
        Ok(SessionSnapshot { user_id, token })
    }

    /// Collection read honoring `scope`.
    pub fn collection_read(
        &self,
        collection: &str,
        scope: Scope,
        snapshot: &SessionSnapshot,
    ) -> GatewayRequest {
        let request = GatewayRequest::get(collection_path(collection));
        match scope {
            Scope::All => request,
            Scope::Owned => request
                .with_query("orderBy", format!("\"{}\"", OWNER_FIELD))
                .with_query("equalTo", format!("\"{}\"", snapshot.user_id)),
        }
    }

    /// Attaches the snapshotted token and performs `request`.
    pub async fn send(
        &self,
        snapshot: &SessionSnapshot,
        request: GatewayRequest,
    ) -> Result<serde_json::Value> {
        let request = request.with_query("auth", snapshot.token.as_str());
        tracing::debug!(method = %request.method, path = %request.path, "gated request");
        self.gateway.execute(request).await
    }

    /// Snapshot and send in one step.
    pub async fn run(&self, request: GatewayRequest) -> Result<serde_json::Value> {
        let snapshot = self.snapshot()?;
        self.send(&snapshot, request).await
    }
}
