//! Application context
//!
//! [`App`] wires the one long-lived [`SessionStore`] to one cache per
//! resource collection. Every collaborator is shared by `Arc`; there is no
//! global state.

use std::sync::Arc;

use crate::auth::exchange::{CredentialExchange, HttpCredentialExchange};
use crate::auth::record_store::{KeyringRecordStore, SessionRecordStore};
use crate::auth::session::SessionStore;
use crate::config::Config;
use crate::error::Result;
use crate::gateway::http::{HttpGateway, HttpImageStore};
use crate::gateway::{ImageStore, RemoteGateway};
use crate::resources::bookings::BookingsCache;
use crate::resources::pipeline::SessionGatedPipeline;
use crate::resources::places::PlacesCache;

/// Session plus the caches gated on it.
#[derive(Debug)]
pub struct App {
    pub session: Arc<SessionStore>,
    pub places: PlacesCache,
    pub bookings: BookingsCache,
}

impl App {
    /// Assembles an application from explicit collaborators.
    pub fn new(
        gateway: Arc<dyn RemoteGateway>,
        images: Arc<dyn ImageStore>,
        exchange: Arc<dyn CredentialExchange>,
        records: Arc<dyn SessionRecordStore>,
    ) -> Self {
        let session = Arc::new(SessionStore::new(exchange, records));
        let pipeline = SessionGatedPipeline::new(session.clone(), gateway);
        Self {
            places: PlacesCache::new(pipeline.clone(), images),
            bookings: BookingsCache::new(pipeline),
            session,
        }
    }

    /// HTTP gateway, HTTP credential exchange and keyring-backed session.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when a configured URL does not parse
    pub fn from_config(config: &Config) -> Result<Self> {
        let gateway = HttpGateway::new(config.database_url()?);
        let images = HttpImageStore::new(config.image_upload_url()?);
        let exchange = HttpCredentialExchange::new(config.auth_url()?, config.remote.api_key.clone());
        let records = KeyringRecordStore::new(
            config.session.keyring_service.clone(),
            config.session.keyring_user.clone(),
        );
        tracing::debug!(database_url = %gateway.base_url(), "application wired");
        Ok(Self::new(
            Arc::new(gateway),
            Arc::new(images),
            Arc::new(exchange),
            Arc::new(records),
        ))
    }
}
