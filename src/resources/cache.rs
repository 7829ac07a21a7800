//! Observable, session-gated entity cache
//!
//! [`EntityCache`] holds the process-local copy of one remote collection and
//! publishes it through an [`Observable`]. The cache is the single writer of
//! its collection and always replaces the whole sequence; nothing is mutated
//! in place.
//!
//! # Consistency
//!
//! - `fetch` replaces the collection with the decoded server payload (last
//!   fetch wins, no merge).
//! - `create` and `delete` take one snapshot of the collection after their
//!   network round trip, then republish the snapshot with one insert or
//!   removal on the following scheduler turn. Two such folds that overlap
//!   read the same snapshot, and the later publish drops the earlier
//!   mutation from the local view until the next `fetch`. The remote store
//!   stays correct.
//! - `update` snapshots before its PUT and republishes that snapshot with
//!   the patched entity afterwards.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::WatchStream;
use uuid::Uuid;

use crate::error::{Result, StaybookError};
use crate::gateway::{collection_path, record_path, GatewayRequest};
use crate::observable::Observable;
use crate::resources::pipeline::{Scope, SessionGatedPipeline};

/// A domain value stored in a remote collection.
///
/// The wire `Record` carries every attribute except the identity, which is
/// the record's key in the collection.
pub trait Entity: Clone + std::fmt::Debug + Send + Sync + 'static {
    /// Wire form without identity.
    type Record: Serialize + DeserializeOwned + Send;

    /// Collection name (`offered-places`, `my-bookings`).
    const COLLECTION: &'static str;

    fn id(&self) -> &str;

    fn from_record(id: String, record: Self::Record) -> Self;

    fn to_record(&self) -> Self::Record;

    /// Same entity under a different identity.
    fn with_id(self, id: String) -> Self;
}

/// Body returned by the store for a POST.
#[derive(Debug, Deserialize)]
struct CreatedKey {
    name: String,
}

/// Decodes a `{ key: record }` payload; `null` is an empty collection.
///
/// Any malformed record fails the whole decode.
pub fn decode_collection<T: Entity>(payload: serde_json::Value) -> Result<Vec<T>> {
    if payload.is_null() {
        return Ok(Vec::new());
    }
    let records: BTreeMap<String, T::Record> =
        serde_json::from_value(payload).map_err(StaybookError::Serialization)?;
    Ok(records
        .into_iter()
        .map(|(id, record)| T::from_record(id, record))
        .collect())
}

/// Process-held observable copy of one remote collection.
#[derive(Debug)]
pub struct EntityCache<T: Entity> {
    pipeline: SessionGatedPipeline,
    scope: Scope,
    items: Observable<Vec<T>>,
}

impl<T: Entity> EntityCache<T> {
    /// Creates an empty cache reading `scope` records.
    pub fn new(pipeline: SessionGatedPipeline, scope: Scope) -> Self {
        Self {
            pipeline,
            scope,
            items: Observable::new(Vec::new()),
        }
    }

    /// One-shot snapshot of the collection.
    pub fn items(&self) -> Vec<T> {
        self.items.get()
    }

    /// Stream of the collection: latest value first, then every publish.
    pub fn subscribe(&self) -> WatchStream<Vec<T>> {
        self.items.stream()
    }

    /// Replaces the collection with the server's current truth.
    ///
    /// # Errors
    ///
    /// [`StaybookError::NoActiveSession`] without a session; transport and
    /// decode failures propagate and leave the cache untouched.
    pub async fn fetch(&self) -> Result<Vec<T>> {
        let session = self.pipeline.snapshot()?;
        let request = self
            .pipeline
            .collection_read(T::COLLECTION, self.scope, &session);
        let payload = self.pipeline.send(&session, request).await?;

        let fetched = decode_collection::<T>(payload)?;
        tracing::debug!(collection = T::COLLECTION, count = fetched.len(), "fetched collection");
        self.items.replace(fetched.clone());
        Ok(fetched)
    }

    /// Reads one record without touching the cache.
    ///
    /// # Errors
    ///
    /// [`StaybookError::NotFound`] when the store has no record under `id`.
    pub async fn get(&self, id: &str) -> Result<T> {
        let session = self.pipeline.snapshot()?;
        let path = record_path(T::COLLECTION, id)?;
        let payload = self
            .pipeline
            .send(&session, GatewayRequest::get(path.as_str()))
            .await?;
        if payload.is_null() {
            return Err(StaybookError::NotFound(path).into());
        }
        let record: T::Record =
            serde_json::from_value(payload).map_err(StaybookError::Serialization)?;
        Ok(T::from_record(id.to_string(), record))
    }

    /// Creates an entity built by `build(placeholder_id, owner_id)`.
    ///
    /// `build` runs after the session check and before the POST; an error
    /// from it aborts the create without a network call. The candidate never
    /// reaches the cache under its placeholder id; only the finalized entity
    /// carrying the server-assigned key is published.
    pub async fn create<F>(&self, build: F) -> Result<T>
    where
        F: FnOnce(String, String) -> Result<T> + Send,
    {
        let session = self.pipeline.snapshot()?;
        let placeholder = Uuid::new_v4().to_string();
        let candidate = build(placeholder.clone(), session.user_id.clone())?;

        let body = serde_json::to_value(candidate.to_record()).map_err(StaybookError::Serialization)?;
        let payload = self
            .pipeline
            .send(
                &session,
                GatewayRequest::post(collection_path(T::COLLECTION), body),
            )
            .await?;
        let created: CreatedKey =
            serde_json::from_value(payload).map_err(StaybookError::Serialization)?;

        let entity = candidate.with_id(created.name);
        tracing::debug!(
            collection = T::COLLECTION,
            %placeholder,
            id = entity.id(),
            "created entity"
        );

        let appended = entity.clone();
        self.fold(move |mut items| {
            items.push(appended);
            items
        })
        .await;
        Ok(entity)
    }

    /// Deletes the record under `id`; a missing local entry is not an error.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let session = self.pipeline.snapshot()?;
        let path = record_path(T::COLLECTION, id)?;
        self.pipeline
            .send(&session, GatewayRequest::delete(path))
            .await?;

        tracing::debug!(collection = T::COLLECTION, id, "deleted entity");
        self.fold(|mut items| {
            items.retain(|item| item.id() != id);
            items
        })
        .await;
        Ok(())
    }

    /// Replaces the entity under `id` with `patch(old)`.
    ///
    /// Fetches first when the local snapshot is empty; otherwise the local
    /// snapshot is trusted as it is.
    ///
    /// # Errors
    ///
    /// [`StaybookError::NotFound`] when no entity with `id` is known.
    pub async fn update<F>(&self, id: &str, patch: F) -> Result<T>
    where
        F: FnOnce(&T) -> T + Send,
    {
        let session = self.pipeline.snapshot()?;
        let path = record_path(T::COLLECTION, id)?;
        let mut items = self.items.get();
        if items.is_empty() {
            items = self.fetch().await?;
        }

        let index = items
            .iter()
            .position(|item| item.id() == id)
            .ok_or_else(|| StaybookError::NotFound(path.clone()))?;
        let updated = patch(&items[index]).with_id(id.to_string());

        let body = serde_json::to_value(updated.to_record()).map_err(StaybookError::Serialization)?;
        self.pipeline
            .send(&session, GatewayRequest::put(path, body))
            .await?;

        items[index] = updated.clone();
        tracing::debug!(collection = T::COLLECTION, id, "updated entity");
        self.items.replace(items);
        Ok(updated)
    }

    async fn fold<F>(&self, apply: F)
    where
        F: FnOnce(Vec<T>) -> Vec<T>,
    {
        let snapshot = self.items.get();
        // Publish on the next scheduler turn; folds overlapping here share
        // `snapshot` and the later publish wins.
        tokio::task::yield_now().await;
        self.items.replace(apply(snapshot));
    }
}
