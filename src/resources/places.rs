//! Offered places
//!
//! [`PlacesCache`] is the [`EntityCache`] over the `offered-places`
//! collection. Every authenticated user reads every place; only the title
//! and description of an existing place can be edited. Place images are
//! uploaded separately through an [`ImageStore`] and referenced by URL.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::WatchStream;

use crate::error::{Result, StaybookError};
use crate::gateway::{ImageStore, ImageUpload, StoredImage};
use crate::resources::cache::{Entity, EntityCache};
use crate::resources::pipeline::{Scope, SessionGatedPipeline};

/// Geographic position picked for a place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceLocation {
    pub lat: f64,
    pub lng: f64,
    pub address: String,
    pub static_map_image_url: String,
}

/// Wire form of a place, keyed by its id in the collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceData {
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub price: f64,
    pub available_from: DateTime<Utc>,
    pub available_to: DateTime<Utc>,
    pub owner_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<PlaceLocation>,
}

/// A place offered for booking.
#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    pub id: String,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub price: f64,
    pub available_from: DateTime<Utc>,
    pub available_to: DateTime<Utc>,
    pub owner_id: String,
    pub location: Option<PlaceLocation>,
}

impl Place {
    /// A user cannot book a place they offer.
    pub fn is_bookable_by(&self, user_id: &str) -> bool {
        self.owner_id != user_id
    }
}

impl Entity for Place {
    type Record = PlaceData;
    const COLLECTION: &'static str = "offered-places";

    fn id(&self) -> &str {
        &self.id
    }

    fn from_record(id: String, record: PlaceData) -> Self {
        Place {
            id,
            title: record.title,
            description: record.description,
            image_url: record.image_url,
            price: record.price,
            available_from: record.available_from,
            available_to: record.available_to,
            owner_id: record.owner_id,
            location: record.location,
        }
    }

    fn to_record(&self) -> PlaceData {
        PlaceData {
            title: self.title.clone(),
            description: self.description.clone(),
            image_url: self.image_url.clone(),
            price: self.price,
            available_from: self.available_from,
            available_to: self.available_to,
            owner_id: self.owner_id.clone(),
            location: self.location.clone(),
        }
    }

    fn with_id(self, id: String) -> Self {
        Place { id, ..self }
    }
}

/// Attributes of a place being offered.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPlace {
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub price: f64,
    pub available_from: DateTime<Utc>,
    pub available_to: DateTime<Utc>,
    pub location: Option<PlaceLocation>,
}

impl NewPlace {
    fn check(&self) -> Result<()> {
        if self.available_to < self.available_from {
            return Err(StaybookError::InvalidInput(
                "availability must end after it starts".to_string(),
            )
            .into());
        }
        Ok(())
    }

    fn into_place(self, id: String, owner_id: String) -> Place {
        Place {
            id,
            title: self.title,
            description: self.description,
            image_url: self.image_url,
            price: self.price,
            available_from: self.available_from,
            available_to: self.available_to,
            owner_id,
            location: self.location,
        }
    }
}

/// Editable fields of an existing place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacePatch {
    pub title: String,
    pub description: String,
}

/// Which places the discover listing shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaceFilter {
    #[default]
    All,
    /// Places the user could book: everything they do not own.
    Bookable,
}

impl PlaceFilter {
    pub fn apply(self, places: &[Place], user_id: &str) -> Vec<Place> {
        places
            .iter()
            .filter(|place| match self {
                PlaceFilter::All => true,
                PlaceFilter::Bookable => place.is_bookable_by(user_id),
            })
            .cloned()
            .collect()
    }
}

/// Observable cache of offered places.
#[derive(Debug)]
pub struct PlacesCache {
    pipeline: SessionGatedPipeline,
    images: Arc<dyn ImageStore>,
    cache: EntityCache<Place>,
}

impl PlacesCache {
    pub fn new(pipeline: SessionGatedPipeline, images: Arc<dyn ImageStore>) -> Self {
        Self {
            cache: EntityCache::new(pipeline.clone(), Scope::All),
            pipeline,
            images,
        }
    }

    pub fn items(&self) -> Vec<Place> {
        self.cache.items()
    }

    pub fn subscribe(&self) -> WatchStream<Vec<Place>> {
        self.cache.subscribe()
    }

    pub async fn fetch_places(&self) -> Result<Vec<Place>> {
        self.cache.fetch().await
    }

    /// Reads one place from the store; the cache is not consulted.
    pub async fn get_place(&self, id: &str) -> Result<Place> {
        self.cache.get(id).await
    }

    /// Offers a new place owned by the current user.
    ///
    /// # Errors
    ///
    /// [`StaybookError::NoActiveSession`] without a session, otherwise
    /// [`StaybookError::InvalidInput`] when availability ends before it
    /// starts.
    pub async fn add_place(&self, place: NewPlace) -> Result<Place> {
        self.cache
            .create(move |id, owner_id| {
                place.check()?;
                Ok(place.into_place(id, owner_id))
            })
            .await
    }

    /// Uploads an image for a place; the returned URL goes into
    /// [`NewPlace::image_url`].
    pub async fn upload_image(&self, image: ImageUpload) -> Result<StoredImage> {
        let session = self.pipeline.snapshot()?;
        let stored = self.images.store(image, &session.token).await?;
        tracing::debug!(path = %stored.image_path, "image stored");
        Ok(stored)
    }

    /// Replaces the title and description of place `id`.
    pub async fn update_place(&self, id: &str, patch: PlacePatch) -> Result<Place> {
        self.cache
            .update(id, move |old| Place {
                title: patch.title,
                description: patch.description,
                ..old.clone()
            })
            .await
    }
}
