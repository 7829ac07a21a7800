//! Bookings of the current user
//!
//! [`BookingsCache`] reads `my-bookings` filtered on the session's user, so
//! the cache only ever holds the user's own bookings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::WatchStream;

use crate::error::{Result, StaybookError};
use crate::resources::cache::{Entity, EntityCache};
use crate::resources::pipeline::{Scope, SessionGatedPipeline};
use crate::resources::places::Place;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingData {
    pub place_id: String,
    pub place_title: String,
    pub place_image: String,
    pub first_name: String,
    pub last_name: String,
    pub guest_number: u32,
    pub booked_from: DateTime<Utc>,
    pub booked_to: DateTime<Utc>,
    pub owner_id: String,
}

/// A reservation of a place by the current user.
#[derive(Debug, Clone, PartialEq)]
pub struct Booking {
    pub id: String,
    pub place_id: String,
    pub place_title: String,
    pub place_image: String,
    pub first_name: String,
    pub last_name: String,
    pub guest_number: u32,
    pub booked_from: DateTime<Utc>,
    pub booked_to: DateTime<Utc>,
    pub owner_id: String,
}

impl Entity for Booking {
    type Record = BookingData;
    const COLLECTION: &'static str = "my-bookings";

    fn id(&self) -> &str {
        &self.id
    }

    fn from_record(id: String, record: BookingData) -> Self {
        Booking {
            id,
            place_id: record.place_id,
            place_title: record.place_title,
            place_image: record.place_image,
            first_name: record.first_name,
            last_name: record.last_name,
            guest_number: record.guest_number,
            booked_from: record.booked_from,
            booked_to: record.booked_to,
            owner_id: record.owner_id,
        }
    }

    fn to_record(&self) -> BookingData {
        BookingData {
            place_id: self.place_id.clone(),
            place_title: self.place_title.clone(),
            place_image: self.place_image.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            guest_number: self.guest_number,
            booked_from: self.booked_from,
            booked_to: self.booked_to,
            owner_id: self.owner_id.clone(),
        }
    }

    fn with_id(self, id: String) -> Self {
        Booking { id, ..self }
    }
}

/// Attributes of a booking being made.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub place_id: String,
    pub place_title: String,
    pub place_image: String,
    pub first_name: String,
    pub last_name: String,
    pub guest_number: u32,
    pub booked_from: DateTime<Utc>,
    pub booked_to: DateTime<Utc>,
}

impl NewBooking {
    /// Booking of `place`, copying the title and image shown in listings.
    pub fn for_place(
        place: &Place,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        guest_number: u32,
        booked_from: DateTime<Utc>,
        booked_to: DateTime<Utc>,
    ) -> Self {
        Self {
            place_id: place.id.clone(),
            place_title: place.title.clone(),
            place_image: place.image_url.clone(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            guest_number,
            booked_from,
            booked_to,
        }
    }

    fn check(&self) -> Result<()> {
        if self.booked_to < self.booked_from {
            return Err(StaybookError::InvalidInput(
                "booking must end after it starts".to_string(),
            )
            .into());
        }
        if self.guest_number == 0 {
            return Err(StaybookError::InvalidInput("at least one guest is required".to_string()).into());
        }
        Ok(())
    }

    fn into_booking(self, id: String, owner_id: String) -> Booking {
        Booking {
            id,
            place_id: self.place_id,
            place_title: self.place_title,
            place_image: self.place_image,
            first_name: self.first_name,
            last_name: self.last_name,
            guest_number: self.guest_number,
            booked_from: self.booked_from,
            booked_to: self.booked_to,
            owner_id,
        }
    }
}

/// Observable cache of the user's bookings.
#[derive(Debug)]
pub struct BookingsCache {
    cache: EntityCache<Booking>,
}

impl BookingsCache {
    pub fn new(pipeline: SessionGatedPipeline) -> Self {
        Self {
            cache: EntityCache::new(pipeline, Scope::Owned),
        }
    }

    pub fn items(&self) -> Vec<Booking> {
        self.cache.items()
    }

    pub fn subscribe(&self) -> WatchStream<Vec<Booking>> {
        self.cache.subscribe()
    }

    pub async fn fetch_bookings(&self) -> Result<Vec<Booking>> {
        self.cache.fetch().await
    }

    /// Books a place for the current user.
    ///
    /// # Errors
    ///
    /// [`StaybookError::NoActiveSession`] without a session, otherwise
    /// [`StaybookError::InvalidInput`] when the stay ends before it starts
    /// or has no guests; nothing is sent in either case.
    pub async fn add_booking(&self, booking: NewBooking) -> Result<Booking> {
        self.cache
            .create(move |id, owner_id| {
                booking.check()?;
                Ok(booking.into_booking(id, owner_id))
            })
            .await
    }

    pub async fn cancel_booking(&self, id: &str) -> Result<()> {
        self.cache.delete(id).await
    }
}
