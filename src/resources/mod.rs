//! Remote resource collections
//!
//! # Module Layout
//!
//! - [`pipeline`] -- session-gated request construction shared by every
//!   collection
//! - [`cache`]    -- the generic observable [`EntityCache`]
//! - [`places`]   -- offered places
//! - [`bookings`] -- the current user's bookings

pub mod bookings;
pub mod cache;
pub mod pipeline;
pub mod places;

pub use bookings::{Booking, BookingsCache, NewBooking};
pub use cache::{Entity, EntityCache};
pub use pipeline::{Scope, SessionGatedPipeline};
pub use places::{NewPlace, Place, PlaceFilter, PlacePatch, PlacesCache};
