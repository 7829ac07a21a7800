//! Staybook - session-gated place booking library
//!
//! This library keeps a process-wide authenticated session and mirrors
//! remotely stored places and bookings into observable local caches, gating
//! every remote call on the session token.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `auth`: Credential exchange, session record persistence and the
//!   session state machine
//! - `observable`: Current-value slot with replay to new subscribers
//! - `gateway`: Transport to the remote JSON document store
//! - `resources`: Session-gated pipeline and the entity caches
//! - `app`: Wiring of the session and caches
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli` / `commands`: Command-line interface and handlers
//!
//! # Example
//!
//! ```no_run
//! use staybook::{App, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     config.validate()?;
//!
//!     let app = App::from_config(&config)?;
//!     if app.session.auto_login().await? {
//!         let places = app.places.fetch_places().await?;
//!         println!("{} places on offer", places.len());
//!     }
//!     Ok(())
//! }
//! ```

pub mod app;
pub mod auth;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod gateway;
pub mod observable;
pub mod resources;

// Re-export commonly used types
pub use app::App;
pub use auth::{Session, SessionState, SessionStore};
pub use config::Config;
pub use error::{AuthError, Result, StaybookError};
pub use observable::Observable;
pub use resources::{Booking, BookingsCache, EntityCache, Place, PlacesCache};

#[cfg(test)]
pub mod test_utils;
