//! Session authentication
//!
//! # Module Layout
//!
//! - [`exchange`]     -- email/password credential exchange with the
//!   identity endpoint
//! - [`record_store`] -- persistence of the single session credential
//!   record
//! - [`session`]      -- the session life-cycle state machine

pub mod exchange;
pub mod record_store;
pub mod session;

pub use exchange::{AuthMode, CredentialExchange, HttpCredentialExchange};
pub use record_store::{KeyringRecordStore, MemoryRecordStore, SessionRecord, SessionRecordStore};
pub use session::{Session, SessionState, SessionStore};
