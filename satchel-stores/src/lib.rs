//! Store backends for satchel sessions.
//!
//! - [`MemoryStore`]: fast and volatile, with an optional snapshot file for
//!   restarts.
//! - [`SqliteStore`] (feature `sqlite`): durable, queryable, with an optional
//!   background cleanup of expired rows.
//! - [`ClientStore`]: stateless; the credential itself carries the
//!   HMAC-authenticated payload and no server-side record exists.

pub mod client;
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use client::ClientStore;
pub use memory::MemoryStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;
