//! Satchel core: per-client session state for stateless request/response
//! exchanges.
//!
//! The crate provides the session entity (a keyed map of typed values with
//! write-through persistence and expiry bookkeeping), the store contract
//! concrete backends implement, the manager with its per-process directory
//! and background expiry sweep, and predicate/effect combinators for
//! administrative queries over resident entities.
//!
//! ```no_run
//! use satchel_core::{SessionManager, SessionOptions, LocalScope};
//! # use satchel_core::store::SessionStore;
//! # async fn demo(store: std::sync::Arc<dyn SessionStore>) -> satchel_core::SessionResult<()> {
//! let manager = SessionManager::new(store, SessionOptions::default());
//! let scope = LocalScope::new();
//! let session = manager.load(&scope, None).await?;
//! session.put("visits", 1i32).await?;
//! assert_eq!(session.get_int("visits")?, Some(1));
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod error;
pub mod finder;
pub mod handle;
pub mod logging;
pub mod manager;
pub mod options;
pub mod session;
pub mod store;
pub mod value;
pub mod writer;

pub use error::{SessionError, SessionResult};
pub use manager::SessionManager;
pub use options::SessionOptions;
pub use session::Session;
pub use store::{
    Credential, CredentialSink, LocalScope, RequestScope, SessionStore, StoreCapabilities,
};
pub use value::Value;
pub use writer::SessionWriter;
