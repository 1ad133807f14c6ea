//! Axum transport for satchel sessions.
//!
//! ```no_run
//! use axum::{middleware::from_fn_with_state, routing::get, Router};
//! use satchel_core::{SessionManager, SessionOptions};
//! use satchel_web::{session_middleware, CurrentSession};
//! use std::sync::Arc;
//!
//! async fn whoami(session: CurrentSession) -> String {
//!     session
//!         .get_string("user")
//!         .ok()
//!         .flatten()
//!         .unwrap_or_else(|| "anonymous".to_string())
//! }
//!
//! # fn build(manager: Arc<SessionManager>) -> Router {
//! Router::new()
//!     .route("/whoami", get(whoami))
//!     .layer(from_fn_with_state(manager, session_middleware))
//! # }
//! ```

pub mod middleware;
pub mod scope;
pub mod sink;

pub use middleware::{session_middleware, CurrentSession};
pub use scope::RequestSessions;
pub use sink::{set_cookie_value, CookieSink};
