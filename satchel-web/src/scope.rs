//! Request-scoped cache of resolved entities

use satchel_core::{LocalScope, RequestScope, Session};
use std::sync::Arc;

/// Cloneable [`RequestScope`] shared between the middleware and anything else
/// resolving sessions within one request.
#[derive(Clone, Default)]
pub struct RequestSessions {
    inner: Arc<LocalScope>,
}

impl RequestSessions {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RequestScope for RequestSessions {
    fn get(&self, name: &str) -> Option<Arc<Session>> {
        self.inner.get(name)
    }

    fn set(&self, name: &str, session: Arc<Session>) {
        self.inner.set(name, session)
    }
}
