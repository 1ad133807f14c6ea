//! Predicate combinators over directory-resident entities
//!
//! A finder only ever sees the directory snapshot it is applied to; sessions
//! that live solely in the store are invisible to it.

use crate::session::Session;
use crate::value::Value;

pub type Finder = Box<dyn Fn(&Session) -> bool + Send + Sync>;

/// Conjunction of finders with short-circuiting AND.
pub fn make_finder(finders: Vec<Finder>) -> Finder {
    Box::new(move |session| finders.iter().all(|finder| finder(session)))
}

/// Match by stable identity.
pub fn by_id(id: impl Into<String>) -> Finder {
    let id = id.into();
    Box::new(move |session| session.id() == id)
}

/// Match by current transport credential.
pub fn by_token(token: impl Into<String>) -> Finder {
    let token = token.into();
    Box::new(move |session| session.token() == token)
}

/// Match by exact key/value equality on stored data. A decoded numeric
/// intermediate does not equal a typed integer until an accessor resolves it.
pub fn by_entry(key: impl Into<String>, value: impl Into<Value>) -> Finder {
    let key = key.into();
    let value = value.into();
    Box::new(move |session| session.get(&key).as_ref() == Some(&value))
}

/// Match entities whose effective expiry has not passed.
pub fn live() -> Finder {
    Box::new(|session| !session.is_expired())
}

/// Match entities whose effective expiry has passed.
pub fn expired() -> Finder {
    Box::new(|session| session.is_expired())
}
