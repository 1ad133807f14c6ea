//! Effect combinators applied to matched entities
//!
//! Applying a handle across several finder matches is not atomic as a whole;
//! each match is locked only for the duration of its own invocation.

use crate::session::Session;
use crate::value::Value;

pub type Handle = Box<dyn Fn(&Session) + Send + Sync>;

/// Sequence several handles into one.
pub fn make_handle(handles: Vec<Handle>) -> Handle {
    Box::new(move |session| {
        for handle in &handles {
            handle(session);
        }
    })
}

/// Set a key in memory only; the change reaches the store on the entity's
/// next write-through.
pub fn set_entry(key: impl Into<String>, value: impl Into<Value>) -> Handle {
    let key = key.into();
    let value = value.into();
    Box::new(move |session| session.put_local(&key, value.clone()))
}
