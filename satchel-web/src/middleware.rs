//! Session middleware
//!
//! Resolves the inbound cookie to an entity before the handler runs, exposes
//! a [`SessionWriter`] through request extensions, and emits `Set-Cookie`
//! headers for every credential issued during the exchange. When the handler
//! never wrote, an advisory touch keeps the idle window sliding and issues
//! the cookie for a fresh session.

use crate::scope::RequestSessions;
use crate::sink::{set_cookie_value, CookieSink};
use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use satchel_core::{SessionManager, SessionWriter};
use std::ops::Deref;
use std::sync::Arc;
use tracing::error;

/// Extracts the request's [`SessionWriter`]. Requires the session middleware
/// to run first.
#[derive(Clone)]
pub struct CurrentSession(pub SessionWriter);

impl Deref for CurrentSession {
    type Target = SessionWriter;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionWriter>()
            .cloned()
            .map(CurrentSession)
            .ok_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

/// Install with `axum::middleware::from_fn_with_state(manager, session_middleware)`.
pub async fn session_middleware(
    State(manager): State<Arc<SessionManager>>,
    mut request: Request,
    next: Next,
) -> Response {
    let name = manager.options().cookie_name.clone();
    let token = request
        .headers()
        .get(header::COOKIE)
        .and_then(|raw| raw.to_str().ok())
        .and_then(|raw| cookie_value(raw, &name));

    let scope = RequestSessions::new();
    let session = match manager.load(&scope, token.as_deref()).await {
        Ok(session) => session,
        Err(err) => {
            error!("session load failed: {err}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let sink = Arc::new(CookieSink::new());
    let writer = SessionWriter::new(session.clone(), sink.clone());
    request.extensions_mut().insert(writer.clone());
    request.extensions_mut().insert(scope);

    let mut response = next.run(request).await;

    // a fresh session has no cookie yet, and under an idle-timeout policy the
    // window only slides on write
    let untouched = sink.is_empty() && !session.is_destroyed();
    if untouched && (session.last_access().is_none() || session.may_touch()) {
        if let Err(err) = writer.touch().await {
            error!("session refresh failed: {err}");
        }
    }

    for credential in sink.take() {
        match HeaderValue::from_str(&set_cookie_value(&credential)) {
            Ok(value) => apply_set_cookie(response.headers_mut(), &credential.name, value),
            Err(err) => error!("unencodable cookie for {}: {err}", credential.name),
        }
    }
    response
}

/// Extract a cookie's value from a `Cookie` header.
fn cookie_value(raw: &str, name: &str) -> Option<String> {
    raw.split(';')
        .map(str::trim)
        .find_map(|pair| {
            pair.strip_prefix(name)
                .and_then(|rest| rest.strip_prefix('='))
        })
        .map(str::to_string)
}

/// Append a `Set-Cookie` header, replacing any prior header for the same
/// cookie name rather than duplicating it.
fn apply_set_cookie(headers: &mut HeaderMap, name: &str, value: HeaderValue) {
    let prefix = format!("{name}=");
    let retained: Vec<HeaderValue> = headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter(|existing| {
            existing
                .to_str()
                .map(|s| !s.starts_with(&prefix))
                .unwrap_or(true)
        })
        .cloned()
        .collect();
    headers.remove(header::SET_COOKIE);
    for existing in retained {
        headers.append(header::SET_COOKIE, existing);
    }
    headers.append(header::SET_COOKIE, value);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_value_finds_the_named_cookie() {
        let raw = "theme=dark; session=abc123; lang=en";
        assert_eq!(cookie_value(raw, "session"), Some("abc123".to_string()));
        assert_eq!(cookie_value(raw, "missing"), None);
    }

    #[test]
    fn cookie_value_does_not_match_prefixes() {
        let raw = "sessionid=other; session=abc";
        assert_eq!(cookie_value(raw, "session"), Some("abc".to_string()));
    }

    #[test]
    fn set_cookie_replacement_keeps_other_names() {
        let mut headers = HeaderMap::new();
        headers.append(
            header::SET_COOKIE,
            HeaderValue::from_static("session=old; Path=/"),
        );
        headers.append(
            header::SET_COOKIE,
            HeaderValue::from_static("theme=dark; Path=/"),
        );

        apply_set_cookie(
            &mut headers,
            "session",
            HeaderValue::from_static("session=new; Path=/"),
        );

        let values: Vec<&str> = headers
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect();
        assert_eq!(values, vec!["theme=dark; Path=/", "session=new; Path=/"]);
    }
}
