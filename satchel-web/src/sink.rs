//! Cookie rendering of issued credentials

use parking_lot::Mutex;
use satchel_core::{Credential, CredentialSink};
use std::collections::HashMap;

/// Collects credentials issued during one exchange. Re-applying under the
/// same name replaces the earlier credential rather than duplicating it.
#[derive(Default)]
pub struct CookieSink {
    credentials: Mutex<HashMap<String, Credential>>,
}

impl CookieSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.lock().is_empty()
    }

    /// Drain the collected credentials.
    pub fn take(&self) -> Vec<Credential> {
        self.credentials.lock().drain().map(|(_, c)| c).collect()
    }
}

impl CredentialSink for CookieSink {
    fn apply(&self, credential: Credential) {
        self.credentials
            .lock()
            .insert(credential.name.clone(), credential);
    }
}

/// Render a credential as a `Set-Cookie` header value.
pub fn set_cookie_value(credential: &Credential) -> String {
    let mut parts = vec![format!("{}={}", credential.name, credential.value)];
    if !credential.path.is_empty() {
        parts.push(format!("Path={}", credential.path));
    }
    if let Some(domain) = &credential.domain {
        parts.push(format!("Domain={domain}"));
    }
    if let Some((expires, remaining)) = credential.expires {
        parts.push(format!(
            "Expires={}",
            expires.format("%a, %d %b %Y %H:%M:%S GMT")
        ));
        parts.push(format!("Max-Age={}", remaining.max(0)));
    }
    if credential.secure {
        parts.push("Secure".to_string());
    }
    if credential.http_only {
        parts.push("HttpOnly".to_string());
    }
    parts.join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn credential() -> Credential {
        Credential {
            name: "session".to_string(),
            value: "tok".to_string(),
            path: "/".to_string(),
            domain: None,
            secure: false,
            http_only: true,
            expires: None,
        }
    }

    #[test]
    fn renders_flags_and_path() {
        let value = set_cookie_value(&credential());
        assert_eq!(value, "session=tok; Path=/; HttpOnly");
    }

    #[test]
    fn renders_expiry_both_ways() {
        let mut c = credential();
        let expires = DateTime::<Utc>::UNIX_EPOCH + chrono::Duration::seconds(1_700_000_000);
        c.expires = Some((expires, 3600));
        let value = set_cookie_value(&c);
        assert!(value.contains("Expires=Tue, 14 Nov 2023 22:13:20 GMT"));
        assert!(value.contains("Max-Age=3600"));
    }

    #[test]
    fn max_age_never_goes_negative() {
        let mut c = credential();
        c.expires = Some((DateTime::<Utc>::UNIX_EPOCH, -5));
        assert!(set_cookie_value(&c).contains("Max-Age=0"));
    }

    #[test]
    fn reapplication_replaces() {
        let sink = CookieSink::new();
        let mut first = credential();
        first.value = "old".to_string();
        sink.apply(first);
        sink.apply(credential());

        let taken = sink.take();
        assert_eq!(taken.len(), 1);
        assert_eq!(taken[0].value, "tok");
        assert!(sink.is_empty());
    }
}
