//! Session configuration
//!
//! Options are immutable once a manager is constructed. Durations of zero
//! passed to the idle/touch builders mean "disabled" and normalize to `None`.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Per-manager session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionOptions {
    /// Name of the transport credential
    pub cookie_name: String,
    pub cookie_path: String,
    pub cookie_domain: Option<String>,
    pub secure: bool,
    pub http_only: bool,
    /// When false the credential carries no explicit expiry and ends with the
    /// client session
    pub persist: bool,
    /// Absolute lifetime; the deadline is fixed at creation
    pub lifetime: Duration,
    /// Sliding inactivity window; `None` disables idle expiry
    pub idle_timeout: Option<Duration>,
    /// Minimum gap between advisory touch refreshes; `None` means a touch is
    /// always advisable while an idle timeout is configured
    pub touch_interval: Option<Duration>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            cookie_name: "session".to_string(),
            cookie_path: "/".to_string(),
            cookie_domain: None,
            secure: false,
            http_only: true,
            persist: true,
            lifetime: Duration::from_secs(24 * 60 * 60),
            idle_timeout: None,
            touch_interval: None,
        }
    }
}

impl SessionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    pub fn with_cookie_path(mut self, path: impl Into<String>) -> Self {
        self.cookie_path = path.into();
        self
    }

    pub fn with_cookie_domain(mut self, domain: impl Into<String>) -> Self {
        self.cookie_domain = Some(domain.into());
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn with_http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    pub fn with_persist(mut self, persist: bool) -> Self {
        self.persist = persist;
        self
    }

    pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }

    pub fn with_idle_timeout(mut self, idle: Duration) -> Self {
        self.idle_timeout = if idle.is_zero() { None } else { Some(idle) };
        self
    }

    pub fn with_touch_interval(mut self, interval: Duration) -> Self {
        self.touch_interval = if interval.is_zero() {
            None
        } else {
            Some(interval)
        };
        self
    }

    pub(crate) fn lifetime_chrono(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.lifetime).unwrap_or(chrono::Duration::MAX)
    }

    pub(crate) fn idle_chrono(&self) -> Option<chrono::Duration> {
        self.idle_timeout
            .and_then(|d| chrono::Duration::from_std(d).ok())
    }

    pub(crate) fn touch_chrono(&self) -> Option<chrono::Duration> {
        self.touch_interval
            .and_then(|d| chrono::Duration::from_std(d).ok())
    }
}
