//! Session cookie configuration.

use chrono::Duration;

pub const DEFAULT_COOKIE_NAME: &str = "token";
pub const DEFAULT_COOKIE_MAX_AGE_DAYS: i64 = 365;

/// Everything needed to sign session tokens and shape the session cookie.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub secret: String,
    pub cookie_name: String,
    pub max_age: Duration,
    /// Sets the `Secure` attribute; enable behind HTTPS.
    pub secure: bool,
}

impl SessionConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            max_age: Duration::days(DEFAULT_COOKIE_MAX_AGE_DAYS),
            secure: false,
        }
    }

    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }
}
