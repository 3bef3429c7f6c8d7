//! Mirroring the bearer token into a cookie.
//!
//! This is independent of [`crate::Session`]'s own persistence; nothing in
//! the session reads or writes these cookies.

use std::{
    fmt::{self, Display, Formatter},
    time::{Duration, SystemTime},
};

pub const COOKIE_NAME: &str = "auth_token";

/// A `Set-Cookie` value carrying the token for a limited time.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthCookie {
    value: String,
    max_age: Duration,
    expires: SystemTime,
}

impl AuthCookie {
    pub fn new(token: &str, minutes: u64, now: SystemTime) -> Self {
        let max_age = Duration::from_secs(minutes * 60);

        AuthCookie {
            value: token.to_string(),
            max_age,
            expires: now + max_age,
        }
    }

    /// A cookie which tells the browser to forget the token.
    pub fn clear() -> Self {
        AuthCookie {
            value: String::new(),
            max_age: Duration::from_secs(0),
            expires: SystemTime::UNIX_EPOCH,
        }
    }

    pub fn value(&self) -> &str { &self.value }

    pub fn expires(&self) -> SystemTime { self.expires }

    pub fn is_expired_at(&self, now: SystemTime) -> bool { self.expires <= now }
}

impl Display for AuthCookie {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.value.is_empty() {
            write!(
                f,
                "{}=; expires=Thu, 01 Jan 1970 00:00:00 GMT; Max-Age=0; Path=/",
                COOKIE_NAME
            )
        } else {
            write!(
                f,
                "{}={}; Max-Age={}; Path=/",
                COOKIE_NAME,
                self.value,
                self.max_age.as_secs()
            )
        }
    }
}
