//! An unofficial interface to the CourseHub learning platform's API.

#![forbid(unsafe_code)]

#[cfg(test)]
#[macro_use]
extern crate pretty_assertions;

mod claims;
mod config;
pub mod cookie;
pub mod endpoints;
mod id;
pub mod notify;
pub mod router;
mod selection;
mod session;
mod storage;

pub use claims::{Claims, Role, TokenError};
pub use config::Config;
pub use endpoints::{ApiClient, EndpointError};
pub use id::CourseId;
pub use selection::CourseSelection;
pub use session::{AuthState, Session, SessionError, UserInfo};
pub use storage::{FileStorage, MemoryStorage, TokenStorage, TOKEN_KEY};

/// An opaque payload (course, knowledge point, user, analytics) exchanged
/// with the backend.
pub type Record = serde_json::Value;

/// The default user agent to use when communicating with the CourseHub
/// server.
pub const DEFAULT_USER_AGENT: &str =
    concat!(env!("CARGO_PKG_NAME"), "-", env!("CARGO_PKG_VERSION"));

/// Seconds since the Unix epoch, saturating at zero for times before it.
pub(crate) fn unix_seconds(time: std::time::SystemTime) -> i64 {
    time.duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
