mod document;
pub use document::*;

use serde::{Serialize, de::DeserializeOwned};
use std::future::Future;
use std::time::Duration;

/// An opaque error raised by a backend's transport.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Encoding failed with: {0}")]
    Encode(String),

    #[error("Decoding failed with: {0}")]
    Decode(String),

    #[error("store communication failed: {0}")]
    Backend(#[source] BoxError),

    #[error("no document exists at `{0}`")]
    DocumentMissing(String),

    #[error("store operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("ttl of {0:?} is out of range for this store")]
    TtlOutOfRange(Duration),

    #[error("failed to format timestamp: {0}")]
    Timestamp(#[from] time::error::Format),

    #[error("`{0}` is not supported by this store")]
    Unsupported(&'static str),

    #[error("session id must not be empty")]
    InvalidId,

    #[error("invalid store configuration: {0}")]
    Config(String),
}

impl Error {
    /// Wraps a transport failure from any backend client.
    pub fn backend<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        Error::Backend(err.into())
    }
}

#[cfg(feature = "redis-store")]
impl From<fred::error::Error> for Error {
    fn from(err: fred::error::Error) -> Self {
        Error::backend(err)
    }
}

#[cfg(feature = "postgres-store")]
impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Error::backend(err)
    }
}

/// The storage contract a session middleware relies on.
///
/// Every call resolves exactly once, either with its value or with an [`Error`].
pub trait SessionStore: Clone + Send + Sync + 'static {
    /// Loads the session stored at `session_id`.
    ///
    /// Returns `Ok(None)` when no session exists, which is not an error.
    fn load<T>(&self, session_id: &str) -> impl Future<Output = Result<Option<T>, Error>> + Send
    where
        T: DeserializeOwned + Send;

    /// Stores `value` at `session_id`, fully replacing any previous session.
    fn save<T>(&self, session_id: &str, value: &T) -> impl Future<Output = Result<(), Error>> + Send
    where
        T: Serialize + Sync;

    /// Deletes the session at `session_id`.
    ///
    /// Deleting a session that does not exist succeeds.
    fn destroy(&self, session_id: &str) -> impl Future<Output = Result<(), Error>> + Send;

    /// Re-asserts `value` for an existing session and refreshes its last-used timestamp.
    fn refresh_expiry<T>(
        &self,
        session_id: &str,
        value: &T,
    ) -> impl Future<Output = Result<(), Error>> + Send
    where
        T: Serialize + Sync;

    /// Lists every stored session id.
    fn list_ids(&self) -> impl Future<Output = Result<Vec<String>, Error>> + Send;

    /// Loads every stored session.
    fn list_all<T>(&self) -> impl Future<Output = Result<Vec<T>, Error>> + Send
    where
        T: DeserializeOwned + Send;
}
