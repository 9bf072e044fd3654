//! Document backends the [`DocumentStore`](crate::DocumentStore) persists into.
//!
//! A backend is a key-value document service. It only ever sees store keys
//! and [`SessionRecord`]s; key construction and payload encoding happen in
//! the store.

pub mod memory;

#[cfg(feature = "postgres-store")]
pub mod postgres;

#[cfg(feature = "redis-store")]
pub mod redis;

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

use crate::store::Error;

/// Fixed-width UTC format, so timestamps sort lexically.
const LAST_USED_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z");

/// The persisted unit of a session.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// The caller-supplied session id.
    pub id: String,
    /// The encoded session value, opaque to the store.
    pub payload: String,
    /// When the record was last saved or refreshed.
    pub last_used_at: String,
}

impl SessionRecord {
    /// Creates a record stamped with the current time.
    pub fn new(id: impl Into<String>, payload: String) -> Result<Self, Error> {
        Ok(Self {
            id: id.into(),
            payload,
            last_used_at: now_timestamp()?,
        })
    }
}

pub(crate) fn now_timestamp() -> Result<String, Error> {
    Ok(OffsetDateTime::now_utc().format(LAST_USED_FORMAT)?)
}

/// A remote key-value document service.
///
/// `ttl` is forwarded from the store configuration; backends without native
/// expiry may ignore it.
pub trait DocumentBackend: Send + Sync + 'static {
    /// Point lookup. Returns `Ok(None)` when nothing is stored at `key`.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<SessionRecord>, Error>> + Send;

    /// Inserts `record` at `key`, replacing whatever was there.
    fn upsert(
        &self,
        key: &str,
        record: &SessionRecord,
        ttl: Option<Duration>,
    ) -> impl Future<Output = Result<(), Error>> + Send;

    /// Overwrites the record at `key`.
    ///
    /// Fails with [`Error::DocumentMissing`] when no record exists.
    fn replace(
        &self,
        key: &str,
        record: &SessionRecord,
        ttl: Option<Duration>,
    ) -> impl Future<Output = Result<(), Error>> + Send;

    /// Deletes the record at `key`.
    ///
    /// Returns `false` if there was nothing to delete.
    fn remove(&self, key: &str) -> impl Future<Output = Result<bool, Error>> + Send;
}
