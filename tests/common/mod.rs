#![allow(dead_code)]

use parking_lot::Mutex;
use ruts_docstore::Error;
use ruts_docstore::backend::memory::MemoryBackend;
use ruts_docstore::backend::{DocumentBackend, SessionRecord};
use serde::{Deserialize, Serialize, Serializer};
use std::io;
use std::time::Duration;

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct TestUser {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct TestPreferences {
    pub theme: String,
    pub language: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct TestSession {
    pub user: TestUser,
    pub preferences: TestPreferences,
}

pub fn create_test_session() -> TestSession {
    TestSession {
        user: TestUser {
            id: 1,
            name: "Test User".to_string(),
        },
        preferences: TestPreferences {
            theme: "dark".to_string(),
            language: "en".to_string(),
        },
    }
}

/// The `{userId: 42, flags: ["a","b"]}` session.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Visitor {
    pub user_id: i64,
    pub flags: Vec<String>,
}

pub fn create_visitor() -> Visitor {
    Visitor {
        user_id: 42,
        flags: vec!["a".to_string(), "b".to_string()],
    }
}

/// A value whose serialization always fails.
pub struct Unencodable;

impl Serialize for Unencodable {
    fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
        Err(serde::ser::Error::custom("value cannot be encoded"))
    }
}

/// Fails the test if any operation reaches it.
#[derive(Debug, Default)]
pub struct PanickingBackend;

impl DocumentBackend for PanickingBackend {
    async fn get(&self, key: &str) -> Result<Option<SessionRecord>, Error> {
        panic!("backend contacted: get({key})")
    }

    async fn upsert(
        &self,
        key: &str,
        _record: &SessionRecord,
        _ttl: Option<Duration>,
    ) -> Result<(), Error> {
        panic!("backend contacted: upsert({key})")
    }

    async fn replace(
        &self,
        key: &str,
        _record: &SessionRecord,
        _ttl: Option<Duration>,
    ) -> Result<(), Error> {
        panic!("backend contacted: replace({key})")
    }

    async fn remove(&self, key: &str) -> Result<bool, Error> {
        panic!("backend contacted: remove({key})")
    }
}

fn connection_refused() -> Error {
    Error::backend(io::Error::new(
        io::ErrorKind::ConnectionRefused,
        "connection refused",
    ))
}

/// Every operation fails as if the service were unreachable.
#[derive(Debug, Default)]
pub struct FailingBackend;

impl DocumentBackend for FailingBackend {
    async fn get(&self, _key: &str) -> Result<Option<SessionRecord>, Error> {
        Err(connection_refused())
    }

    async fn upsert(
        &self,
        _key: &str,
        _record: &SessionRecord,
        _ttl: Option<Duration>,
    ) -> Result<(), Error> {
        Err(connection_refused())
    }

    async fn replace(
        &self,
        _key: &str,
        _record: &SessionRecord,
        _ttl: Option<Duration>,
    ) -> Result<(), Error> {
        Err(connection_refused())
    }

    async fn remove(&self, _key: &str) -> Result<bool, Error> {
        Err(connection_refused())
    }
}

/// Waits `delay` before every operation.
#[derive(Debug)]
pub struct SlowBackend {
    pub delay: Duration,
    pub inner: MemoryBackend,
}

impl DocumentBackend for SlowBackend {
    async fn get(&self, key: &str) -> Result<Option<SessionRecord>, Error> {
        tokio::time::sleep(self.delay).await;
        self.inner.get(key).await
    }

    async fn upsert(
        &self,
        key: &str,
        record: &SessionRecord,
        ttl: Option<Duration>,
    ) -> Result<(), Error> {
        tokio::time::sleep(self.delay).await;
        self.inner.upsert(key, record, ttl).await
    }

    async fn replace(
        &self,
        key: &str,
        record: &SessionRecord,
        ttl: Option<Duration>,
    ) -> Result<(), Error> {
        tokio::time::sleep(self.delay).await;
        self.inner.replace(key, record, ttl).await
    }

    async fn remove(&self, key: &str) -> Result<bool, Error> {
        tokio::time::sleep(self.delay).await;
        self.inner.remove(key).await
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub operation: &'static str,
    pub key: String,
    pub ttl: Option<Duration>,
}

/// A memory backend that records every call it receives.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub inner: MemoryBackend,
    pub calls: Mutex<Vec<Call>>,
}

impl RecordingBackend {
    fn record(&self, operation: &'static str, key: &str, ttl: Option<Duration>) {
        self.calls.lock().push(Call {
            operation,
            key: key.to_string(),
            ttl,
        });
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }
}

impl DocumentBackend for RecordingBackend {
    async fn get(&self, key: &str) -> Result<Option<SessionRecord>, Error> {
        self.record("get", key, None);
        self.inner.get(key).await
    }

    async fn upsert(
        &self,
        key: &str,
        record: &SessionRecord,
        ttl: Option<Duration>,
    ) -> Result<(), Error> {
        self.record("upsert", key, ttl);
        self.inner.upsert(key, record, ttl).await
    }

    async fn replace(
        &self,
        key: &str,
        record: &SessionRecord,
        ttl: Option<Duration>,
    ) -> Result<(), Error> {
        self.record("replace", key, ttl);
        self.inner.replace(key, record, ttl).await
    }

    async fn remove(&self, key: &str) -> Result<bool, Error> {
        self.record("remove", key, None);
        self.inner.remove(key).await
    }
}
