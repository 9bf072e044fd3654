use serde::{Serialize, de::DeserializeOwned};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::backend::{DocumentBackend, SessionRecord};
use crate::codec::{JsonCodec, SessionCodec};
use crate::config::{LOG_ERRORS, LOG_OPERATIONS, LOG_PAYLOADS, StoreConfig, StoreOptions};
use crate::key::build_key;
use crate::store::{Error, SessionStore};

/// A builder for creating a [`DocumentStore`].
///
/// Settings are copied into an immutable [`StoreConfig`] when [`build`](Self::build)
/// is called; the builder validates them there.
pub struct DocumentStoreBuilder<B, S = JsonCodec> {
    backend: Arc<B>,
    codec: S,
    options: StoreOptions,
}

impl<B> DocumentStoreBuilder<B, JsonCodec>
where
    B: DocumentBackend,
{
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            codec: JsonCodec,
            options: StoreOptions::default(),
        }
    }
}

impl<B, S> DocumentStoreBuilder<B, S>
where
    B: DocumentBackend,
    S: SessionCodec,
{
    /// Replaces every setting with `options`.
    pub fn options(mut self, options: StoreOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the key namespace. Defaults to `"session_of_users:"`.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.options.prefix = prefix.into();
        self
    }

    pub fn scan_batch_size(mut self, size: u32) -> Self {
        self.options.scan_batch_size = size;
        self
    }

    /// Sets the expiry, in seconds, forwarded to the backend on every write.
    pub fn ttl(mut self, seconds: u64) -> Self {
        self.options.ttl = Some(seconds);
        self
    }

    /// Keeps the configured TTL but stops forwarding it.
    pub fn disable_ttl(mut self) -> Self {
        self.options.disable_ttl = true;
        self
    }

    pub fn verbosity(mut self, verbosity: u32) -> Self {
        self.options.verbosity = verbosity;
        self
    }

    /// Bounds every backend call.
    ///
    /// The limit has millisecond resolution; fractions are rounded up.
    pub fn operation_timeout(mut self, limit: Duration) -> Self {
        let millis = limit.as_nanos().div_ceil(1_000_000);
        self.options.operation_timeout_ms = Some(u64::try_from(millis).unwrap_or(u64::MAX));
        self
    }

    /// Swaps the payload codec.
    pub fn codec<C>(self, codec: C) -> DocumentStoreBuilder<B, C>
    where
        C: SessionCodec,
    {
        DocumentStoreBuilder {
            backend: self.backend,
            codec,
            options: self.options,
        }
    }

    pub fn build(self) -> Result<DocumentStore<B, S>, Error> {
        let config = StoreConfig::from_options(self.options)?;

        Ok(DocumentStore {
            backend: self.backend,
            codec: self.codec,
            config: Arc::new(config),
        })
    }
}

/// A session store that persists each session as a document in a
/// [`DocumentBackend`].
///
/// The store keeps no state between calls beyond its read-only configuration.
/// Concurrent writes to the same session race at the backend.
pub struct DocumentStore<B, S = JsonCodec> {
    backend: Arc<B>,
    codec: S,
    config: Arc<StoreConfig>,
}

impl<B, S: Clone> Clone for DocumentStore<B, S> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            codec: self.codec.clone(),
            config: Arc::clone(&self.config),
        }
    }
}

impl<B, S: fmt::Debug> fmt::Debug for DocumentStore<B, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentStore")
            .field("codec", &self.codec)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<B> DocumentStore<B, JsonCodec>
where
    B: DocumentBackend,
{
    /// Creates a store with the default configuration.
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            codec: JsonCodec,
            config: Arc::new(StoreConfig::default()),
        }
    }

    pub fn builder(backend: Arc<B>) -> DocumentStoreBuilder<B, JsonCodec> {
        DocumentStoreBuilder::new(backend)
    }
}

impl<B, S> DocumentStore<B, S>
where
    B: DocumentBackend,
    S: SessionCodec,
{
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// The backend key `session_id` is stored under.
    pub fn key(&self, session_id: &str) -> Result<String, Error> {
        build_key(self.config.prefix(), session_id)
    }

    async fn call<F, R>(&self, operation: F) -> Result<R, Error>
    where
        F: Future<Output = Result<R, Error>> + Send,
    {
        match self.config.operation_timeout() {
            Some(limit) => tokio::time::timeout(limit, operation)
                .await
                .map_err(|_| Error::Timeout(limit))?,
            None => operation.await,
        }
    }

    fn failed(&self, err: Error, message: &'static str) -> Error {
        if self.config.logs(LOG_ERRORS) {
            tracing::error!(err = %err, "{message}");
        }
        err
    }

    async fn fetch<T>(&self, session_id: &str) -> Result<Option<T>, Error>
    where
        T: DeserializeOwned,
    {
        let key = self.key(session_id)?;
        let Some(record) = self.call(self.backend.get(&key)).await? else {
            if self.config.logs(LOG_OPERATIONS) {
                tracing::debug!(key = %key, "no session stored");
            }
            return Ok(None);
        };

        if self.config.logs(LOG_PAYLOADS) {
            tracing::trace!(key = %key, bytes = record.payload.len(), "decoding session payload");
        }

        let value = self.codec.decode(&record.payload)?;

        if self.config.logs(LOG_OPERATIONS) {
            tracing::debug!(key = %key, "session loaded");
        }

        Ok(Some(value))
    }

    fn prepare<T>(&self, session_id: &str, value: &T) -> Result<(String, SessionRecord), Error>
    where
        T: Serialize + ?Sized,
    {
        let payload = self.codec.encode(value)?;
        let key = self.key(session_id)?;

        if self.config.logs(LOG_PAYLOADS) {
            tracing::trace!(key = %key, bytes = payload.len(), "encoded session payload");
        }

        Ok((key, SessionRecord::new(session_id, payload)?))
    }

    async fn write<T>(&self, session_id: &str, value: &T) -> Result<(), Error>
    where
        T: Serialize + Sync,
    {
        let (key, record) = self.prepare(session_id, value)?;
        self.call(
            self.backend
                .upsert(&key, &record, self.config.effective_ttl()),
        )
        .await?;

        if self.config.logs(LOG_OPERATIONS) {
            tracing::debug!(key = %key, last_used_at = %record.last_used_at, "session saved");
        }

        Ok(())
    }

    async fn touch<T>(&self, session_id: &str, value: &T) -> Result<(), Error>
    where
        T: Serialize + Sync,
    {
        let (key, record) = self.prepare(session_id, value)?;
        self.call(
            self.backend
                .replace(&key, &record, self.config.effective_ttl()),
        )
        .await?;

        if self.config.logs(LOG_OPERATIONS) {
            tracing::debug!(key = %key, last_used_at = %record.last_used_at, "session refreshed");
        }

        Ok(())
    }

    async fn remove(&self, session_id: &str) -> Result<(), Error> {
        let key = self.key(session_id)?;
        let existed = self.call(self.backend.remove(&key)).await?;

        if self.config.logs(LOG_OPERATIONS) {
            tracing::debug!(key = %key, existed, "session destroyed");
        }

        Ok(())
    }
}

impl<B, S> SessionStore for DocumentStore<B, S>
where
    B: DocumentBackend,
    S: SessionCodec,
{
    #[tracing::instrument(name = "loading session from store", skip(self))]
    async fn load<T>(&self, session_id: &str) -> Result<Option<T>, Error>
    where
        T: DeserializeOwned + Send,
    {
        self.fetch(session_id)
            .await
            .map_err(|err| self.failed(err, "failed to load session from store"))
    }

    #[tracing::instrument(name = "saving session to store", skip(self, value))]
    async fn save<T>(&self, session_id: &str, value: &T) -> Result<(), Error>
    where
        T: Serialize + Sync,
    {
        self.write(session_id, value)
            .await
            .map_err(|err| self.failed(err, "failed to save session to store"))
    }

    #[tracing::instrument(name = "deleting session from store", skip(self))]
    async fn destroy(&self, session_id: &str) -> Result<(), Error> {
        self.remove(session_id)
            .await
            .map_err(|err| self.failed(err, "failed to delete session from store"))
    }

    #[tracing::instrument(name = "refreshing session expiry", skip(self, value))]
    async fn refresh_expiry<T>(&self, session_id: &str, value: &T) -> Result<(), Error>
    where
        T: Serialize + Sync,
    {
        self.touch(session_id, value)
            .await
            .map_err(|err| self.failed(err, "failed to refresh session expiry"))
    }

    /// Always fails with [`Error::Unsupported`]; the backend is never contacted.
    async fn list_ids(&self) -> Result<Vec<String>, Error> {
        Err(self.failed(
            Error::Unsupported("list_ids"),
            "listing session ids is not supported",
        ))
    }

    /// Always fails with [`Error::Unsupported`]; the backend is never contacted.
    async fn list_all<T>(&self) -> Result<Vec<T>, Error>
    where
        T: DeserializeOwned + Send,
    {
        Err(self.failed(
            Error::Unsupported("list_all"),
            "listing sessions is not supported",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::MemoryBackend;

    #[test]
    fn test_builder_copies_settings() {
        let store = DocumentStore::builder(Arc::new(MemoryBackend::new()))
            .prefix("app:")
            .scan_batch_size(25)
            .ttl(60)
            .verbosity(0)
            .operation_timeout(Duration::from_millis(250))
            .build()
            .unwrap();

        let config = store.config();
        assert_eq!(config.prefix(), "app:");
        assert_eq!(config.scan_batch_size(), 25);
        assert_eq!(config.effective_ttl(), Some(Duration::from_secs(60)));
        assert_eq!(config.verbosity(), 0);
        assert_eq!(config.operation_timeout(), Some(Duration::from_millis(250)));
        assert_eq!(store.key("abc").unwrap(), "app:abc");
    }

    #[test]
    fn test_sub_millisecond_timeout_rounds_up() {
        let store = DocumentStore::builder(Arc::new(MemoryBackend::new()))
            .operation_timeout(Duration::from_micros(500))
            .build()
            .unwrap();
        assert_eq!(store.config().operation_timeout(), Some(Duration::from_millis(1)));

        let store = DocumentStore::builder(Arc::new(MemoryBackend::new()))
            .operation_timeout(Duration::from_micros(1500))
            .build()
            .unwrap();
        assert_eq!(store.config().operation_timeout(), Some(Duration::from_millis(2)));
    }

    #[test]
    fn test_builder_rejects_out_of_range_ttl() {
        let result = DocumentStore::builder(Arc::new(MemoryBackend::new()))
            .ttl(u64::MAX)
            .build();
        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("ttl")));
    }

    #[test]
    fn test_builder_rejects_empty_prefix() {
        let result = DocumentStore::builder(Arc::new(MemoryBackend::new()))
            .prefix("")
            .build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_builder_from_options() {
        let options: StoreOptions =
            serde_json::from_str(r#"{ "prefix": "cfg:", "ttl": 30, "disable_ttl": true }"#).unwrap();
        let store = DocumentStore::builder(Arc::new(MemoryBackend::new()))
            .options(options)
            .build()
            .unwrap();

        assert_eq!(store.config().prefix(), "cfg:");
        assert_eq!(store.config().ttl(), Some(Duration::from_secs(30)));
        assert_eq!(store.config().effective_ttl(), None);
    }

    #[tokio::test]
    async fn test_record_carries_id_and_timestamp() {
        let backend = Arc::new(MemoryBackend::new());
        let store = DocumentStore::new(Arc::clone(&backend));

        store.save("abc123", &vec![1, 2, 3]).await.unwrap();

        let record = backend
            .get("session_of_users:abc123")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.id, "abc123");
        assert_eq!(record.payload, "[1,2,3]");
        assert!(record.last_used_at.ends_with('Z'));
    }
}
