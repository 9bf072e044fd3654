use crate::backend::{DocumentBackend, SessionRecord};
use crate::store::Error;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct StoredDocument {
    record: SessionRecord,
    expires_at: Option<Instant>,
}

impl StoredDocument {
    fn new(record: &SessionRecord, ttl: Option<Duration>) -> Result<Self, Error> {
        let expires_at = match ttl {
            Some(ttl) => Some(
                Instant::now()
                    .checked_add(ttl)
                    .ok_or(Error::TtlOutOfRange(ttl))?,
            ),
            None => None,
        };

        Ok(Self {
            record: record.clone(),
            expires_at,
        })
    }

    fn is_live(&self) -> bool {
        self.expires_at.map(|e| e > Instant::now()).unwrap_or(true)
    }
}

/// An in-memory document backend.
///
/// Records live in a concurrent map keyed by store key. A forwarded TTL is
/// honoured lazily: expired records read as absent and are purged on the
/// next write.
///
/// ### Note
///
/// Do not use this in a production environment.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    documents: DashMap<String, StoredDocument>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            documents: DashMap::new(),
        }
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        self.documents.iter().filter(|doc| doc.is_live()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn cleanup_expired(&self) {
        self.documents.retain(|_, doc| doc.is_live());
    }
}

impl DocumentBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<SessionRecord>, Error> {
        Ok(self
            .documents
            .get(key)
            .filter(|doc| doc.is_live())
            .map(|doc| doc.record.clone()))
    }

    async fn upsert(
        &self,
        key: &str,
        record: &SessionRecord,
        ttl: Option<Duration>,
    ) -> Result<(), Error> {
        let document = StoredDocument::new(record, ttl)?;
        self.cleanup_expired();
        self.documents.insert(key.to_string(), document);
        Ok(())
    }

    async fn replace(
        &self,
        key: &str,
        record: &SessionRecord,
        ttl: Option<Duration>,
    ) -> Result<(), Error> {
        let document = StoredDocument::new(record, ttl)?;
        self.cleanup_expired();

        match self.documents.entry(key.to_string()) {
            Entry::Occupied(mut entry) => {
                entry.insert(document);
                Ok(())
            }
            Entry::Vacant(_) => Err(Error::DocumentMissing(key.to_string())),
        }
    }

    async fn remove(&self, key: &str) -> Result<bool, Error> {
        Ok(self
            .documents
            .remove(key)
            .map(|(_, doc)| doc.is_live())
            .unwrap_or(false))
    }
}
