use crate::backend::{DocumentBackend, SessionRecord};
use crate::store::Error;
use fred::clients::Pool;
use fred::interfaces::KeysInterface;
use fred::types::{Expiration, SetOptions};
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

/// A redis document backend.
///
/// Each record is stored as a JSON string value at its key. A forwarded TTL
/// is applied with `SET ... EX`, so Redis evicts expired sessions itself.
#[derive(Clone, Debug)]
pub struct RedisBackend<C: KeysInterface + Clone + Send + Sync = Pool> {
    client: Arc<C>,
}

impl<C> RedisBackend<C>
where
    C: KeysInterface + Clone + Send + Sync,
{
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }
}

fn expiration(ttl: Option<Duration>) -> Result<Option<Expiration>, Error> {
    ttl.map(|ttl| {
        i64::try_from(ttl.as_secs().max(1))
            .map(Expiration::EX)
            .map_err(|_| Error::TtlOutOfRange(ttl))
    })
    .transpose()
}

fn encode_record(record: &SessionRecord) -> Result<String, Error> {
    serde_json::to_string(record).map_err(|e| Error::Encode(e.to_string()))
}

impl<C> DocumentBackend for RedisBackend<C>
where
    C: KeysInterface + Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Result<Option<SessionRecord>, Error> {
        let document = self.client.get::<Option<String>, _>(key).await?;

        let record = if let Some(document) = document {
            Some(serde_json::from_str(&document).map_err(|e| Error::Decode(e.to_string()))?)
        } else {
            None
        };

        Ok(record)
    }

    async fn upsert(
        &self,
        key: &str,
        record: &SessionRecord,
        ttl: Option<Duration>,
    ) -> Result<(), Error> {
        let document = encode_record(record)?;
        let _: () = self
            .client
            .set(key, document, expiration(ttl)?, None, false)
            .await?;
        Ok(())
    }

    async fn replace(
        &self,
        key: &str,
        record: &SessionRecord,
        ttl: Option<Duration>,
    ) -> Result<(), Error> {
        let document = encode_record(record)?;
        let reply: Option<String> = self
            .client
            .set(key, document, expiration(ttl)?, Some(SetOptions::XX), false)
            .await?;

        match reply {
            Some(_) => Ok(()),
            None => Err(Error::DocumentMissing(key.to_string())),
        }
    }

    async fn remove(&self, key: &str) -> Result<bool, Error> {
        let deleted: i64 = self.client.del(key).await?;
        Ok(deleted > 0)
    }
}
