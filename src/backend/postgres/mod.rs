use crate::backend::{DocumentBackend, SessionRecord};
use crate::config::MAX_TTL_SECS;
use crate::store::Error;
use sqlx::PgPool;
use std::time::Duration;

/// A builder for creating a `PostgresBackend`.
///
/// This allows for customizing the table and schema names for session documents.
#[derive(Debug)]
pub struct PostgresBackendBuilder {
    pool: PgPool,
    table_name: String,
    create_table: bool,
    schema_name: Option<String>,
    cleanup_interval: Option<Duration>,
}

impl PostgresBackendBuilder {
    /// Creates a new builder with a database pool and default settings.
    pub fn new(pool: PgPool, create_table: bool) -> Self {
        Self {
            pool,
            table_name: "t_session_documents".to_string(),
            create_table,
            schema_name: None,
            cleanup_interval: None,
        }
    }

    /// Sets a custom table name. Defaults to "t_session_documents".
    pub fn table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = table_name.into();
        self
    }

    /// Sets a custom schema name.
    pub fn schema_name(mut self, schema_name: impl Into<String>) -> Self {
        self.schema_name = Some(schema_name.into());
        self
    }

    /// Spawns a background task that deletes expired documents at this interval.
    ///
    /// Without it, expired documents are only hidden from reads.
    pub fn cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = Some(interval);
        self
    }

    /// Builds the `PostgresBackend`, creating the schema and table if requested.
    pub async fn build(self) -> Result<PostgresBackend, sqlx::Error> {
        let table_name = if let Some(schema) = &self.schema_name {
            format!("\"{}\".\"{}\"", schema, self.table_name)
        } else {
            format!("\"{}\"", self.table_name)
        };

        if self.create_table {
            if let Some(schema) = &self.schema_name {
                sqlx::query(&format!("create schema if not exists \"{schema}\""))
                    .execute(&self.pool)
                    .await?;
            }

            sqlx::raw_sql(&format!(
                r#"
                create table if not exists {table_name} (
                    key text primary key,
                    id text not null,
                    payload text not null,
                    last_used_at text not null,
                    expires_at timestamptz
                );
                create index if not exists "idx_{index}_expires_at" on {table_name}(expires_at);
                "#,
                index = self.table_name,
            ))
            .execute(&self.pool)
            .await?;
        }

        if let Some(interval) = self.cleanup_interval {
            let pool = self.pool.clone();
            let table = table_name.clone();

            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(interval);
                loop {
                    ticker.tick().await;
                    let result = sqlx::query(&format!(
                        "delete from {table} where expires_at is not null and expires_at < now()"
                    ))
                    .execute(&pool)
                    .await;

                    if let Err(err) = result {
                        tracing::warn!(err = %err, "failed to purge expired session documents");
                    }
                }
            });
        }

        Ok(PostgresBackend {
            pool: self.pool,
            table_name,
        })
    }
}

/// A Postgres-backed document backend.
#[derive(Clone, Debug)]
pub struct PostgresBackend {
    pool: PgPool,
    table_name: String,
}

fn ttl_secs(ttl: Option<Duration>) -> Result<Option<f64>, Error> {
    match ttl {
        Some(ttl) if ttl.as_secs() > MAX_TTL_SECS => Err(Error::TtlOutOfRange(ttl)),
        Some(ttl) => Ok(Some(ttl.as_secs_f64())),
        None => Ok(None),
    }
}

impl DocumentBackend for PostgresBackend {
    async fn get(&self, key: &str) -> Result<Option<SessionRecord>, Error> {
        let query = format!(
            r#"
            select id, payload, last_used_at
            from {table}
            where key = $1
              and (expires_at is null or expires_at > now())
            "#,
            table = self.table_name
        );

        let row: Option<(String, String, String)> = sqlx::query_as(&query)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|(id, payload, last_used_at)| SessionRecord {
            id,
            payload,
            last_used_at,
        }))
    }

    async fn upsert(
        &self,
        key: &str,
        record: &SessionRecord,
        ttl: Option<Duration>,
    ) -> Result<(), Error> {
        let expires_in = ttl_secs(ttl)?;
        let query = format!(
            r#"
            insert into {table} (key, id, payload, last_used_at, expires_at)
            values ($1, $2, $3, $4, now() + make_interval(secs => $5))
            on conflict (key) do update
            set
                id = excluded.id,
                payload = excluded.payload,
                last_used_at = excluded.last_used_at,
                expires_at = excluded.expires_at
            "#,
            table = self.table_name
        );

        sqlx::query(&query)
            .bind(key)
            .bind(&record.id)
            .bind(&record.payload)
            .bind(&record.last_used_at)
            .bind(expires_in)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn replace(
        &self,
        key: &str,
        record: &SessionRecord,
        ttl: Option<Duration>,
    ) -> Result<(), Error> {
        let expires_in = ttl_secs(ttl)?;
        let query = format!(
            r#"
            update {table}
            set
                id = $2,
                payload = $3,
                last_used_at = $4,
                expires_at = now() + make_interval(secs => $5)
            where key = $1
              and (expires_at is null or expires_at > now())
            "#,
            table = self.table_name
        );

        let result = sqlx::query(&query)
            .bind(key)
            .bind(&record.id)
            .bind(&record.payload)
            .bind(&record.last_used_at)
            .bind(expires_in)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::DocumentMissing(key.to_string()));
        }

        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool, Error> {
        let query = format!(
            "delete from {table} where key = $1",
            table = self.table_name
        );
        let result = sqlx::query(&query)
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_secs_bounds() {
        assert_eq!(ttl_secs(None).unwrap(), None);
        assert_eq!(ttl_secs(Some(Duration::from_secs(60))).unwrap(), Some(60.0));
        assert!(matches!(
            ttl_secs(Some(Duration::from_secs(u64::MAX))),
            Err(Error::TtlOutOfRange(_))
        ));
    }
}
