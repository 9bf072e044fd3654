//! # ruts-docstore: document-datastore sessions for Rust web applications
//!
//! `ruts-docstore` persists session state in a remote key-value document
//! service instead of process memory. It turns the four operations a session
//! middleware needs (load, save, destroy and refresh-expiry) into point
//! operations against a [`DocumentBackend`](backend::DocumentBackend), and
//! encodes session values with a pluggable [`SessionCodec`](codec::SessionCodec).
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use ruts_docstore::backend::memory::MemoryBackend;
//! use ruts_docstore::{DocumentStore, SessionStore};
//!
//! #[derive(serde::Serialize, serde::Deserialize, Debug, PartialEq)]
//! struct Visitor {
//!     user_id: i64,
//!     flags: Vec<String>,
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = DocumentStore::builder(Arc::new(MemoryBackend::new()))
//!         .prefix("session_of_users:")
//!         .ttl(3600)
//!         .build()
//!         .unwrap();
//!
//!     let visitor = Visitor { user_id: 42, flags: vec!["a".into(), "b".into()] };
//!     store.save("abc123", &visitor).await.unwrap();
//!
//!     let loaded: Option<Visitor> = store.load("abc123").await.unwrap();
//!     assert_eq!(loaded, Some(visitor));
//!
//!     store.destroy("abc123").await.unwrap();
//!     assert!(store.load::<Visitor>("abc123").await.unwrap().is_none());
//! }
//! ```
//!
//! # Records
//!
//! Every session is stored under `prefix + session_id` as a three-field
//! [`SessionRecord`](backend::SessionRecord): the session id, the encoded
//! payload and a `lastUsedAt` timestamp refreshed by every save and refresh.
//! A missing record is not an error: [`SessionStore::load`] returns `Ok(None)`.
//!
//! # Backends
//!
//! Each backend is enabled by a feature flag.
//!
//! ## Redis
//!
//! Requires the `redis-store` feature. Records are JSON strings and the
//! configured TTL is applied with `SET ... EX`.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use fred::clients::Client;
//! use ruts_docstore::backend::redis::RedisBackend;
//! use ruts_docstore::DocumentStore;
//!
//! let backend = RedisBackend::new(Arc::new(Client::default()));
//! let store = DocumentStore::new(Arc::new(backend));
//! ```
//!
//! ## Postgres
//!
//! Requires the `postgres-store` feature.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sqlx::PgPool;
//! use ruts_docstore::backend::postgres::PostgresBackendBuilder;
//! use ruts_docstore::DocumentStore;
//!
//! let pool = PgPool::connect(&database_url).await?;
//! let backend = PostgresBackendBuilder::new(pool, true)
//!     .table_name("user_sessions")
//!     .build()
//!     .await?;
//! let store = DocumentStore::new(Arc::new(backend));
//! ```
//!
//! # Serialization
//!
//! Payloads are JSON by default. The `messagepack` and `bincode` features add
//! binary codecs whose output is base64 text:
//!
//! ```rust,ignore
//! use ruts_docstore::codec::MessagePackCodec;
//!
//! let store = DocumentStore::builder(backend)
//!     .codec(MessagePackCodec)
//!     .build()?;
//! ```
//!
//! # Important Notes
//!
//! - `list_ids` and `list_all` are permanently unsupported and always fail
//!   with [`Error::Unsupported`] without contacting the backend.
//! - The store never retries. Backend failures are returned as
//!   [`Error::Backend`], or [`Error::Timeout`] when an operation timeout is set.
//! - Empty session ids are rejected with [`Error::InvalidId`].

#[cfg(feature = "redis-store")]
pub use fred;

#[cfg(feature = "postgres-store")]
pub use sqlx;

pub mod backend;

pub mod codec;

mod config;
pub use config::{MAX_TTL_SECS, StoreConfig, StoreOptions};

mod key;
pub use key::*;

pub mod store;
pub use store::{DocumentStore, DocumentStoreBuilder, Error, SessionStore};
