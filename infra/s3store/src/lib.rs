//! Byte keyspaces stored as objects in one S3 bucket.
//!
//! Each keyspace maps opaque byte keys to objects named
//! `<prefix>/<shard>/<tail>`, where shard and tail are the lowercase hex of the
//! key split at a fixed width. The naming preserves key order, so a keyspace
//! lists in key order straight from the bucket listing.
//!
//! # Core Features
//!
//! - **Namespaces**: [`S3Store`] hands out keyspaces and nested stores by name,
//!   created on first use and cached. Child names become hex-encoded prefix
//!   segments, so arbitrary names never collide with key paths.
//! - **Ordered Listing**: [`Kv::list`] pages through the bucket lazily and skips
//!   objects that do not belong to the keyspace.
//! - **Partitioned Counting**: [`Kv::len`] scans the 256 first-byte partitions
//!   concurrently.
//! - **Rate Limiting**: separate read and write token buckets per store, shared
//!   by every keyspace opened from it.
//! - **Cancellation**: a [`CallContext`] bound with [`Keyspace::with_context`]
//!   interrupts rate-limit waits and in-flight requests.
//!
//! # Architectural Overview
//!
//! 1.  **[`S3Store`]**: the namespace tree and entry point.
//! 2.  **[`Keyspace`]**: the [`Kv`] implementation for one prefix.
//! 3.  **[`ObjectBackend`]**: the object-store operations, implemented by
//!     [`S3Backend`] and the in-process [`MemoryBackend`].
//! 4.  **[`StoreBuilder`]**: a type-safe builder, also reachable through
//!     [`Address`] and [`StoreConfig`].
//!
//! # Examples
//!
//! ```rust
//! use keel_s3store::{Kv, MemoryBackend, PutOptions, S3Store, Store};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = S3Store::builder()
//!         .bucket("reports")
//!         .prefix("p")
//!         .backend(Arc::new(MemoryBackend::new()))
//!         .connect()
//!         .await?;
//!
//!     let kv = store.keyspace("").await?;
//!     kv.put(PutOptions::new("ab", "2024")).await?;
//!     assert_eq!(kv.get(b"ab").await?, b"2024");
//!     assert_eq!(kv.codec().encode(b"ab"), "p/616/2");
//!     assert_eq!(kv.len().await?, 1);
//!
//!     Ok(())
//! }
//! ```

mod address;
mod backend;
mod builder;
mod codec;
mod config;
mod context;
mod engine;
mod error;
mod keyspace;
mod listing;
mod monitor;
mod waiter;

pub use address::Address;
pub use backend::{
    BackendError, BackendErrorExt, ListPage, ListRequest, MemoryBackend, ObjectBackend, ObjectHead,
    S3Backend, S3ClientOptions,
};
pub use builder::{NoBucket, StoreBuilder, WithBucket};
pub use codec::{DEFAULT_SHARD_WIDTH, KeyCodec, KeyCodecError, KeyCodecErrorExt, MAX_SHARD_WIDTH};
pub use config::StoreConfig;
pub use context::CallContext;
pub use engine::S3Store;
pub use error::{StoreError, StoreErrorExt};
pub use keyspace::Keyspace;
pub use listing::prev_key;
pub use waiter::{TokenBucket, Unlimited, Waiter, limiter};

pub use keel_blob::{BlobError, BlobErrorExt, ControlFlow, KeyStream, Kv, PutOptions, Store};
pub use tokio_util::sync::CancellationToken;
