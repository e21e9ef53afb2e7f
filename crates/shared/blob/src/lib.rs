//! # Blob
//!
//! The uniform contract every keel storage backend satisfies: a flat keyspace of
//! opaque byte keys bound to opaque byte values, grouped into named keyspaces and
//! nested sub-stores.
//!
//! * [`Kv`]: `get`, `put`, `delete`, `has`, `list`, `len` on one keyspace.
//! * [`Store`]: hands out keyspaces and sub-stores by name.
//! * [`BlobError`]: the shared error taxonomy. `KeyNotFound` and `KeyExists`
//!   are expected outcomes, not faults.
//!
//! Listing is a [`KeyStream`] in strictly increasing key order. Stop early by
//! dropping the stream, or use [`Kv::for_each_key`] and return
//! [`ControlFlow::Break`] from the visitor; neither is reported as an error.

mod error;
mod key;

pub use error::{BlobError, BlobErrorExt, BoxError};
pub use key::{display_key, parse_key};
pub use std::ops::ControlFlow;

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::BoxStream;
use std::fmt;

/// Keys in increasing order, as produced by [`Kv::list`].
pub type KeyStream = BoxStream<'static, Result<Vec<u8>, BlobError>>;

/// Arguments to [`Kv::put`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutOptions {
    pub key: Vec<u8>,
    pub data: Vec<u8>,
    /// When false, an existing key is left untouched and the put fails with
    /// [`BlobError::KeyExists`].
    pub replace: bool,
}

impl PutOptions {
    #[must_use]
    pub fn new(key: impl Into<Vec<u8>>, data: impl Into<Vec<u8>>) -> Self {
        Self { key: key.into(), data: data.into(), replace: false }
    }

    #[must_use]
    pub const fn replace(mut self, replace: bool) -> Self {
        self.replace = replace;
        self
    }
}

/// A flat keyspace of byte keys and byte values.
#[async_trait]
pub trait Kv: Send + Sync + fmt::Debug {
    /// Fetches the full value stored under `key`.
    ///
    /// # Errors
    /// [`BlobError::KeyNotFound`] if the key is empty or absent.
    async fn get(&self, key: &[u8]) -> Result<Vec<u8>, BlobError>;

    /// Stores a value, honoring [`PutOptions::replace`].
    ///
    /// # Errors
    /// [`BlobError::KeyNotFound`] for an empty key, [`BlobError::KeyExists`] when
    /// `replace` is false and the key is present.
    async fn put(&self, opts: PutOptions) -> Result<(), BlobError>;

    /// Removes an existing key.
    ///
    /// # Errors
    /// [`BlobError::KeyNotFound`] if the key is not present.
    async fn delete(&self, key: &[u8]) -> Result<(), BlobError>;

    /// Reports which of `keys` are present, sorted and without duplicates.
    async fn has(&self, keys: &[Vec<u8>]) -> Result<Vec<Vec<u8>>, BlobError>;

    /// Streams every key `>= start` in increasing order.
    fn list(&self, start: &[u8]) -> KeyStream;

    /// Counts the keys currently present.
    async fn len(&self) -> Result<u64, BlobError>;

    /// Visits keys `>= start` in order until the visitor breaks or the keys run out.
    ///
    /// # Errors
    /// Propagates the first listing error; a [`ControlFlow::Break`] is not an error.
    async fn for_each_key<F>(&self, start: &[u8], mut visit: F) -> Result<(), BlobError>
    where
        Self: Sized,
        F: FnMut(&[u8]) -> ControlFlow<()> + Send,
    {
        let mut keys = self.list(start);
        while let Some(key) = keys.next().await {
            if visit(&key?).is_break() {
                break;
            }
        }
        Ok(())
    }
}

/// A named collection of keyspaces and nested stores.
#[async_trait]
pub trait Store: Send + Sync + fmt::Debug {
    type Kv: Kv;

    /// Returns the keyspace called `name`; the empty name is the store's own keyspace.
    async fn keyspace(&self, name: &str) -> Result<Self::Kv, BlobError>;

    /// Returns the nested store called `name`.
    async fn sub(&self, name: &str) -> Result<Self, BlobError>
    where
        Self: Sized;

    /// Releases the store.
    async fn close(&self) -> Result<(), BlobError>;
}
