//! The [`S3Store`] handle: the root of a namespace tree inside one bucket.

use crate::address::Address;
use crate::builder::StoreBuilder;
use crate::codec::KeyCodec;
use crate::error::StoreError;
use crate::keyspace::{Keyspace, Shared};
use crate::monitor::Monitor;
use async_trait::async_trait;
use keel_blob::{BlobError, Store};
use std::sync::Arc;
use tracing::debug;

/// A thread-safe handle on a namespace of the store.
///
/// Keyspaces and child namespaces are opened lazily through [`Store`] and
/// cached, so asking twice for the same name returns the same instance. All
/// handles opened from one store share its backend client and rate limiters.
///
/// # Example
///
/// ```rust
/// use keel_s3store::{Kv, MemoryBackend, PutOptions, S3Store, Store};
/// use std::sync::Arc;
///
/// # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
/// let store = S3Store::builder()
///     .bucket("reports")
///     .prefix("p")
///     .backend(Arc::new(MemoryBackend::new()))
///     .connect()
///     .await?;
///
/// let team = store.sub("team-a").await?;
/// let drafts = team.keyspace("drafts").await?;
/// drafts.put(PutOptions::new("q3", "numbers")).await?;
/// assert_eq!(drafts.get(b"q3").await?, b"numbers");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct S3Store {
    monitor: Arc<Monitor>,
}

impl S3Store {
    #[must_use = "The store is not opened until you call .connect()"]
    pub fn builder() -> StoreBuilder {
        StoreBuilder::new()
    }

    /// Opens the store described by `[prefix@]bucket:region[?read_qps=N&write_qps=N]`,
    /// creating the bucket when missing.
    ///
    /// # Errors
    /// [`StoreError::InvalidAddress`] for a malformed address and
    /// [`StoreError::Bucket`] when the bucket cannot be created.
    pub async fn open(address: &str) -> Result<Self, StoreError> {
        address.parse::<Address>()?.builder().connect().await
    }

    pub(crate) fn from_parts(shared: Arc<Shared>, codec: KeyCodec) -> Self {
        Self { monitor: Arc::new(Monitor::new(shared, codec)) }
    }

    /// The object-name prefix of this namespace.
    #[must_use]
    pub fn prefix(&self) -> &str {
        self.monitor.codec().prefix()
    }

    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.monitor.shared().bucket
    }

    /// Whether both handles refer to the same namespace instance.
    #[must_use]
    pub fn same_instance(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.monitor, &other.monitor)
    }
}

#[async_trait]
impl Store for S3Store {
    type Kv = Keyspace;

    async fn keyspace(&self, name: &str) -> Result<Keyspace, BlobError> {
        Ok(self.monitor.keyspace(name))
    }

    async fn sub(&self, name: &str) -> Result<Self, BlobError> {
        Ok(Self { monitor: self.monitor.sub(name) })
    }

    async fn close(&self) -> Result<(), BlobError> {
        debug!(bucket = self.bucket(), prefix = self.prefix(), "Closed store handle");
        Ok(())
    }
}
