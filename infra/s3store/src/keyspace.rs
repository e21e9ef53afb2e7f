use crate::backend::ObjectBackend;
use crate::codec::KeyCodec;
use crate::context::CallContext;
use crate::listing;
use crate::waiter::Waiter;
use async_trait::async_trait;
use futures::future::try_join_all;
use keel_blob::{BlobError, BlobErrorExt, KeyStream, Kv, PutOptions, display_key};
use std::sync::Arc;
use tracing::debug;

/// State shared by every keyspace and namespace opened from one store.
#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) backend: Arc<dyn ObjectBackend>,
    pub(crate) bucket: String,
    pub(crate) read: Arc<dyn Waiter>,
    pub(crate) write: Arc<dyn Waiter>,
}

#[derive(Debug)]
struct Inner {
    shared: Arc<Shared>,
    codec: KeyCodec,
}

/// One keyspace: every key lives under the codec's prefix in the store's bucket.
///
/// Cheap to clone. Clones share the same keyspace instance; use
/// [`with_context`](Self::with_context) to run calls under a cancellation token
/// or deadline.
#[derive(Debug, Clone)]
pub struct Keyspace {
    inner: Arc<Inner>,
    ctx: CallContext,
}

impl Keyspace {
    pub(crate) fn new(shared: Arc<Shared>, codec: KeyCodec) -> Self {
        Self { inner: Arc::new(Inner { shared, codec }), ctx: CallContext::default() }
    }

    /// A handle on the same keyspace whose calls are bound to `ctx`.
    #[must_use]
    pub fn with_context(&self, ctx: CallContext) -> Self {
        Self { inner: Arc::clone(&self.inner), ctx }
    }

    #[must_use]
    pub const fn context(&self) -> &CallContext {
        &self.ctx
    }

    #[must_use]
    pub fn codec(&self) -> &KeyCodec {
        &self.inner.codec
    }

    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.inner.shared.bucket
    }

    /// Whether both handles point at the same keyspace instance.
    #[must_use]
    pub fn same_instance(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn backend(&self) -> &dyn ObjectBackend {
        self.inner.shared.backend.as_ref()
    }

    pub(crate) fn read_gate(&self) -> &dyn Waiter {
        self.inner.shared.read.as_ref()
    }

    fn write_gate(&self) -> &dyn Waiter {
        self.inner.shared.write.as_ref()
    }

    /// Probes `key` with a HEAD request. Delete markers count as absent.
    ///
    /// # Errors
    /// Anything but "not found" from the backend, or the context ending.
    pub async fn key_exists(&self, key: &[u8]) -> Result<bool, BlobError> {
        if key.is_empty() {
            return Ok(false);
        }
        let path = self.codec().encode(key);
        self.read_gate().wait(&self.ctx).await?;
        match self.ctx.run(self.backend().head_object(self.bucket(), &path)).await.context("head object")? {
            Ok(head) => Ok(!head.delete_marker),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(BlobError::backend(e, format!("head object {path}"))),
        }
    }
}

#[async_trait]
impl Kv for Keyspace {
    async fn get(&self, key: &[u8]) -> Result<Vec<u8>, BlobError> {
        if key.is_empty() {
            return Err(BlobError::key_not_found(key));
        }
        let path = self.codec().encode(key);
        self.read_gate().wait(&self.ctx).await?;
        match self.ctx.run(self.backend().get_object(self.bucket(), &path)).await.context("get object")? {
            Ok(data) => Ok(data),
            Err(e) if e.is_not_found() => Err(BlobError::key_not_found(key)),
            Err(e) => Err(BlobError::backend(e, format!("get object {path}"))),
        }
    }

    async fn put(&self, opts: PutOptions) -> Result<(), BlobError> {
        let PutOptions { key, data, replace } = opts;
        if key.is_empty() {
            return Err(BlobError::key_not_found(key));
        }
        if !replace && self.key_exists(&key).await? {
            return Err(BlobError::key_exists(key));
        }

        let path = self.codec().encode(&key);
        let size = data.len();
        self.write_gate().wait(&self.ctx).await?;
        self.ctx
            .run(self.backend().put_object(self.bucket(), &path, data))
            .await
            .context("put object")?
            .map_err(|e| BlobError::backend(e, format!("put object {path}")))?;
        debug!(key = %display_key(&key), path = %path, size, replace, "Stored object");
        Ok(())
    }

    async fn delete(&self, key: &[u8]) -> Result<(), BlobError> {
        if !self.key_exists(key).await? {
            return Err(BlobError::key_not_found(key));
        }

        let path = self.codec().encode(key);
        self.write_gate().wait(&self.ctx).await?;
        match self.ctx.run(self.backend().delete_object(self.bucket(), &path)).await.context("delete object")? {
            Ok(()) => {
                debug!(key = %display_key(key), path = %path, "Deleted object");
                Ok(())
            },
            Err(e) if e.is_not_found() => Err(BlobError::key_not_found(key)),
            Err(e) => Err(BlobError::backend(e, format!("delete object {path}"))),
        }
    }

    async fn has(&self, keys: &[Vec<u8>]) -> Result<Vec<Vec<u8>>, BlobError> {
        let mut wanted: Vec<&[u8]> = keys.iter().map(Vec::as_slice).collect();
        wanted.sort_unstable();
        wanted.dedup();

        let probes = wanted.into_iter().map(|key| async move {
            Ok::<_, BlobError>(self.key_exists(key).await?.then(|| key.to_vec()))
        });
        Ok(try_join_all(probes).await?.into_iter().flatten().collect())
    }

    fn list(&self, start: &[u8]) -> KeyStream {
        listing::list_keys(self.clone(), start)
    }

    async fn len(&self) -> Result<u64, BlobError> {
        listing::count_keys(self).await
    }
}
