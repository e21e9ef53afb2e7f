use super::{BackendError, ListPage, ListRequest, ObjectBackend, ObjectHead};
use async_trait::async_trait;
use fxhash::{FxHashMap, FxHashSet};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::time::Duration;

const DEFAULT_PAGE_SIZE: usize = 1000;

#[derive(Debug, Clone)]
enum Entry {
    Live(Vec<u8>),
    DeleteMarker,
}

#[derive(Debug, Default)]
struct Bucket {
    objects: BTreeMap<String, Entry>,
}

#[derive(Debug, Default)]
struct State {
    buckets: FxHashMap<String, Bucket>,
    poisoned: FxHashSet<String>,
}

/// In-process object store with S3 listing semantics.
///
/// Names list in byte order, pages hold at most `page_size` names, and the
/// continuation token is the last name of the previous page. A versioned store
/// leaves delete markers behind, which HEAD reports and listings hide.
/// Requests touching a [`poison`](Self::poison)ed name fail with a transport error.
#[derive(Debug)]
pub struct MemoryBackend {
    state: Mutex<State>,
    page_size: usize,
    versioned: bool,
    latency: Duration,
    requests: AtomicU64,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            page_size: DEFAULT_PAGE_SIZE,
            versioned: false,
            latency: Duration::ZERO,
            requests: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    #[must_use]
    pub const fn versioned(mut self, versioned: bool) -> Self {
        self.versioned = versioned;
        self
    }

    /// Delay applied before every request.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Number of requests served so far, failed ones included.
    #[must_use]
    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    /// Makes every request touching `name` fail.
    pub fn poison(&self, name: impl Into<String>) {
        self.state.lock().poisoned.insert(name.into());
    }

    /// Writes an object directly, bypassing request accounting.
    pub fn insert_raw(&self, bucket: &str, name: impl Into<String>, data: impl Into<Vec<u8>>) {
        self.state
            .lock()
            .buckets
            .entry(bucket.to_owned())
            .or_default()
            .objects
            .insert(name.into(), Entry::Live(data.into()));
    }

    /// Live object names in `bucket`, in order.
    #[must_use]
    pub fn object_names(&self, bucket: &str) -> Vec<String> {
        self.state.lock().buckets.get(bucket).map_or_else(Vec::new, |b| {
            b.objects
                .iter()
                .filter(|(_, entry)| matches!(entry, Entry::Live(_)))
                .map(|(name, _)| name.clone())
                .collect()
        })
    }

    async fn begin(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

fn no_such_bucket(bucket: &str) -> BackendError {
    BackendError::transport(format!("NoSuchBucket: {bucket}"), "memory backend")
}

fn poisoned(name: &str) -> BackendError {
    BackendError::transport(format!("injected failure for {name}"), "memory backend")
}

impl State {
    fn bucket(&self, bucket: &str, name: &str) -> Result<&Bucket, BackendError> {
        if self.poisoned.contains(name) {
            return Err(poisoned(name));
        }
        self.buckets.get(bucket).ok_or_else(|| no_such_bucket(bucket))
    }

    fn bucket_mut(&mut self, bucket: &str, name: &str) -> Result<&mut Bucket, BackendError> {
        if self.poisoned.contains(name) {
            return Err(poisoned(name));
        }
        self.buckets.get_mut(bucket).ok_or_else(|| no_such_bucket(bucket))
    }
}

#[async_trait]
impl ObjectBackend for MemoryBackend {
    async fn create_bucket(&self, bucket: &str, _region: &str) -> Result<(), BackendError> {
        self.begin().await;
        let mut state = self.state.lock();
        if state.buckets.contains_key(bucket) {
            return Err(BackendError::AlreadyExists { message: bucket.to_owned().into(), context: None });
        }
        state.buckets.insert(bucket.to_owned(), Bucket::default());
        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, BackendError> {
        self.begin().await;
        let state = self.state.lock();
        match state.bucket(bucket, key)?.objects.get(key) {
            Some(Entry::Live(data)) => Ok(data.clone()),
            _ => Err(BackendError::not_found(format!("NoSuchKey: {key}"))),
        }
    }

    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<(), BackendError> {
        self.begin().await;
        let mut state = self.state.lock();
        state.bucket_mut(bucket, key)?.objects.insert(key.to_owned(), Entry::Live(body));
        Ok(())
    }

    async fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectHead, BackendError> {
        self.begin().await;
        let state = self.state.lock();
        match state.bucket(bucket, key)?.objects.get(key) {
            Some(Entry::Live(data)) => Ok(ObjectHead { size: data.len() as u64, delete_marker: false }),
            Some(Entry::DeleteMarker) => Ok(ObjectHead { size: 0, delete_marker: true }),
            None => Err(BackendError::not_found(format!("NotFound: {key}"))),
        }
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), BackendError> {
        self.begin().await;
        let versioned = self.versioned;
        let mut state = self.state.lock();
        let objects = &mut state.bucket_mut(bucket, key)?.objects;
        if versioned {
            objects.insert(key.to_owned(), Entry::DeleteMarker);
        } else {
            objects.remove(key);
        }
        Ok(())
    }

    async fn list_objects(&self, bucket: &str, request: ListRequest) -> Result<ListPage, BackendError> {
        self.begin().await;
        let state = self.state.lock();
        let objects = &state.buckets.get(bucket).ok_or_else(|| no_such_bucket(bucket))?.objects;

        let after = request.continuation.or(request.start_after);
        let lower = after.as_ref().map_or(Bound::Unbounded, |name| Bound::Excluded(name.clone()));
        let mut keys = Vec::new();
        let mut more = false;
        for (name, entry) in objects.range((lower, Bound::Unbounded)) {
            if !name.starts_with(request.prefix.as_str()) {
                if name.as_str() > request.prefix.as_str() {
                    break;
                }
                continue;
            }
            if matches!(entry, Entry::DeleteMarker) {
                continue;
            }
            if keys.len() == self.page_size {
                more = true;
                break;
            }
            if state.poisoned.contains(name) {
                return Err(poisoned(name));
            }
            keys.push(name.clone());
        }

        let next_continuation = if more { keys.last().cloned() } else { None };
        Ok(ListPage { keys, next_continuation })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded(page_size: usize) -> MemoryBackend {
        let backend = MemoryBackend::new().with_page_size(page_size);
        backend.create_bucket("b", "").await.unwrap();
        for name in ["a/1", "a/2", "a/3", "b/1", "c"] {
            backend.put_object("b", name, name.as_bytes().to_vec()).await.unwrap();
        }
        backend
    }

    #[tokio::test]
    async fn listing_pages_through_prefix() {
        let backend = seeded(2).await;
        let mut request = ListRequest { prefix: "a/".into(), ..ListRequest::default() };
        let first = backend.list_objects("b", request.clone()).await.unwrap();
        assert_eq!(first.keys, ["a/1", "a/2"]);
        request.continuation = first.next_continuation;
        let second = backend.list_objects("b", request).await.unwrap();
        assert_eq!(second.keys, ["a/3"]);
        assert!(second.next_continuation.is_none());
    }

    #[tokio::test]
    async fn start_after_is_exclusive() {
        let backend = seeded(10).await;
        let request = ListRequest { start_after: Some("a/2".into()), ..ListRequest::default() };
        let page = backend.list_objects("b", request).await.unwrap();
        assert_eq!(page.keys, ["a/3", "b/1", "c"]);
    }

    #[tokio::test]
    async fn versioned_delete_leaves_marker() {
        let backend = MemoryBackend::new().versioned(true);
        backend.create_bucket("b", "").await.unwrap();
        backend.put_object("b", "k", b"v".to_vec()).await.unwrap();
        backend.delete_object("b", "k").await.unwrap();

        assert!(backend.head_object("b", "k").await.unwrap().delete_marker);
        assert!(backend.get_object("b", "k").await.unwrap_err().is_not_found());
        assert!(backend.object_names("b").is_empty());
    }

    #[tokio::test]
    async fn existing_bucket_is_reported() {
        let backend = MemoryBackend::new();
        backend.create_bucket("b", "eu-west-1").await.unwrap();
        let err = backend.create_bucket("b", "eu-west-1").await.unwrap_err();
        assert!(err.is_already_exists());
        assert_eq!(backend.requests(), 2);
    }

    #[tokio::test]
    async fn poisoned_names_fail() {
        let backend = seeded(10).await;
        backend.poison("a/2");
        assert!(matches!(
            backend.get_object("b", "a/2").await.unwrap_err(),
            BackendError::Transport { .. }
        ));
        assert!(backend.list_objects("b", ListRequest::default()).await.is_err());
    }
}
