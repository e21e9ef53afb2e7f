use keel_s3store::*;
use std::sync::Arc;
use tokio::time::{Duration, Instant};

async fn open(backend: MemoryBackend, read_qps: u32, write_qps: u32) -> (Arc<MemoryBackend>, S3Store) {
    let backend = Arc::new(backend);
    let store = S3Store::builder()
        .bucket("limits")
        .read_qps(read_qps)
        .write_qps(write_qps)
        .backend(Arc::clone(&backend) as Arc<dyn ObjectBackend>)
        .connect()
        .await
        .unwrap();
    (backend, store)
}

#[tokio::test(start_paused = true)]
async fn test_write_rate_paces_puts() {
    let (_backend, store) = open(MemoryBackend::new(), 0, 2).await;
    let kv = store.keyspace("").await.unwrap();

    let start = Instant::now();
    for i in 0..6u8 {
        kv.put(PutOptions::new(vec![i + 1], "v").replace(true)).await.unwrap();
    }
    // Two tokens of burst, then one every 500ms.
    assert_eq!(start.elapsed(), Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn test_limiters_are_shared_across_keyspaces() {
    let (_backend, store) = open(MemoryBackend::new(), 1, 0).await;
    let left = store.keyspace("left").await.unwrap();
    let right = store.sub("team").await.unwrap().keyspace("right").await.unwrap();

    let start = Instant::now();
    assert!(left.get(b"k").await.unwrap_err().is_key_not_found());
    assert!(right.get(b"k").await.unwrap_err().is_key_not_found());
    assert_eq!(start.elapsed(), Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn test_existence_probe_uses_read_limiter() {
    let (_backend, store) = open(MemoryBackend::new(), 1, 0).await;
    let kv = store.keyspace("").await.unwrap();

    let start = Instant::now();
    kv.put(PutOptions::new("a", "v")).await.unwrap();
    kv.put(PutOptions::new("b", "v")).await.unwrap();
    assert_eq!(start.elapsed(), Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_wait_is_rate_limited() {
    let (backend, store) = open(MemoryBackend::new(), 1, 0).await;
    let kv = store.keyspace("").await.unwrap();
    assert!(kv.get(b"k").await.unwrap_err().is_key_not_found());

    let token = CancellationToken::new();
    let bound = kv.with_context(CallContext::new().with_cancellation(token.clone()));
    let pending = tokio::spawn(async move { bound.get(b"k").await });
    tokio::time::sleep(Duration::from_millis(100)).await;
    token.cancel();

    let before = backend.requests();
    let err = pending.await.unwrap().unwrap_err();
    assert!(matches!(err, BlobError::RateLimited { .. }), "{err}");
    assert_eq!(backend.requests(), before);
}

#[tokio::test(start_paused = true)]
async fn test_deadline_inside_remote_call_is_cancelled() {
    let (_backend, store) = open(MemoryBackend::new().with_latency(Duration::from_secs(5)), 0, 0).await;
    let kv = store.keyspace("").await.unwrap();

    let hurried = kv.with_context(CallContext::new().with_timeout(Duration::from_secs(1)));
    let err = hurried.get(b"slow").await.unwrap_err();
    assert!(matches!(err, BlobError::Cancelled { .. }), "{err}");
    assert_eq!(err.to_string(), "Operation cancelled (get object): deadline exceeded");

    let patient = kv.with_context(CallContext::new().with_timeout(Duration::from_secs(30)));
    assert!(patient.get(b"slow").await.unwrap_err().is_key_not_found());
}

#[tokio::test(start_paused = true)]
async fn test_context_handles_share_the_keyspace() {
    let (_backend, store) = open(MemoryBackend::new(), 0, 0).await;
    let kv = store.keyspace("docs").await.unwrap();
    let bound = kv.with_context(CallContext::new().with_timeout(Duration::from_secs(1)));

    assert!(bound.same_instance(&kv));
    bound.put(PutOptions::new("k", "v")).await.unwrap();
    assert_eq!(kv.get(b"k").await.unwrap(), b"v");
}
