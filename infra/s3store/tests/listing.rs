use futures::{StreamExt, TryStreamExt};
use keel_s3store::*;
use std::sync::Arc;

const BUCKET: &str = "listing";

async fn keyspace_with(backend: MemoryBackend, keys: &[&[u8]]) -> (Arc<MemoryBackend>, Keyspace) {
    let backend = Arc::new(backend);
    let store = S3Store::builder()
        .bucket(BUCKET)
        .prefix("p")
        .backend(Arc::clone(&backend) as Arc<dyn ObjectBackend>)
        .connect()
        .await
        .unwrap();
    let kv = store.keyspace("").await.unwrap();
    for key in keys {
        kv.put(PutOptions::new(*key, "v")).await.unwrap();
    }
    (backend, kv)
}

async fn listed(kv: &Keyspace, start: &[u8]) -> Vec<Vec<u8>> {
    kv.list(start).try_collect().await.unwrap()
}

#[tokio::test]
async fn test_list_pages_in_order() {
    let keys: Vec<Vec<u8>> = (0u8..40).map(|i| vec![b'k', i]).collect();
    let refs: Vec<&[u8]> = keys.iter().rev().map(Vec::as_slice).collect();
    let (backend, kv) = keyspace_with(MemoryBackend::new().with_page_size(3), &refs).await;

    let before = backend.requests();
    let all = listed(&kv, b"").await;
    assert_eq!(all, keys);
    assert!(backend.requests() - before >= 14, "expected one request per page");
}

#[tokio::test]
async fn test_list_start_selects_suffix() {
    let keys: [&[u8]; 6] = [b"a", b"a\x00", b"ab", b"b", b"b\x00\x00", b"c"];
    let (_backend, kv) = keyspace_with(MemoryBackend::new().with_page_size(2), &keys).await;

    for (i, start) in keys.iter().enumerate() {
        let expected: Vec<Vec<u8>> = keys[i..].iter().map(|k| k.to_vec()).collect();
        assert_eq!(listed(&kv, start).await, expected, "start {start:?}");
    }
    assert_eq!(listed(&kv, b"aa").await, [b"ab".to_vec(), b"b".to_vec(), b"b\x00\x00".to_vec(), b"c".to_vec()]);
    assert!(listed(&kv, b"d").await.is_empty());
}

#[tokio::test]
async fn test_list_skips_foreign_objects() {
    let (backend, kv) = keyspace_with(MemoryBackend::new(), &[b"ab", b"b"]).await;
    for name in ["p/616/2A", "p/zz/x", "p/README", "p/616/26", "q/616/2", "p/62-/-/extra"] {
        backend.insert_raw(BUCKET, name, "junk");
    }

    assert_eq!(listed(&kv, b"").await, [b"ab".to_vec(), b"b".to_vec()]);
    assert_eq!(kv.len().await.unwrap(), 2);
}

#[tokio::test]
async fn test_dropping_stream_stops_listing() {
    let keys: Vec<Vec<u8>> = (0u8..20).map(|i| vec![i + 1]).collect();
    let refs: Vec<&[u8]> = keys.iter().map(Vec::as_slice).collect();
    let (backend, kv) = keyspace_with(MemoryBackend::new().with_page_size(2), &refs).await;

    let before = backend.requests();
    let first_three: Vec<Vec<u8>> = kv.list(b"").take(3).try_collect().await.unwrap();
    assert_eq!(first_three, &keys[..3]);
    assert_eq!(backend.requests() - before, 2);
}

#[tokio::test]
async fn test_for_each_key_break_ends_cleanly() {
    let (_backend, kv) = keyspace_with(MemoryBackend::new(), &[b"a", b"b", b"c", b"d"]).await;

    let mut seen = Vec::new();
    kv.for_each_key(b"b", |key| {
        seen.push(key.to_vec());
        if key == b"c" { ControlFlow::Break(()) } else { ControlFlow::Continue(()) }
    })
    .await
    .unwrap();
    assert_eq!(seen, [b"b".to_vec(), b"c".to_vec()]);
}

#[tokio::test]
async fn test_list_failure_aborts_stream() {
    let (backend, kv) = keyspace_with(MemoryBackend::new().with_page_size(1), &[b"a", b"b", b"c"]).await;
    backend.poison(kv.codec().encode(b"b"));

    let mut keys = kv.list(b"");
    assert_eq!(keys.next().await.unwrap().unwrap(), b"a");
    let err = keys.next().await.unwrap().unwrap_err();
    assert!(matches!(err, BlobError::Backend { .. }), "{err}");
}

#[tokio::test]
async fn test_len_spans_every_partition() {
    let keys: Vec<Vec<u8>> = (0u8..=255).flat_map(|b| [vec![b], vec![b, 0], vec![b, 255, 1]]).collect();
    let refs: Vec<&[u8]> = keys.iter().map(Vec::as_slice).collect();
    let (_backend, kv) = keyspace_with(MemoryBackend::new().with_page_size(50), &refs).await;

    assert_eq!(kv.len().await.unwrap(), 768);
    kv.delete(&[7, 0]).await.unwrap();
    assert_eq!(kv.len().await.unwrap(), 767);
}

#[tokio::test]
async fn test_len_of_empty_keyspace_is_zero() {
    let (_backend, kv) = keyspace_with(MemoryBackend::new(), &[]).await;
    assert_eq!(kv.len().await.unwrap(), 0);
}

#[tokio::test]
async fn test_len_reports_partition_failure() {
    let (backend, kv) = keyspace_with(MemoryBackend::new(), &[b"a", b"b"]).await;
    backend.poison(kv.codec().encode(b"b"));

    let err = kv.len().await.unwrap_err();
    assert!(matches!(err, BlobError::Backend { .. }), "{err}");
}

#[tokio::test]
async fn test_child_keyspaces_stay_out_of_parent_listing() {
    let backend = Arc::new(MemoryBackend::new());
    let store = S3Store::builder()
        .bucket(BUCKET)
        .prefix("p")
        .backend(Arc::clone(&backend) as Arc<dyn ObjectBackend>)
        .connect()
        .await
        .unwrap();
    let root = store.keyspace("").await.unwrap();
    let child = store.sub("a").await.unwrap().keyspace("x").await.unwrap();
    root.put(PutOptions::new("root", "v")).await.unwrap();
    child.put(PutOptions::new("nested", "v")).await.unwrap();

    assert_eq!(backend.object_names(BUCKET).len(), 2);
    assert_eq!(listed(&root, b"").await, [b"root".to_vec()]);
    assert_eq!(root.len().await.unwrap(), 1);
    assert_eq!(listed(&child, b"").await, [b"nested".to_vec()]);
}
