use async_trait::async_trait;
use futures::stream;
use keel_blob::{BlobError, ControlFlow, KeyStream, Kv, PutOptions};
use std::collections::BTreeMap;
use std::sync::Mutex;

#[derive(Debug, Default)]
struct MapKv {
    entries: Mutex<BTreeMap<Vec<u8>, Vec<u8>>>,
}

#[async_trait]
impl Kv for MapKv {
    async fn get(&self, key: &[u8]) -> Result<Vec<u8>, BlobError> {
        self.entries.lock().unwrap().get(key).cloned().ok_or_else(|| BlobError::key_not_found(key))
    }

    async fn put(&self, opts: PutOptions) -> Result<(), BlobError> {
        let mut entries = self.entries.lock().unwrap();
        if !opts.replace && entries.contains_key(&opts.key) {
            return Err(BlobError::key_exists(opts.key));
        }
        entries.insert(opts.key, opts.data);
        Ok(())
    }

    async fn delete(&self, key: &[u8]) -> Result<(), BlobError> {
        self.entries
            .lock()
            .unwrap()
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| BlobError::key_not_found(key))
    }

    async fn has(&self, keys: &[Vec<u8>]) -> Result<Vec<Vec<u8>>, BlobError> {
        let entries = self.entries.lock().unwrap();
        let mut found: Vec<Vec<u8>> =
            keys.iter().filter(|k| entries.contains_key(*k)).cloned().collect();
        found.sort();
        found.dedup();
        Ok(found)
    }

    fn list(&self, start: &[u8]) -> KeyStream {
        let keys: Vec<Result<Vec<u8>, BlobError>> = self
            .entries
            .lock()
            .unwrap()
            .range(start.to_vec()..)
            .map(|(k, _)| Ok(k.clone()))
            .collect();
        Box::pin(stream::iter(keys))
    }

    async fn len(&self) -> Result<u64, BlobError> {
        Ok(self.entries.lock().unwrap().len() as u64)
    }
}

async fn seeded() -> MapKv {
    let kv = MapKv::default();
    for key in ["apple", "banana", "cherry", "date"] {
        kv.put(PutOptions::new(key, key.to_uppercase())).await.unwrap();
    }
    kv
}

#[tokio::test]
async fn for_each_key_visits_from_start_in_order() {
    let kv = seeded().await;
    let mut seen = Vec::new();
    kv.for_each_key(b"b", |key| {
        seen.push(String::from_utf8(key.to_vec()).unwrap());
        ControlFlow::Continue(())
    })
    .await
    .unwrap();
    assert_eq!(seen, ["banana", "cherry", "date"]);
}

#[tokio::test]
async fn for_each_key_break_is_not_an_error() {
    let kv = seeded().await;
    let mut seen = 0;
    let result = kv
        .for_each_key(b"", |key| {
            if key.starts_with(b"c") {
                return ControlFlow::Break(());
            }
            seen += 1;
            ControlFlow::Continue(())
        })
        .await;
    assert!(result.is_ok());
    assert_eq!(seen, 2);
}

#[tokio::test]
async fn put_options_default_to_no_replace() {
    let kv = seeded().await;
    let err = kv.put(PutOptions::new("apple", "again")).await.unwrap_err();
    assert!(err.is_key_exists());
    assert_eq!(err.key(), Some(&b"apple"[..]));
    kv.put(PutOptions::new("apple", "again").replace(true)).await.unwrap();
    assert_eq!(kv.get(b"apple").await.unwrap(), b"again");
}

#[test]
fn error_messages_render_keys() {
    assert_eq!(BlobError::key_not_found("a").to_string(), "Key not found: a");
    assert_eq!(BlobError::key_exists(vec![0xff]).to_string(), "Key already exists: hex:ff");
    let err = BlobError::backend(std::io::Error::other("503 slow down"), "get object p/616/2");
    assert_eq!(err.to_string(), "Storage backend failure (get object p/616/2): 503 slow down");
    assert_eq!(err.kind(), "Backend");
}
