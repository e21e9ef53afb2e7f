use crate::backend::ListRequest;
use crate::keyspace::Keyspace;
use futures::stream;
use keel_blob::{BlobError, BlobErrorExt, ControlFlow, KeyStream, Kv};
use std::collections::VecDeque;
use tokio::task::JoinSet;
use tracing::{trace, warn};

/// The key just before `key`, used as an exclusive listing bound.
///
/// Drops a trailing zero byte, otherwise decrements the last byte. The result
/// is always smaller than `key`; the empty key maps to itself.
#[must_use]
pub fn prev_key(key: &[u8]) -> Vec<u8> {
    let mut prev = key.to_vec();
    match prev.last_mut() {
        Some(0) => {
            prev.pop();
        },
        Some(last) => *last -= 1,
        None => {},
    }
    prev
}

struct Cursor {
    keyspace: Keyspace,
    start: Vec<u8>,
    request: ListRequest,
    pending: VecDeque<Vec<u8>>,
    exhausted: bool,
}

impl Cursor {
    async fn fetch_page(&mut self) -> Result<(), BlobError> {
        let keyspace = &self.keyspace;
        let ctx = keyspace.context();
        keyspace.read_gate().wait(ctx).await?;
        let page = ctx
            .run(keyspace.backend().list_objects(keyspace.bucket(), self.request.clone()))
            .await
            .context("list objects")?
            .map_err(|e| BlobError::backend(e, format!("list objects under '{}'", self.request.prefix)))?;
        trace!(prefix = %self.request.prefix, names = page.keys.len(), "Fetched listing page");

        for path in page.keys {
            let key = match keyspace.codec().decode(&path) {
                Ok(key) => key,
                Err(e) if e.is_foreign_key() => continue,
                Err(e) => return Err(BlobError::backend(e, "decode object name")),
            };
            if key >= self.start {
                self.pending.push_back(key);
            }
        }

        match page.next_continuation {
            Some(token) => self.request.continuation = Some(token),
            None => self.exhausted = true,
        }
        Ok(())
    }
}

/// Streams the keys of `keyspace` that are `>= start`, a page at a time.
pub(crate) fn list_keys(keyspace: Keyspace, start: &[u8]) -> KeyStream {
    let codec = keyspace.codec();
    let prev = prev_key(start);
    let request = ListRequest {
        prefix: codec.list_prefix(),
        start_after: (!prev.is_empty()).then(|| codec.encode(&prev)),
        continuation: None,
    };
    let cursor =
        Cursor { keyspace, start: start.to_vec(), request, pending: VecDeque::new(), exhausted: false };

    Box::pin(stream::try_unfold(cursor, |mut cursor| async move {
        loop {
            if let Some(key) = cursor.pending.pop_front() {
                return Ok(Some((key, cursor)));
            }
            if cursor.exhausted {
                return Ok(None);
            }
            cursor.fetch_page().await?;
        }
    }))
}

/// Counts keys with one listing per leading byte, all 256 in flight at once.
/// The first failure cancels the remaining partitions.
pub(crate) async fn count_keys(keyspace: &Keyspace) -> Result<u64, BlobError> {
    let mut partitions = JoinSet::new();
    for first in u8::MIN..=u8::MAX {
        let keyspace = keyspace.clone();
        partitions.spawn(async move { count_partition(&keyspace, first).await });
    }

    let mut total = 0;
    while let Some(joined) = partitions.join_next().await {
        let counted = joined.map_err(|e| BlobError::Internal {
            message: e.to_string().into(),
            context: Some("Counting partition".into()),
        });
        match counted.and_then(|count| count) {
            Ok(count) => total += count,
            Err(err) => {
                warn!(kind = err.kind(), error = %err, "Key count aborted");
                partitions.abort_all();
                return Err(err);
            },
        }
    }
    Ok(total)
}

async fn count_partition(keyspace: &Keyspace, first: u8) -> Result<u64, BlobError> {
    let mut count = 0;
    keyspace
        .for_each_key(&[first], |key| {
            if key.first() != Some(&first) {
                return ControlFlow::Break(());
            }
            count += 1;
            ControlFlow::Continue(())
        })
        .await?;
    Ok(count)
}
