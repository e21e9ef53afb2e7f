use crate::cli::Command;
use anyhow::Context;
use futures::{StreamExt, TryStreamExt};
use keel_blob::{BlobError, Kv, PutOptions, Store, display_key, parse_key};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

/// Walks `subs` from `store` and opens keyspace `name` in the innermost namespace.
///
/// # Errors
/// Whatever the store reports while resolving the namespaces.
pub async fn open_keyspace<S: Store>(store: &S, subs: &[String], name: &str) -> Result<S::Kv, BlobError> {
    let Some((first, rest)) = subs.split_first() else {
        return store.keyspace(name).await;
    };
    let mut current = store.sub(first).await?;
    for sub in rest {
        current = current.sub(sub).await?;
    }
    current.keyspace(name).await
}

/// Runs one command against `kv`, writing results to `out`.
///
/// `get` writes the raw value; the other commands write one line per item.
/// A `put` without a value reads it from `input`.
///
/// # Errors
/// Keyspace failures (including `KeyNotFound`/`KeyExists`), malformed keys
/// and I/O errors on `input` or `out`.
pub async fn execute<K, R, W>(kv: &K, command: &Command, mut input: R, out: &mut W) -> anyhow::Result<()>
where
    K: Kv,
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    match command {
        Command::Get { key } => {
            let value = kv.get(&parse_key(key)?).await?;
            out.write_all(&value).await?;
        },
        Command::Put { key, value, replace } => {
            let data = if let Some(value) = value {
                value.clone().into_bytes()
            } else {
                let mut buf = Vec::new();
                input.read_to_end(&mut buf).await.context("Failed to read value from stdin")?;
                buf
            };
            let size = data.len();
            kv.put(PutOptions::new(parse_key(key)?, data).replace(*replace)).await?;
            debug!(key = %key, size, "Stored value");
        },
        Command::Delete { key } => {
            kv.delete(&parse_key(key)?).await?;
            debug!(key = %key, "Deleted key");
        },
        Command::Has { keys } => {
            let keys = keys.iter().map(|key| parse_key(key)).collect::<Result<Vec<_>, _>>()?;
            for key in kv.has(&keys).await? {
                write_line(out, &display_key(&key)).await?;
            }
        },
        Command::List { start, limit } => {
            let mut keys = kv.list(&parse_key(start)?).take(limit.unwrap_or(usize::MAX));
            while let Some(key) = keys.try_next().await? {
                write_line(out, &display_key(&key)).await?;
            }
        },
        Command::Len => write_line(out, &kv.len().await?.to_string()).await?,
    }
    out.flush().await?;
    Ok(())
}

async fn write_line<W: AsyncWrite + Unpin>(out: &mut W, line: &str) -> std::io::Result<()> {
    out.write_all(line.as_bytes()).await?;
    out.write_all(b"\n").await
}
