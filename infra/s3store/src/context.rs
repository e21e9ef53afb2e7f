use keel_blob::BlobError;
use std::future::Future;
use tokio::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Cancellation and deadline carried by a keyspace handle into every remote
/// call and rate-limit wait it makes.
///
/// The default context never ends.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    #[must_use]
    pub const fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// True once the token fired or the deadline passed.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.cancel.is_cancelled() || self.deadline.is_some_and(|d| d <= Instant::now())
    }

    /// Resolves when the context ends, with the reason.
    pub async fn done(&self) -> &'static str {
        tokio::select! {
            () = self.cancel.cancelled() => "cancellation requested",
            () = expiry(self.deadline) => "deadline exceeded",
        }
    }

    /// Drives `call` unless the context ends first, in which case the call is
    /// dropped and [`BlobError::Cancelled`] is returned.
    pub(crate) async fn run<F: Future>(&self, call: F) -> Result<F::Output, BlobError> {
        tokio::select! {
            biased;
            reason = self.done() => Err(BlobError::Cancelled { message: reason.into(), context: None }),
            out = call => Ok(out),
        }
    }
}

async fn expiry(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
