use crate::context::CallContext;
use async_trait::async_trait;
use keel_blob::BlobError;
use std::fmt;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::time::{Duration, Instant};
use tracing::trace;

/// Gate in front of remote calls: resolves once the call may proceed.
#[async_trait]
pub trait Waiter: Send + Sync + fmt::Debug {
    /// # Errors
    /// [`BlobError::RateLimited`] if `ctx` ends before a token is granted.
    async fn wait(&self, ctx: &CallContext) -> Result<(), BlobError>;
}

/// Never waits.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unlimited;

#[async_trait]
impl Waiter for Unlimited {
    async fn wait(&self, _ctx: &CallContext) -> Result<(), BlobError> {
        Ok(())
    }
}

/// Token bucket holding `burst` tokens refilled at `qps` per second.
///
/// Tracked as a single theoretical arrival time (GCRA), so reservations are a
/// compare-and-swap with no lock held across the sleep.
#[derive(Debug)]
pub struct TokenBucket {
    origin: Instant,
    interval_ns: u64,
    tolerance_ns: u64,
    tat_ns: AtomicU64,
}

impl TokenBucket {
    /// `qps` requests per second with a burst of the same size.
    #[must_use]
    pub fn per_second(qps: NonZeroU32) -> Self {
        Self::new(qps, qps)
    }

    #[must_use]
    pub fn new(qps: NonZeroU32, burst: NonZeroU32) -> Self {
        let interval_ns = 1_000_000_000 / u64::from(qps.get());
        Self {
            origin: Instant::now(),
            interval_ns,
            tolerance_ns: interval_ns * u64::from(burst.get() - 1),
            tat_ns: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_nanos(self.interval_ns)
    }

    fn elapsed_ns(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_nanos()).unwrap_or(u64::MAX)
    }

    /// Claims the next slot and returns how long to sleep before using it.
    /// A slot that cannot be reached before the deadline is never claimed.
    fn reserve(&self, ctx: &CallContext) -> Result<Duration, BlobError> {
        if ctx.is_done() {
            let reason =
                if ctx.cancellation().is_cancelled() { "cancellation requested" } else { "deadline exceeded" };
            return Err(rate_limited(reason));
        }

        loop {
            let now_ns = self.elapsed_ns();
            let tat = self.tat_ns.load(Ordering::Acquire);
            let slot = tat.max(now_ns);
            let delay = Duration::from_nanos(slot.saturating_sub(self.tolerance_ns).saturating_sub(now_ns));

            if ctx.deadline().is_some_and(|deadline| Instant::now() + delay > deadline) {
                return Err(rate_limited("deadline exceeded before a token is available"));
            }

            let next = slot.saturating_add(self.interval_ns);
            if self
                .tat_ns
                .compare_exchange_weak(tat, next, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return Ok(delay);
            }
        }
    }
}

#[async_trait]
impl Waiter for TokenBucket {
    async fn wait(&self, ctx: &CallContext) -> Result<(), BlobError> {
        let delay = self.reserve(ctx)?;
        if delay.is_zero() {
            return Ok(());
        }
        trace!(delay_ms = delay.as_millis(), "Waiting for rate limit token");
        tokio::select! {
            biased;
            reason = ctx.done() => Err(rate_limited(reason)),
            () = tokio::time::sleep(delay) => Ok(()),
        }
    }
}

fn rate_limited(reason: &'static str) -> BlobError {
    BlobError::RateLimited { message: reason.into(), context: None }
}

/// The gate for a configured rate; zero means unlimited.
#[must_use]
pub fn limiter(qps: u32) -> Arc<dyn Waiter> {
    NonZeroU32::new(qps)
        .map_or_else(|| Arc::new(Unlimited) as Arc<dyn Waiter>, |qps| Arc::new(TokenBucket::per_second(qps)))
}
