use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

/// Wall clock plus a non-blocking delay.
///
/// Injected into the engine so tests can run whole poll loops in virtual time.
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    async fn sleep(&self, duration: Duration);
}

/// Real time: `chrono::Utc::now` and the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Sleep for `duration` unless `cancel` fires first. Returns `true` when cancelled.
pub async fn sleep_or_cancel(
    clock: &dyn Clock,
    duration: Duration,
    cancel: &CancellationToken,
) -> bool {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => true,
        _ = clock.sleep(duration) => false,
    }
}

/// Cancel `cancel` once `limit` has elapsed. This is the overall wall-clock
/// ceiling for a call; dropping the handle does not stop the timer.
pub fn cancel_after(cancel: CancellationToken, limit: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = tokio::time::sleep(limit) => {
                tracing::warn!(limit_secs = limit.as_secs(), "Time limit reached, cancelling workflow run");
                cancel.cancel();
            }
        }
    })
}
