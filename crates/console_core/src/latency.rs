use std::time::Duration;

use async_trait::async_trait;

pub const DEFAULT_ACTION_LATENCY: Duration = Duration::from_millis(500);
pub const DEFAULT_FETCH_LATENCY: Duration = Duration::from_millis(300);

/// Suspension point standing in for a backend round trip.
#[async_trait]
pub trait Latency: Send + Sync {
    async fn delay(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
pub struct TokioLatency;

#[async_trait]
impl Latency for TokioLatency {
    async fn delay(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Yields once instead of sleeping, so actions still interleave.
pub struct NoLatency;

#[async_trait]
impl Latency for NoLatency {
    async fn delay(&self, _duration: Duration) {
        tokio::task::yield_now().await;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    pub action: Duration,
    pub fetch: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            action: DEFAULT_ACTION_LATENCY,
            fetch: DEFAULT_FETCH_LATENCY,
        }
    }
}
