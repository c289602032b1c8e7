use tokio::time::{Duration, Instant, sleep};

/// Minimum-interval gate for calls to the sprite host.
///
/// Calls that arrive early are delayed, never dropped. Uses tokio's clock so
/// tests can run it on paused time.
#[derive(Debug, Clone)]
pub struct Throttle {
    min_interval: Duration,
    last_call: Option<Instant>,
}

impl Throttle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: None,
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    pub fn last_call(&self) -> Option<Instant> {
        self.last_call
    }

    /// Time left before the next call is allowed
    pub fn remaining(&self) -> Duration {
        match self.last_call {
            Some(last) => self.min_interval.saturating_sub(last.elapsed()),
            None => Duration::ZERO,
        }
    }

    /// Sleep out whatever is left of the window, then stamp the call.
    /// Returns how long it waited.
    pub async fn wait(&mut self) -> Duration {
        let remaining = self.remaining();
        if !remaining.is_zero() {
            tracing::debug!(wait_ms = remaining.as_millis() as u64, "Throttling remote lookup");
            sleep(remaining).await;
        }
        self.last_call = Some(Instant::now());
        remaining
    }

    /// If the window is still open, stall for `penalty` instead of the
    /// remainder. Stamps the call either way. Returns whether it stalled.
    pub async fn penalize(&mut self, penalty: Duration) -> bool {
        let violated = !self.remaining().is_zero();
        if violated {
            tracing::debug!(penalty_ms = penalty.as_millis() as u64, "Image fetch rate limit hit");
            sleep(penalty).await;
        }
        self.last_call = Some(Instant::now());
        violated
    }
}
