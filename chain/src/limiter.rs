use std::time::{Duration, Instant};

use tokio::sync::Mutex;

/// Fixed-window request budget for a public RPC endpoint.
///
/// Archival nodes throttle by requests-per-window rather than weighted
/// buckets, so a plain counter that resets every window is enough.
pub struct FixedWindowBucket {
    capacity: usize,
    used: usize,
    window: Duration,
    window_start: Instant,
}

impl FixedWindowBucket {
    pub fn new(capacity: usize, window: Duration) -> Self {
        FixedWindowBucket {
            capacity,
            used: 0,
            window,
            window_start: Instant::now(),
        }
    }

    /// Returns how long the caller must wait before the request fits the
    /// current window, or `None` when it can go out immediately.
    pub fn prepare_request(&mut self) -> Option<Duration> {
        let now = Instant::now();
        let elapsed = now.duration_since(self.window_start);

        if elapsed >= self.window {
            self.window_start = now;
            self.used = 0;
        }

        if self.used < self.capacity {
            self.used += 1;
            None
        } else {
            Some(self.window - elapsed)
        }
    }
}

/// Blocks the calling task until the bucket admits one request.
pub async fn acquire(bucket: &Mutex<FixedWindowBucket>) {
    loop {
        let wait = bucket.lock().await.prepare_request();
        match wait {
            None => return,
            Some(delay) => tokio::time::sleep(delay).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admits_up_to_capacity_without_waiting() {
        let mut bucket = FixedWindowBucket::new(3, Duration::from_secs(60));
        assert!(bucket.prepare_request().is_none());
        assert!(bucket.prepare_request().is_none());
        assert!(bucket.prepare_request().is_none());
        assert!(bucket.prepare_request().is_some());
    }

    #[test]
    fn window_rollover_resets_the_budget() {
        let mut bucket = FixedWindowBucket::new(1, Duration::from_millis(0));
        assert!(bucket.prepare_request().is_none());
        // zero-length window: the next call starts a fresh one
        assert!(bucket.prepare_request().is_none());
    }
}
