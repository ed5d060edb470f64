use std::future::pending;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};

/// A cancellable deferred deadline.
///
/// `schedule` supersedes any pending deadline, so only the most recent one
/// can fire. The debouncer does not run anything itself: the owner awaits
/// [`Debouncer::elapsed`] (typically inside `tokio::select!`) and acts when
/// it resolves.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Arm the deadline `delay` from now, replacing any pending one.
    pub fn schedule(&mut self) {
        self.deadline = Some(Instant::now() + self.delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Resolve once the pending deadline passes, disarming it. Never resolves
    /// while nothing is scheduled.
    ///
    /// Cancel safe: dropping the future before it resolves leaves the
    /// deadline armed.
    pub async fn elapsed(&mut self) {
        match self.deadline {
            Some(deadline) => {
                sleep_until(deadline).await;
                self.deadline = None;
            }
            None => pending::<()>().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{advance, timeout};

    #[tokio::test(start_paused = true)]
    async fn test_fires_after_delay() {
        let mut debouncer = Debouncer::new(Duration::from_millis(2000));
        let start = Instant::now();
        debouncer.schedule();

        debouncer.elapsed().await;

        assert_eq!(start.elapsed(), Duration::from_millis(2000));
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reschedule_supersedes_pending_deadline() {
        let mut debouncer = Debouncer::new(Duration::from_millis(2000));
        let start = Instant::now();
        debouncer.schedule();
        advance(Duration::from_millis(150)).await;
        debouncer.schedule();

        debouncer.elapsed().await;

        assert_eq!(start.elapsed(), Duration::from_millis(2150));
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_fires_when_cancelled() {
        let mut debouncer = Debouncer::new(Duration::from_millis(10));
        debouncer.schedule();
        debouncer.cancel();

        let result = timeout(Duration::from_secs(60), debouncer.elapsed()).await;
        assert!(result.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_wait_keeps_deadline() {
        let mut debouncer = Debouncer::new(Duration::from_millis(500));
        debouncer.schedule();

        let early = timeout(Duration::from_millis(100), debouncer.elapsed()).await;
        assert!(early.is_err());
        assert!(debouncer.is_pending());

        debouncer.elapsed().await;
        assert!(!debouncer.is_pending());
    }
}
