use std::sync::{Arc, Mutex};

use tokio::time::{Duration, Instant};

/// Collapses bursts of refresh triggers into one. Every trigger pushes
/// the deadline out by the quiet period; `settled` returns once no
/// trigger has arrived for that long.
#[derive(Clone, Debug)]
pub struct Debouncer {
    inner: Arc<Mutex<DebouncerInner>>,
}

#[derive(Debug)]
struct DebouncerInner {
    deadline: Instant,
    duration: Duration,
}

impl Debouncer {
    pub fn new(duration: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(DebouncerInner {
                deadline: Instant::now(),
                duration,
            })),
        }
    }

    pub fn trigger(&self) {
        let mut lock = self.inner.lock().unwrap();
        lock.deadline = Instant::now() + lock.duration;
    }

    /// Sleeps until the deadline elapses.
    pub async fn settled(&self) {
        // Loops in case the deadline was pushed out while sleeping.
        loop {
            let deadline = self.deadline();
            if deadline <= Instant::now() {
                return;
            }
            tokio::time::sleep_until(deadline).await;
        }
    }

    fn deadline(&self) -> Instant {
        self.inner.lock().unwrap().deadline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn settles_after_quiet_period() {
        let debouncer = Debouncer::new(Duration::from_millis(400));
        debouncer.trigger();
        let start = Instant::now();
        debouncer.settled().await;
        assert!(Instant::now() - start >= Duration::from_millis(400));
    }

    #[tokio::test(start_paused = true)]
    async fn trigger_pushes_the_deadline_out() {
        let debouncer = Debouncer::new(Duration::from_millis(400));
        debouncer.trigger();
        let waiter = debouncer.clone();
        let handle = tokio::spawn(async move { waiter.settled().await });
        tokio::time::sleep(Duration::from_millis(200)).await;
        debouncer.trigger();
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!handle.is_finished());
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn settled_without_trigger_returns_immediately() {
        let debouncer = Debouncer::new(Duration::from_secs(60));
        debouncer.settled().await;
    }
}
