//! Timer-driven auto-sync

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

type Tick = Arc<dyn Fn() -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Runs a tick callback on a fixed interval.
///
/// At most one timer task exists at a time: re-arming or changing the
/// interval aborts the running timer before a new one is spawned, and
/// dropping the scheduler aborts it. Ticks never overlap. A tick already
/// in progress is not cancelled with its timer and runs to completion.
pub struct AutoSync {
    tick: Tick,
    interval: Duration,
    handle: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for AutoSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutoSync")
            .field("interval", &self.interval)
            .field("armed", &self.is_armed())
            .finish()
    }
}

impl AutoSync {
    pub fn new<F, Fut>(interval: Duration, tick: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self {
            tick: Arc::new(move || -> Pin<Box<dyn Future<Output = ()> + Send>> {
                Box::pin(tick())
            }),
            interval,
            handle: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_armed(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Start the timer. The first tick fires one interval from now.
    pub fn arm(&mut self) {
        self.cancel();
        let tick = Arc::clone(&self.tick);
        let every = self.interval;
        self.handle = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + every, every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                // A run outlives the timer: aborting this loop drops the
                // join handle, which detaches the run instead of cancelling it.
                let run = tokio::spawn(tick());
                if let Err(e) = run.await {
                    tracing::warn!(error = %e, "auto-sync tick panicked");
                }
            }
        }));
        tracing::debug!(interval_ms = every.as_millis() as u64, "auto-sync armed");
    }

    /// Change the interval, re-arming if the timer is running.
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
        if self.handle.is_some() {
            self.arm();
        }
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            tracing::debug!("auto-sync cancelled");
        }
    }
}

impl Drop for AutoSync {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting(interval: Duration) -> (AutoSync, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let ticks = Arc::clone(&count);
        let auto = AutoSync::new(interval, move || {
            let ticks = Arc::clone(&ticks);
            async move {
                ticks.fetch_add(1, Ordering::SeqCst);
            }
        });
        (auto, count)
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_on_interval() {
        let (mut auto, count) = counting(Duration::from_secs(10));
        auto.arm();

        tokio::time::sleep(Duration::from_secs(35)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn set_interval_replaces_timer() {
        let (mut auto, count) = counting(Duration::from_secs(10));
        auto.arm();
        auto.set_interval(Duration::from_secs(100));

        tokio::time::sleep(Duration::from_secs(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(auto.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn unarmed_interval_change_does_not_start_timer() {
        let (mut auto, count) = counting(Duration::from_secs(10));
        auto.set_interval(Duration::from_secs(1));

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(!auto.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_lets_running_tick_finish() {
        let finished = Arc::new(AtomicUsize::new(0));
        let done = Arc::clone(&finished);
        let mut auto = AutoSync::new(Duration::from_secs(1), move || {
            let done = Arc::clone(&done);
            async move {
                tokio::time::sleep(Duration::from_secs(5)).await;
                done.fetch_add(1, Ordering::SeqCst);
            }
        });
        auto.arm();

        tokio::time::sleep(Duration::from_millis(1500)).await;
        auto.cancel();
        assert_eq!(finished.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(finished.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn drop_stops_ticking() {
        let (mut auto, count) = counting(Duration::from_secs(1));
        auto.arm();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        drop(auto);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
