//! Interval jobs with a cooperative stop.
//!
//! Every job runs its body to completion before looking at the stop signal
//! again, so a stop request never interrupts a cycle half way.

use serde::Serialize;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    Idle,
    Running,
    Stopped,
}

pub struct Scheduler {
    state: Mutex<LifecycleState>,
    shutdown: watch::Sender<bool>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            state: Mutex::new(LifecycleState::Idle),
            shutdown,
            handles: Mutex::new(Vec::new()),
        }
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// `Idle -> Running`. Returns `false` when already running or stopped.
    pub fn begin(&self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if *state != LifecycleState::Idle {
            return false;
        }
        *state = LifecycleState::Running;
        true
    }

    /// Run `job` every `period`. With `immediate` the first run happens now,
    /// otherwise after one full period.
    pub fn spawn_every<F, Fut>(&self, name: &'static str, period: Duration, immediate: bool, job: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut shutdown = self.shutdown.subscribe();
        let start = if immediate {
            Instant::now()
        } else {
            Instant::now() + period
        };

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(start, period);
            // a slow cycle delays the next one instead of causing a burst
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tracing::debug!(job = name, period_secs = period.as_secs(), "Job scheduled");

            loop {
                if *shutdown.borrow() {
                    break;
                }
                tokio::select! {
                    _ = ticker.tick() => job().await,
                    _ = shutdown.changed() => break,
                }
            }
            tracing::debug!(job = name, "Job finished");
        });

        self.handles
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(handle);
    }

    /// `Running -> Stopped`. Waits for in-flight cycles to complete.
    pub async fn stop(&self) {
        {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            if *state == LifecycleState::Stopped {
                return;
            }
            *state = LifecycleState::Stopped;
        }
        let _ = self.shutdown.send(true);

        let handles: Vec<_> = self
            .handles
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .drain(..)
            .collect();
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!("Scheduled job ended abnormally: {:?}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn lifecycle_transitions() {
        let scheduler = Scheduler::new();
        assert_eq!(scheduler.state(), LifecycleState::Idle);
        assert!(scheduler.begin());
        assert!(!scheduler.begin());
        assert_eq!(scheduler.state(), LifecycleState::Running);
        scheduler.stop().await;
        assert_eq!(scheduler.state(), LifecycleState::Stopped);
        assert!(!scheduler.begin());
    }

    #[tokio::test(start_paused = true)]
    async fn immediate_job_runs_then_repeats() {
        let scheduler = Scheduler::new();
        scheduler.begin();
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        scheduler.spawn_every("count", Duration::from_secs(60), true, move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_secs(150)).await;
        scheduler.stop().await;
        assert_eq!(runs.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_lets_in_flight_cycle_finish() {
        let scheduler = Scheduler::new();
        scheduler.begin();
        let finished = Arc::new(AtomicUsize::new(0));
        let counter = finished.clone();
        scheduler.spawn_every("slow", Duration::from_secs(60), true, move || {
            let counter = counter.clone();
            async move {
                tokio::time::sleep(Duration::from_secs(5)).await;
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_secs(1)).await;
        scheduler.stop().await;
        assert_eq!(finished.load(Ordering::SeqCst), 1);
    }
}
