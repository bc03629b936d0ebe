//! Start/stop/force lifecycle shared by the chain sync jobs.

use parking_lot::Mutex;
use shared_types::{RunContext, RunHandle};
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{error, info};

/// What woke the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Trigger {
    Tick,
    Forced,
}

impl Trigger {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Trigger::Tick => "periodic",
            Trigger::Forced => "forced",
        }
    }
}

struct RunningJob {
    stop: RunHandle,
    force_tx: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

/// Holds at most one running worker. `start` and `stop` are idempotent.
pub(crate) struct JobSlot {
    name: &'static str,
    running: Mutex<Option<RunningJob>>,
}

impl JobSlot {
    pub(crate) fn new(name: &'static str) -> Self {
        Self {
            name,
            running: Mutex::new(None),
        }
    }

    /// Spawn the worker unless one is already alive. Returns `false` on no-op.
    pub(crate) fn start<F, Fut>(&self, spawn: F) -> bool
    where
        F: FnOnce(RunContext, mpsc::Receiver<()>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut running = self.running.lock();
        if let Some(job) = running.as_ref() {
            if !job.handle.is_finished() {
                return false;
            }
        }

        let (stop, stop_ctx) = RunContext::new();
        let (force_tx, force_rx) = mpsc::channel(1);
        let handle = tokio::spawn(spawn(stop_ctx, force_rx));
        *running = Some(RunningJob {
            stop,
            force_tx,
            handle,
        });
        info!("[uv-02] {} started", self.name);
        true
    }

    /// Signal the worker and wait until it has exited. Returns `false` on no-op.
    pub(crate) async fn stop(&self) -> bool {
        let job = self.running.lock().take();
        let Some(job) = job else {
            return false;
        };
        job.stop.cancel();
        if let Err(e) = job.handle.await {
            if e.is_panic() {
                error!("[uv-02] {} worker panicked", self.name);
            }
        }
        info!("[uv-02] {} stopped", self.name);
        true
    }

    /// Queue an immediate run. Never blocks; a pending request absorbs repeats.
    pub(crate) fn force(&self) -> bool {
        match self.running.lock().as_ref() {
            Some(job) if !job.handle.is_finished() => job.force_tx.try_send(()).is_ok(),
            _ => false,
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running
            .lock()
            .as_ref()
            .map(|job| !job.handle.is_finished())
            .unwrap_or(false)
    }
}

/// Drive `work` on every tick or force request until the parent context or
/// the stop signal fires. In-flight work is abandoned on stop.
pub(crate) async fn tick_loop<F, Fut>(
    name: &'static str,
    period: Duration,
    parent: &RunContext,
    stop: &RunContext,
    force_rx: &mut mpsc::Receiver<()>,
    mut work: F,
) where
    F: FnMut(Trigger) -> Fut,
    Fut: Future<Output = ()>,
{
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        let trigger = tokio::select! {
            _ = parent.cancelled() => {
                info!("[uv-02] {}: context cancelled; stopping", name);
                return;
            }
            _ = stop.cancelled() => {
                info!("[uv-02] {}: stop requested; stopping", name);
                return;
            }
            _ = ticker.tick() => Trigger::Tick,
            Some(()) = force_rx.recv() => Trigger::Forced,
        };

        tokio::select! {
            _ = stop.cancelled() => return,
            _ = work(trigger) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let slot = JobSlot::new("test job");
        let started = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let started = started.clone();
            slot.start(move |stop, _force| async move {
                started.fetch_add(1, Ordering::SeqCst);
                stop.cancelled().await;
            });
        }
        assert!(slot.is_running());

        assert!(slot.stop().await);
        assert!(!slot.stop().await);
        assert_eq!(started.load(Ordering::SeqCst), 1);
        assert!(!slot.is_running());
    }

    #[tokio::test]
    async fn test_force_never_double_queues() {
        let slot = JobSlot::new("test job");
        slot.start(|stop, _force_rx| async move {
            stop.cancelled().await;
        });
        assert!(slot.force());
        assert!(!slot.force());
        slot.stop().await;
        assert!(!slot.force());
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_loop_runs_on_tick_and_force() {
        let (_parent_handle, parent) = RunContext::new();
        let (stop_handle, stop) = RunContext::new();
        let (force_tx, mut force_rx) = mpsc::channel(1);
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));

        force_tx.try_send(()).unwrap();
        let task = {
            let seen = seen.clone();
            tokio::spawn(async move {
                tick_loop(
                    "test",
                    Duration::from_secs(10),
                    &parent,
                    &stop,
                    &mut force_rx,
                    |t| {
                        seen.lock().push(t);
                        async {}
                    },
                )
                .await;
            })
        };

        tokio::time::sleep(Duration::from_secs(15)).await;
        stop_handle.cancel();
        task.await.unwrap();

        let seen = seen.lock().clone();
        assert_eq!(seen, vec![Trigger::Forced, Trigger::Tick]);
    }
}
