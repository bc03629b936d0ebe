//! # Run Context
//!
//! Cancellation and deadline propagation for background workers and the
//! network calls they make. A [`RunHandle`] owns the cancel side; every
//! [`RunContext`] cloned from it observes the same signal.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::Instant;

/// Why a bounded operation did not complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContextError {
    /// The owning handle was cancelled or dropped.
    #[error("context cancelled")]
    Cancelled,
    /// The operation ran past its timeout or the context deadline.
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

/// Cancel side of a [`RunContext`].
#[derive(Debug)]
pub struct RunHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl RunHandle {
    /// Signal cancellation to every derived context.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// A context observing this handle.
    pub fn context(&self) -> RunContext {
        RunContext {
            rx: self.tx.subscribe(),
            deadline: None,
            _keepalive: None,
        }
    }
}

/// Cancellation signal plus optional deadline.
#[derive(Debug, Clone)]
pub struct RunContext {
    rx: watch::Receiver<bool>,
    deadline: Option<Instant>,
    _keepalive: Option<Arc<watch::Sender<bool>>>,
}

impl RunContext {
    /// A fresh handle/context pair.
    pub fn new() -> (RunHandle, RunContext) {
        let handle = RunHandle {
            tx: Arc::new(watch::channel(false).0),
        };
        let ctx = handle.context();
        (handle, ctx)
    }

    /// A context that is never cancelled and has no deadline.
    pub fn background() -> RunContext {
        let tx = Arc::new(watch::channel(false).0);
        RunContext {
            rx: tx.subscribe(),
            deadline: None,
            _keepalive: Some(tx),
        }
    }

    /// Child context whose deadline is the earlier of the current one and `deadline`.
    pub fn with_deadline(&self, deadline: Instant) -> RunContext {
        let deadline = match self.deadline {
            Some(existing) if existing < deadline => existing,
            _ => deadline,
        };
        RunContext {
            deadline: Some(deadline),
            ..self.clone()
        }
    }

    /// Child context expiring `timeout` from now.
    pub fn with_timeout(&self, timeout: Duration) -> RunContext {
        self.with_deadline(Instant::now() + timeout)
    }

    /// The deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// True once cancelled.
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves when cancelled. A dropped handle counts as cancelled.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }

    /// `timeout` shortened to fit the remaining time before the deadline.
    pub fn bound(&self, timeout: Duration) -> Duration {
        match self.deadline {
            Some(deadline) => timeout.min(deadline.saturating_duration_since(Instant::now())),
            None => timeout,
        }
    }

    /// Run `fut` under `timeout` (bounded by the deadline), aborting on cancellation.
    pub async fn run<F>(&self, timeout: Duration, fut: F) -> Result<F::Output, ContextError>
    where
        F: Future,
    {
        if self.is_cancelled() {
            return Err(ContextError::Cancelled);
        }
        let budget = self.bound(timeout);
        tokio::select! {
            _ = self.cancelled() => Err(ContextError::Cancelled),
            res = tokio::time::timeout(budget, fut) => res.map_err(|_| ContextError::DeadlineExceeded),
        }
    }

    /// Sleep for `duration`, returning early with an error on cancellation.
    pub async fn sleep(&self, duration: Duration) -> Result<(), ContextError> {
        tokio::select! {
            _ = self.cancelled() => Err(ContextError::Cancelled),
            _ = tokio::time::sleep(duration) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cancel_propagates() {
        let (handle, ctx) = RunContext::new();
        let child = ctx.with_timeout(Duration::from_secs(60));
        assert!(!child.is_cancelled());

        handle.cancel();
        assert!(ctx.is_cancelled());
        assert!(child.is_cancelled());
        child.cancelled().await;
    }

    #[tokio::test]
    async fn test_dropped_handle_counts_as_cancelled() {
        let (handle, ctx) = RunContext::new();
        drop(handle);
        ctx.cancelled().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_bound_uses_earliest_deadline() {
        let ctx = RunContext::background().with_timeout(Duration::from_secs(3));
        assert_eq!(ctx.bound(Duration::from_secs(8)), Duration::from_secs(3));
        assert_eq!(ctx.bound(Duration::from_secs(1)), Duration::from_secs(1));

        let wider = ctx.with_timeout(Duration::from_secs(30));
        assert_eq!(wider.bound(Duration::from_secs(8)), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_times_out() {
        let ctx = RunContext::background();
        let res = ctx
            .run(Duration::from_millis(10), tokio::time::sleep(Duration::from_secs(1)))
            .await;
        assert_eq!(res, Err(ContextError::DeadlineExceeded));
    }

    #[tokio::test]
    async fn test_run_after_cancel() {
        let (handle, ctx) = RunContext::new();
        handle.cancel();
        let res = ctx.run(Duration::from_secs(1), async { 7 }).await;
        assert_eq!(res, Err(ContextError::Cancelled));
    }

    #[tokio::test]
    async fn test_background_never_cancels() {
        let ctx = RunContext::background();
        let res = ctx.run(Duration::from_secs(1), async { 7 }).await;
        assert_eq!(res, Ok(7));
    }
}
