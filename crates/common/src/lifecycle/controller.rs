//! Start/stop control for long-running units of work
//!
//! A [`LifecycleController`] standardizes the run lifecycle of a worker
//! body: `start()` hands out a read-only [`RunHandle`], and `stop()` settles
//! that handle exactly once, either gracefully or as a cancellation fault
//! carrying the controller identity and an optional reason.
//!
//! Cancellation is cooperative. The controller executes no work and never
//! preempts the body; a long-running body awaits or polls its handle at
//! points of its own choosing and winds down when the handle settles. The
//! write side of the signal (the watch sender) never leaves the controller,
//! so the handle is strictly a read capability.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::error::{LifecycleError, LifecycleResult};

/// How a `stop()` settles the active run handle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StopMode {
    /// Settle the handle successfully; the body winds down normally
    #[default]
    Graceful,
    /// Settle the handle with a cancellation fault
    Forced {
        /// Human-readable reason carried in the fault
        reason: Option<String>,
    },
}

impl StopMode {
    /// Forced stop with a reason string
    pub fn forced<S: Into<String>>(reason: S) -> Self {
        Self::Forced { reason: Some(reason.into()) }
    }

    /// Forced stop without a reason
    pub fn forced_silent() -> Self {
        Self::Forced { reason: None }
    }
}

#[derive(Debug, Clone)]
enum RunState {
    Pending,
    Settled(LifecycleResult<()>),
}

#[derive(Debug)]
struct RunInner {
    controller: Arc<str>,
    rx: watch::Receiver<RunState>,
}

/// Read-only, single-assignment termination signal for one run
///
/// Clones share the same underlying run: two handles from the same
/// uninterrupted `start()` sequence compare identity-equal via
/// [`same_run`](Self::same_run). Once settled the outcome never changes and
/// may be read any number of times.
#[derive(Debug, Clone)]
pub struct RunHandle {
    inner: Arc<RunInner>,
}

impl RunHandle {
    /// Identity of the controller that issued this handle
    pub fn controller(&self) -> &str {
        &self.inner.controller
    }

    /// Whether `other` observes the same run as `self`
    pub fn same_run(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Whether the run has been settled (gracefully or forcefully)
    pub fn is_settled(&self) -> bool {
        matches!(&*self.inner.rx.borrow(), RunState::Settled(_))
    }

    /// Non-blocking poll of the settled outcome
    ///
    /// `None` while the run is still active; once settled, always the same
    /// outcome.
    pub fn outcome(&self) -> Option<LifecycleResult<()>> {
        match &*self.inner.rx.borrow() {
            RunState::Pending => None,
            RunState::Settled(outcome) => Some(outcome.clone()),
        }
    }

    /// Await until the run settles
    ///
    /// `Ok(())` for a graceful stop, `Err(LifecycleError::Cancelled)` for a
    /// forced one. Awaiting an already-settled handle returns immediately
    /// with the same outcome.
    pub async fn wait(&self) -> LifecycleResult<()> {
        let mut rx = self.inner.rx.clone();
        loop {
            let state = rx.borrow().clone();
            if let RunState::Settled(outcome) = state {
                return outcome;
            }
            if rx.changed().await.is_err() {
                // Sender gone without settling: the controller was dropped
                // while this run was still active.
                let state = rx.borrow().clone();
                return match state {
                    RunState::Settled(outcome) => outcome,
                    RunState::Pending => Err(LifecycleError::cancelled(
                        self.inner.controller.as_ref(),
                        Some("controller dropped".to_string()),
                    )),
                };
            }
        }
    }
}

#[derive(Debug)]
struct ActiveRun {
    tx: watch::Sender<RunState>,
    handle: RunHandle,
}

/// Start/stop controller holding at most one active run
///
/// ```rust,ignore
/// let controller = LifecycleController::new("poller");
/// let handle = controller.start();
///
/// tokio::spawn(async move {
///     // body: poll until the controller settles the handle
///     loop {
///         tokio::select! {
///             outcome = handle.wait() => break outcome,
///             _ = do_one_unit_of_work() => {}
///         }
///     }
/// });
///
/// controller.stop(StopMode::forced("shutdown"))?;
/// ```
#[derive(Debug)]
pub struct LifecycleController {
    name: Arc<str>,
    active: Mutex<Option<ActiveRun>>,
}

impl LifecycleController {
    /// Create a controller with no active run
    ///
    /// The name is the identity carried in cancellation and missing-run
    /// faults.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self { name: name.into(), active: Mutex::new(None) }
    }

    /// Controller identity
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether a run is currently active
    pub fn is_running(&self) -> bool {
        self.active.lock().is_some()
    }

    /// Start a run, or join the active one
    ///
    /// While a run is active this returns a handle to the *same* run
    /// (identity-equal under [`RunHandle::same_run`]), never a new one. The
    /// controller performs no work itself; the caller drives the body and
    /// observes the handle to learn when it must stop.
    pub fn start(&self) -> RunHandle {
        let mut active = self.active.lock();
        if let Some(run) = active.as_ref() {
            return run.handle.clone();
        }

        let (tx, rx) = watch::channel(RunState::Pending);
        let handle =
            RunHandle { inner: Arc::new(RunInner { controller: Arc::clone(&self.name), rx }) };
        *active = Some(ActiveRun { tx, handle: handle.clone() });
        tracing::debug!(controller = %self.name, "run started");
        handle
    }

    /// Settle the active run and clear it
    ///
    /// Fails with [`LifecycleError::NoActiveRun`] when nothing is running;
    /// this includes a second `stop()` after a forced stop already settled
    /// the handle. After a successful `stop()` the controller is immediately
    /// eligible for a new `start()`.
    pub fn stop(&self, mode: StopMode) -> LifecycleResult<()> {
        let run = self.active.lock().take();
        let Some(run) = run else {
            return Err(LifecycleError::no_active_run(self.name.as_ref()));
        };

        let outcome = match mode {
            StopMode::Graceful => {
                tracing::debug!(controller = %self.name, "run stopped gracefully");
                Ok(())
            }
            StopMode::Forced { reason } => {
                tracing::debug!(
                    controller = %self.name,
                    reason = reason.as_deref().unwrap_or(""),
                    "run stopped forcefully"
                );
                Err(LifecycleError::cancelled(self.name.as_ref(), reason))
            }
        };
        run.tx.send_replace(RunState::Settled(outcome));
        Ok(())
    }

    /// Convenience wrapper for `stop(StopMode::Graceful)`
    pub fn stop_graceful(&self) -> LifecycleResult<()> {
        self.stop(StopMode::Graceful)
    }

    /// Convenience wrapper for a forced stop with a reason
    pub fn stop_forced(&self, reason: impl Into<String>) -> LifecycleResult<()> {
        self.stop(StopMode::forced(reason))
    }
}
