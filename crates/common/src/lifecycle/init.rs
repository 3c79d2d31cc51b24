//! Idempotent asynchronous initialization
//!
//! [`AsyncInit`] guards a one-time setup routine: any number of concurrent
//! `ensure_initialized()` callers share a single execution of the overridable
//! `initialize()` body and observe the identical outcome. A failed attempt
//! rolls the gate back so the next call starts exactly one fresh attempt;
//! there is no automatic retry.
//!
//! The state machine lives in [`InitGate`], which consumer types embed as a
//! field. The check-and-transition step is atomic under a mutex that is never
//! held across an await point; waiters join through a `tokio::sync::watch`
//! channel whose last value is retained, so late joiners and repeated reads
//! see the settled outcome.

use std::fmt;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::watch;

use crate::error::{LifecycleError, LifecycleResult};

/// Observable phase of a one-time initialization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitStatus {
    /// No attempt has run, or the last attempt failed and rolled back
    Uninitialized,
    /// An attempt is in flight; new callers join it
    Initializing,
    /// Setup completed; `ensure_initialized()` is a no-op
    Initialized,
}

impl fmt::Display for InitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "Uninitialized"),
            Self::Initializing => write!(f, "Initializing"),
            Self::Initialized => write!(f, "Initialized"),
        }
    }
}

/// Outcome slot shared by every caller that joined one attempt
type AttemptOutcome = Option<LifecycleResult<()>>;

/// One-time initialization gate embedded in consumer types
///
/// The gate only tracks state; the setup body itself belongs to the
/// [`AsyncInit`] implementor and runs through `ensure_initialized()`.
#[derive(Debug, Default)]
pub struct InitGate {
    state: Mutex<GateState>,
}

#[derive(Debug, Default)]
enum GateState {
    #[default]
    Idle,
    Busy(watch::Receiver<AttemptOutcome>),
    Ready,
}

/// What a caller atomically claimed from the gate
pub(crate) enum InitClaim<'a> {
    /// Setup already completed
    Ready,
    /// An attempt is in flight; await its shared outcome
    Join(watch::Receiver<AttemptOutcome>),
    /// This caller leads a fresh attempt and must settle it
    Lead(LeadGuard<'a>),
}

/// Exclusive right to run the setup body for one attempt
///
/// Settling broadcasts the outcome to every joiner. Dropping the guard
/// without settling (the driving future was cancelled mid-body) rolls the
/// gate back to idle so a later call can start over.
pub(crate) struct LeadGuard<'a> {
    gate: &'a InitGate,
    tx: Option<watch::Sender<AttemptOutcome>>,
}

impl InitGate {
    /// Create a gate in the uninitialized state
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase of the gate
    pub fn status(&self) -> InitStatus {
        match &*self.state.lock() {
            GateState::Idle => InitStatus::Uninitialized,
            GateState::Busy(_) => InitStatus::Initializing,
            GateState::Ready => InitStatus::Initialized,
        }
    }

    /// Whether setup has completed successfully
    pub fn is_initialized(&self) -> bool {
        self.status() == InitStatus::Initialized
    }

    /// Whether an attempt is currently in flight
    pub fn is_initializing(&self) -> bool {
        self.status() == InitStatus::Initializing
    }

    /// Debug-only precondition for `initialize()` bodies
    ///
    /// Call at the top of an `initialize()` override to catch direct
    /// invocations that bypass `ensure_initialized()`. Compiled out in
    /// release builds; never use it for control flow.
    #[track_caller]
    pub fn debug_assert_initializing(&self) {
        debug_assert!(
            self.is_initializing(),
            "initialize() must only be invoked through ensure_initialized()"
        );
    }

    /// Atomic check-and-transition for one `ensure_initialized()` call
    pub(crate) fn claim(&self) -> InitClaim<'_> {
        let mut state = self.state.lock();
        match &*state {
            GateState::Ready => InitClaim::Ready,
            GateState::Busy(rx) => InitClaim::Join(rx.clone()),
            GateState::Idle => {
                let (tx, rx) = watch::channel(None);
                *state = GateState::Busy(rx);
                InitClaim::Lead(LeadGuard { gate: self, tx: Some(tx) })
            }
        }
    }
}

impl LeadGuard<'_> {
    /// Record the attempt outcome and wake every joiner
    ///
    /// Success pins the gate at `Initialized`; failure rolls it back to
    /// `Uninitialized` so the next call starts a fresh attempt.
    pub(crate) fn settle(mut self, result: LifecycleResult<()>) {
        let Some(tx) = self.tx.take() else { return };
        {
            let mut state = self.gate.state.lock();
            *state = if result.is_ok() { GateState::Ready } else { GateState::Idle };
        }
        tx.send_replace(Some(result));
    }
}

impl Drop for LeadGuard<'_> {
    fn drop(&mut self) {
        // Leader future dropped mid-body; roll back so the gate stays
        // retryable. Joiners observe the closed channel.
        if self.tx.take().is_some() {
            tracing::warn!("initialization attempt abandoned before settling");
            *self.gate.state.lock() = GateState::Idle;
        }
    }
}

/// Await the shared outcome of an in-flight attempt
pub(crate) async fn join_attempt(
    mut rx: watch::Receiver<AttemptOutcome>,
) -> LifecycleResult<()> {
    loop {
        let settled = rx.borrow().clone();
        if let Some(outcome) = settled {
            return outcome;
        }
        if rx.changed().await.is_err() {
            // Sender gone. Either it settled right before dropping, or the
            // leader was cancelled and the attempt never completed.
            let settled = rx.borrow().clone();
            return settled.unwrap_or_else(|| {
                Err(LifecycleError::init_failed("initialization attempt abandoned"))
            });
        }
    }
}

/// Capability trait for types with one-time asynchronous setup
///
/// Implementors supply the gate storage hook and the setup body; consumers
/// only ever call [`ensure_initialized`](Self::ensure_initialized).
///
/// ```rust,ignore
/// struct Catalog {
///     gate: InitGate,
/// }
///
/// #[async_trait]
/// impl AsyncInit for Catalog {
///     fn init_gate(&self) -> &InitGate {
///         &self.gate
///     }
///
///     async fn initialize(&self) -> LifecycleResult<()> {
///         self.init_gate().debug_assert_initializing();
///         // load indexes, warm caches, ...
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait AsyncInit: Send + Sync {
    /// Storage hook: where the implementing type keeps its gate
    fn init_gate(&self) -> &InitGate;

    /// One-time setup body
    ///
    /// Never call this directly; it runs at most once per attempt, driven by
    /// `ensure_initialized()`. Returning an error rolls the gate back and
    /// makes the object eligible for one fresh attempt per subsequent call.
    async fn initialize(&self) -> LifecycleResult<()>;

    /// Run setup exactly once, sharing the execution with concurrent callers
    ///
    /// - already initialized: returns immediately
    /// - attempt in flight: joins it and observes the identical outcome
    /// - otherwise: leads a fresh attempt and broadcasts its result
    async fn ensure_initialized(&self) -> LifecycleResult<()> {
        match self.init_gate().claim() {
            InitClaim::Ready => Ok(()),
            InitClaim::Join(rx) => join_attempt(rx).await,
            InitClaim::Lead(lead) => {
                tracing::debug!("one-time initialization started");
                let result = self.initialize().await;
                match &result {
                    Ok(()) => tracing::debug!("one-time initialization complete"),
                    Err(error) => {
                        tracing::warn!(%error, "initialization failed, rolling back");
                    }
                }
                lead.settle(result.clone());
                result
            }
        }
    }
}
