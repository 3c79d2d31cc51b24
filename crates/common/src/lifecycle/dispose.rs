//! Disposal guard for one-way object teardown
//!
//! A [`DisposalGuard`] is an embeddable flag that marks its owner permanently
//! unusable. Consumer types hold a guard as a field and call
//! [`DisposalGuard::check_operation`] at the top of every public entry point
//! they want rejected after teardown; the guard itself never intercepts
//! anything automatically.
//!
//! The flag is one-way: once set it never resets, and calling
//! [`DisposalGuard::dispose`] twice is not an error.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{LifecycleError, LifecycleResult};

/// One-way disposed flag embedded in consumer types
#[derive(Debug, Default)]
pub struct DisposalGuard {
    disposed: AtomicBool,
}

impl DisposalGuard {
    /// Create a guard in the not-disposed state
    pub fn new() -> Self {
        Self { disposed: AtomicBool::new(false) }
    }

    /// Mark the owner disposed
    ///
    /// Idempotent: returns `true` only for the call that flipped the flag,
    /// `false` for every later call.
    pub fn dispose(&self) -> bool {
        !self.disposed.swap(true, Ordering::AcqRel)
    }

    /// Whether the owner has been disposed
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Fail once the owner is disposed; no side effects otherwise
    pub fn check(&self) -> LifecycleResult<()> {
        if self.is_disposed() {
            return Err(LifecycleError::disposed());
        }
        Ok(())
    }

    /// Like [`check`](Self::check), embedding the entry point name in the
    /// fault for diagnostics
    pub fn check_operation(&self, operation: &str) -> LifecycleResult<()> {
        if self.is_disposed() {
            return Err(LifecycleError::disposed_during(operation));
        }
        Ok(())
    }
}

/// Capability trait for types that guard entry points behind a disposal flag
///
/// Implementors supply the storage hook; `dispose`, `is_disposed`, and
/// `check_not_disposed` forward to the embedded guard.
///
/// ```rust,ignore
/// struct Connection {
///     disposal: DisposalGuard,
/// }
///
/// impl Disposable for Connection {
///     fn disposal_guard(&self) -> &DisposalGuard {
///         &self.disposal
///     }
/// }
///
/// impl Connection {
///     fn send(&self, frame: &[u8]) -> LifecycleResult<()> {
///         self.check_not_disposed("send")?;
///         // ...
///         Ok(())
///     }
/// }
/// ```
pub trait Disposable {
    /// Storage hook: where the implementing type keeps its guard
    fn disposal_guard(&self) -> &DisposalGuard;

    /// Mark this object disposed; further guarded calls fail
    fn dispose(&self) -> bool {
        self.disposal_guard().dispose()
    }

    /// Whether this object has been disposed
    fn is_disposed(&self) -> bool {
        self.disposal_guard().is_disposed()
    }

    /// Guard an entry point; call at the top of public methods
    fn check_not_disposed(&self, operation: &str) -> LifecycleResult<()> {
        self.disposal_guard().check_operation(operation)
    }
}
