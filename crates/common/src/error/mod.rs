//! Error types for lifecycle coordination
//!
//! This module defines the fault taxonomy shared by the disposal guard, the
//! idempotent initializer, and the lifecycle controller:
//!
//! | Variant | Trigger | Handling |
//! |---------|---------|----------|
//! | `Disposed` | guarded entry point used after `dispose()` | always enforced |
//! | `InitFailed` | the one-time setup body raised | delivered to every caller that joined the attempt; the gate rolls back so the next call retries |
//! | `Cancelled` | forced `stop()` | settled exactly once into the active run handle, carrying controller identity and an optional reason |
//! | `NoActiveRun` | `stop()` while nothing is running | always enforced |
//!
//! Programming-precondition violations (calling `initialize()` outside of
//! `ensure_initialized()`) are not represented here; they are debug-only
//! assertions and must not be relied on for control flow.
//!
//! `LifecycleError` is `Clone` because a single failed initialization attempt
//! fans its error out to every joined waiter.

use std::time::Duration;

use thiserror::Error;

/// Standard result type using [`LifecycleError`]
pub type LifecycleResult<T> = Result<T, LifecycleError>;

/// Faults raised by the lifecycle coordination primitives
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    /// A guarded entry point was used after `dispose()`
    #[error("disposed object used{}", operation_suffix(.operation))]
    Disposed {
        /// Entry point that was guarded, when the caller named one
        operation: Option<String>,
    },

    /// The one-time setup body failed; the initializer rolled back and the
    /// next `ensure_initialized()` call starts a fresh attempt
    #[error("initialization failed: {message}")]
    InitFailed {
        /// Rendered setup failure
        message: String,
    },

    /// A forced stop settled the active run handle
    #[error("run cancelled by controller '{controller}'{}", reason_suffix(.reason))]
    Cancelled {
        /// Identity of the controller that issued the stop
        controller: String,
        /// Human-readable reason supplied to `stop`, if any
        reason: Option<String>,
    },

    /// `stop()` was issued while no run was active
    #[error("controller '{controller}' has no active run")]
    NoActiveRun {
        /// Identity of the controller
        controller: String,
    },
}

fn operation_suffix(operation: &Option<String>) -> String {
    operation.as_deref().map(|op| format!(" during '{op}'")).unwrap_or_default()
}

fn reason_suffix(reason: &Option<String>) -> String {
    reason.as_deref().map(|r| format!(": {r}")).unwrap_or_default()
}

impl LifecycleError {
    /// Create a disposal fault with no operation context
    pub fn disposed() -> Self {
        Self::Disposed { operation: None }
    }

    /// Create a disposal fault naming the guarded entry point
    pub fn disposed_during<S: Into<String>>(operation: S) -> Self {
        Self::Disposed { operation: Some(operation.into()) }
    }

    /// Create an initialization failure
    pub fn init_failed<S: Into<String>>(message: S) -> Self {
        Self::InitFailed { message: message.into() }
    }

    /// Create a cancellation fault carrying the controller identity
    pub fn cancelled<C: Into<String>>(controller: C, reason: Option<String>) -> Self {
        Self::Cancelled { controller: controller.into(), reason }
    }

    /// Create a missing-active-run fault
    pub fn no_active_run<C: Into<String>>(controller: C) -> Self {
        Self::NoActiveRun { controller: controller.into() }
    }

    /// Reason string carried by a cancellation fault, if any
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Cancelled { reason, .. } => reason.as_deref(),
            _ => None,
        }
    }

    /// Whether this fault is a forced-stop cancellation
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// Error classification trait for consistent handling across modules
///
/// Mirrors the retry/monitoring interface used by the rest of the workspace:
/// retryability drives whether the caller should attempt the operation
/// again, severity drives logging and alerting decisions.
pub trait ErrorClassification {
    /// Check if the failed operation may be attempted again
    fn is_retryable(&self) -> bool;

    /// Get the error severity level
    fn severity(&self) -> ErrorSeverity;

    /// Check if this error requires immediate attention
    fn is_critical(&self) -> bool;

    /// Get the suggested retry delay if applicable
    fn retry_after(&self) -> Option<Duration>;
}

impl ErrorClassification for LifecycleError {
    fn is_retryable(&self) -> bool {
        match self {
            // A fresh ensure_initialized() call starts a new attempt.
            Self::InitFailed { .. } => true,
            // Disposal is permanent; cancellation and missing-run are not
            // transient conditions.
            Self::Disposed { .. } | Self::Cancelled { .. } | Self::NoActiveRun { .. } => false,
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Disposed { .. } => ErrorSeverity::Error,
            Self::InitFailed { .. } => ErrorSeverity::Error,
            // An observed cancellation is the expected outcome of a forced
            // stop, not a malfunction.
            Self::Cancelled { .. } => ErrorSeverity::Info,
            Self::NoActiveRun { .. } => ErrorSeverity::Error,
        }
    }

    fn is_critical(&self) -> bool {
        false
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

/// Error severity levels for monitoring and alerting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Informational, typically for debugging
    Info,
    /// Warning, should be monitored but not critical
    Warning,
    /// Error, requires attention and action
    Error,
    /// Critical, immediate action required
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}
