//! Lifecycle coordination primitives shared across Tether crates.
//!
//! The crate provides three independent building blocks that consumer types
//! compose into a controlled setup/run/teardown story:
//!
//! - **[`lifecycle::DisposalGuard`]**: permanently marks an object disposed
//!   and rejects guarded entry points afterwards
//! - **[`lifecycle::AsyncInit`]**: one-time asynchronous setup where
//!   concurrent callers share a single execution and failures roll back for
//!   retry
//! - **[`lifecycle::LifecycleController`]**: start/stop control for a
//!   long-running unit of work with a read-only, single-assignment
//!   termination signal
//!
//! None of the three depends on the others' internals; a type combining them
//! checks disposal first, ensures initialization next, and only then starts
//! a run.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod error;
pub mod lifecycle;

// Re-export commonly used types and traits for convenience
// ------------------------
pub use error::{ErrorClassification, ErrorSeverity, LifecycleError, LifecycleResult};
pub use lifecycle::{
    AsyncInit, Disposable, DisposalGuard, InitGate, InitStatus, LifecycleController, RunHandle,
    StopMode,
};
