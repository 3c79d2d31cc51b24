//! Lifecycle coordination for async components
//!
//! Three independent primitives that consumer types compose:
//! - **[`dispose`]**: one-way disposal flag guarding public entry points
//! - **[`init`]**: idempotent asynchronous initialization with shared
//!   attempts and failure rollback
//! - **[`controller`]**: start/stop control with a read-only,
//!   single-assignment termination signal
//!
//! A type combining all three checks disposal at each entry point, ensures
//! initialization before starting, and drives its run body against the
//! handle returned by `start()`:
//!
//! ```rust,ignore
//! struct Poller {
//!     disposal: DisposalGuard,
//!     gate: InitGate,
//!     controller: LifecycleController,
//! }
//!
//! impl Poller {
//!     async fn run(&self) -> LifecycleResult<RunHandle> {
//!         self.check_not_disposed("run")?;
//!         self.ensure_initialized().await?;
//!         Ok(self.controller.start())
//!     }
//! }
//! ```

pub mod controller;
pub mod dispose;
pub mod init;

// Re-export commonly used types and traits for convenience
pub use controller::{LifecycleController, RunHandle, StopMode};
pub use dispose::{Disposable, DisposalGuard};
pub use init::{AsyncInit, InitGate, InitStatus};
