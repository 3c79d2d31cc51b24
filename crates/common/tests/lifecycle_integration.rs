//! Lifecycle coordination integration tests
//!
//! Exercises the disposal guard, idempotent initializer, and lifecycle
//! controller composed into one consumer type, the way application
//! components use them together: guard entry points first, ensure
//! initialization next, then start and drive a run against the handle.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::future::join_all;
use tether_common::{
    AsyncInit, Disposable, DisposalGuard, InitGate, LifecycleController, LifecycleError,
    LifecycleResult, RunHandle,
};
use tokio::time::sleep;
use tokio_test::assert_ok;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// A consumer type composing all three lifecycle primitives.
struct Poller {
    disposal: DisposalGuard,
    gate: InitGate,
    controller: LifecycleController,
    init_entries: AtomicUsize,
    init_delay: Duration,
}

impl Poller {
    fn new(init_delay: Duration) -> Self {
        Self {
            disposal: DisposalGuard::new(),
            gate: InitGate::new(),
            controller: LifecycleController::new("poller"),
            init_entries: AtomicUsize::new(0),
            init_delay,
        }
    }

    /// Guarded entry point: disposal check, one-time setup, then start.
    async fn run(&self) -> LifecycleResult<RunHandle> {
        self.check_not_disposed("run")?;
        self.ensure_initialized().await?;
        Ok(self.controller.start())
    }

    /// Cooperative body: does units of work until the handle settles.
    ///
    /// A graceful settle winds down normally and reports the completed
    /// units; a forced settle surfaces the cancellation fault.
    async fn drive(handle: RunHandle) -> LifecycleResult<usize> {
        let mut units = 0usize;
        loop {
            tokio::select! {
                outcome = handle.wait() => {
                    outcome?;
                    return Ok(units);
                }
                () = sleep(Duration::from_millis(2)) => {
                    units += 1;
                }
            }
        }
    }
}

impl Disposable for Poller {
    fn disposal_guard(&self) -> &DisposalGuard {
        &self.disposal
    }
}

#[async_trait]
impl AsyncInit for Poller {
    fn init_gate(&self) -> &InitGate {
        &self.gate
    }

    async fn initialize(&self) -> LifecycleResult<()> {
        self.init_gate().debug_assert_initializing();
        self.init_entries.fetch_add(1, Ordering::SeqCst);
        sleep(self.init_delay).await;
        Ok(())
    }
}

/// Validates the shared-attempt contract on a composed consumer: three
/// concurrent setup calls issued together resolve around one body duration,
/// not three.
///
/// # Test Steps
/// 1. Create a Poller whose setup body takes 100ms
/// 2. Issue three concurrent `ensure_initialized()` calls at once
/// 3. Verify all three resolve without error
/// 4. Verify the elapsed time covers one body execution, not three
/// 5. Verify the body-entry counter reads exactly 1
#[tokio::test(flavor = "multi_thread")]
async fn test_concurrent_setup_shares_one_execution() {
    init_tracing();
    let poller = Arc::new(Poller::new(Duration::from_millis(100)));

    let started = Instant::now();
    let calls = (0..3).map(|_| {
        let poller = Arc::clone(&poller);
        async move { poller.ensure_initialized().await }
    });
    let outcomes = join_all(calls).await;
    let elapsed = started.elapsed();

    for outcome in outcomes {
        assert_ok!(outcome);
    }
    assert!(elapsed >= Duration::from_millis(100), "body must run to completion");
    assert!(elapsed < Duration::from_millis(250), "callers must share one execution");
    assert_eq!(poller.init_entries.load(Ordering::SeqCst), 1);
}

/// Validates handle identity across the controller state machine: the
/// self-loop returns the same run, a forced stop delivers the reason, and a
/// restart issues a distinct run.
///
/// # Test Steps
/// 1. Start the poller and capture handle H1
/// 2. Start again and capture H2; verify identity-equality with H1
/// 3. Force-stop with reason "shutdown"
/// 4. Verify awaiting H1 raises a fault carrying "shutdown"
/// 5. Verify the controller reports not running
/// 6. Start again and verify the new handle is a different run
#[tokio::test(flavor = "multi_thread")]
async fn test_forced_stop_and_restart_cycle() {
    init_tracing();
    let poller = Poller::new(Duration::from_millis(1));

    let h1 = poller.run().await.expect("run should start");
    let h2 = poller.run().await.expect("second run call should join");
    assert!(h1.same_run(&h2));

    poller.controller.stop_forced("shutdown").expect("stop should succeed");

    let err = h1.wait().await.expect_err("forced stop should cancel the run");
    assert!(err.is_cancellation());
    assert_eq!(err.reason(), Some("shutdown"));
    assert!(err.to_string().contains("shutdown"));
    assert!(!poller.controller.is_running());

    let h3 = poller.run().await.expect("restart should succeed");
    assert!(!h1.same_run(&h3));
}

/// Validates graceful shutdown of a cooperative body: the driving task does
/// work until the controller settles the handle, then winds down normally.
///
/// # Test Steps
/// 1. Start the poller and hand the handle to a driving task
/// 2. Let the body complete a few units of work
/// 3. Stop gracefully
/// 4. Verify the body returns Ok with the units it completed
#[tokio::test(flavor = "multi_thread")]
async fn test_graceful_stop_winds_body_down() {
    init_tracing();
    let poller = Poller::new(Duration::from_millis(1));

    let handle = poller.run().await.expect("run should start");
    let body = tokio::spawn(Poller::drive(handle));

    sleep(Duration::from_millis(20)).await;
    poller.controller.stop_graceful().expect("stop should succeed");

    let units = body
        .await
        .expect("body task should complete")
        .expect("graceful stop should wind down without fault");
    assert!(units > 0, "body should have completed some work before stopping");
}

/// Validates forced shutdown of a cooperative body: the cancellation fault
/// surfaces at the body's own await point.
///
/// # Test Steps
/// 1. Start the poller and hand the handle to a driving task
/// 2. Force-stop with reason "deadline"
/// 3. Verify the body surfaces the cancellation fault with the reason
#[tokio::test(flavor = "multi_thread")]
async fn test_forced_stop_surfaces_in_body() {
    init_tracing();
    let poller = Poller::new(Duration::from_millis(1));

    let handle = poller.run().await.expect("run should start");
    let body = tokio::spawn(Poller::drive(handle));

    sleep(Duration::from_millis(10)).await;
    poller.controller.stop_forced("deadline").expect("stop should succeed");

    let err = body
        .await
        .expect("body task should complete")
        .expect_err("forced stop should surface in the body");
    assert_eq!(err.reason(), Some("deadline"));
}

/// Validates the composition contract's disposal guard: once disposed, the
/// guarded entry point rejects before touching setup or the controller.
///
/// # Test Steps
/// 1. Dispose the poller before any run
/// 2. Verify `run()` fails with the disposal fault naming the entry point
/// 3. Verify the setup body never entered
#[tokio::test]
async fn test_disposed_poller_rejects_entry_points() {
    init_tracing();
    let poller = Poller::new(Duration::from_millis(1));

    assert!(poller.dispose());
    let err = poller.run().await.expect_err("disposed object must reject");
    assert_eq!(err, LifecycleError::disposed_during("run"));
    assert_eq!(poller.init_entries.load(Ordering::SeqCst), 0);
}

/// Validates `stop()` with no active run on a composed consumer.
///
/// # Test Steps
/// 1. Create a poller and never start it
/// 2. Verify `stop_graceful()` raises the missing-run fault
#[tokio::test]
async fn test_stop_before_start_fails() {
    init_tracing();
    let poller = Poller::new(Duration::from_millis(1));

    let err = poller.controller.stop_graceful().expect_err("no run is active");
    assert_eq!(err, LifecycleError::no_active_run("poller"));
}
