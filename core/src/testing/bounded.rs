//! Runs one operation on a dedicated worker thread under a wall-clock deadline.
//!
//! Cancellation is best-effort. On timeout the worker's [`CancellationToken`]
//! is cancelled and the worker is abandoned; an operation that never checks
//! the token (e.g. a CPU-bound regex search) keeps running in the background
//! until it returns on its own or the process exits. Callers must not assume
//! the worker stopped after [`Outcome::TimedOut`]. Killing it for sure needs a
//! process boundary, which is a deployment choice outside this module.

use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    sync::atomic::{AtomicU64, Ordering},
    thread,
    time::{Duration, Instant},
};

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use super::result::{FailureKind, Outcome};

static WORKER_SEQ: AtomicU64 = AtomicU64::new(0);

/// What the worker sends back: the instant the operation returned and its
/// result. `Ok` carries the memory the operation measured, if any.
type WorkerReport = (Instant, anyhow::Result<Option<u64>>);

#[derive(Debug, Clone, Default)]
pub struct BoundedExecutor {
    interrupt: CancellationToken,
}

impl BoundedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancelling `token` interrupts the caller's wait, yielding
    /// [`FailureKind::Interrupted`].
    pub fn interrupt_token(mut self, token: CancellationToken) -> Self {
        self.interrupt = token;
        self
    }

    /// Runs `op` on a fresh worker thread and waits at most `timeout` for it.
    ///
    /// `op` receives a token that is cancelled once the harness gives up on
    /// it; checking it is optional. A returned error or a panic becomes
    /// [`FailureKind::Execution`].
    pub async fn run<F>(&self, op: F, timeout: Duration) -> Outcome
    where
        F: FnOnce(&CancellationToken) -> anyhow::Result<Option<u64>> + Send + 'static,
    {
        if self.interrupt.is_cancelled() {
            return interrupted();
        }

        let cancel = CancellationToken::new();
        let (tx, rx) = oneshot::channel::<WorkerReport>();
        let seq = WORKER_SEQ.fetch_add(1, Ordering::Relaxed);

        let started_at = Instant::now();
        let spawned = thread::Builder::new()
            .name(format!("rebench-worker-{}", seq))
            .spawn({
                let cancel = cancel.clone();
                move || {
                    let res = panic::catch_unwind(AssertUnwindSafe(|| op(&cancel)))
                        .unwrap_or_else(|payload| Err(anyhow::anyhow!(panic_message(&*payload))));
                    let finished_at = Instant::now();
                    // The receiver is gone when the caller already gave up.
                    let _ = tx.send((finished_at, res));
                }
            });
        if let Err(e) = spawned {
            return Outcome::Failed {
                kind: FailureKind::Execution,
                message: format!("Failed to spawn worker thread: {}", e),
            };
        }
        log::debug!("worker #{} spawned (timeout={:?})", seq, timeout);

        tokio::select! {
            biased;

            _ = self.interrupt.cancelled() => {
                cancel.cancel();
                log::warn!("worker #{} abandoned: interrupted", seq);
                interrupted()
            }

            res = tokio::time::timeout(timeout, rx) => match res {
                Ok(Ok((finished_at, Ok(memory_bytes)))) => {
                    let elapsed = finished_at.saturating_duration_since(started_at);
                    log::debug!("worker #{} finished in {:?}", seq, elapsed);
                    Outcome::Completed { elapsed, memory_bytes }
                }
                Ok(Ok((_, Err(e)))) => {
                    log::debug!("worker #{} failed: {:#}", seq, e);
                    Outcome::Failed {
                        kind: FailureKind::Execution,
                        message: format!("{:#}", e),
                    }
                }
                Ok(Err(_)) => Outcome::Failed {
                    kind: FailureKind::Execution,
                    message: "Worker exited without reporting".to_owned(),
                },
                Err(_) => {
                    cancel.cancel();
                    log::warn!(
                        "worker #{} timed out after {:?}; it may keep running in the background",
                        seq,
                        timeout
                    );
                    Outcome::TimedOut
                }
            },
        }
    }
}

/// Runs `op` with a fresh executor that is never interrupted.
pub async fn run_bounded<F>(op: F, timeout: Duration) -> Outcome
where
    F: FnOnce(&CancellationToken) -> anyhow::Result<Option<u64>> + Send + 'static,
{
    BoundedExecutor::new().run(op, timeout).await
}

fn interrupted() -> Outcome {
    Outcome::Failed {
        kind: FailureKind::Interrupted,
        message: "Interrupted while waiting for the worker".to_owned(),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("Worker panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("Worker panicked: {}", s)
    } else {
        "Worker panicked".to_owned()
    }
}
