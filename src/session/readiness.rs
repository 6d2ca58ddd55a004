//! Bounded, cancellable readiness polling for listen mode.
use std::{
    future::Future,
    io,
    process::ExitStatus,
    time::{Duration, Instant},
};

use tokio::{process::Child, time};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::lib::errors::WaitError;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(30);

/// How often and for how long to poll a freshly spawned editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub interval: Duration,
    /// `None` waits until the process exits or the wait is cancelled.
    pub timeout: Option<Duration>,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: Some(DEFAULT_WAIT_TIMEOUT),
        }
    }
}

/// Result of a readiness wait.
#[derive(Debug)]
pub enum WaitOutcome<T> {
    Ready(T),
    TimedOut { attempts: u32, elapsed: Duration },
    Cancelled,
    ProcessExited { status: ExitStatus },
}

/// Liveness check for the process that is expected to start listening.
pub trait ProcessProbe {
    /// `Ok(Some(status))` once the process has exited.
    fn exit_status(&mut self) -> io::Result<Option<ExitStatus>>;
}

impl ProcessProbe for Child {
    fn exit_status(&mut self) -> io::Result<Option<ExitStatus>> {
        self.try_wait()
    }
}

/// Errors that mean "the listener is not up yet".
pub fn is_transient(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotFound
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::AddrNotAvailable
    )
}

/// Repeatedly run `attempt` until it succeeds.
///
/// Stops early when the probed process has exited, the timeout elapses, or
/// `cancel` fires. The deadline and cancellation also interrupt an attempt
/// that is still in flight.
pub async fn wait_until_ready<T, P, F, Fut>(
    policy: WaitPolicy,
    cancel: &CancellationToken,
    probe: &mut P,
    mut attempt: F,
) -> Result<WaitOutcome<T>, WaitError>
where
    P: ProcessProbe + ?Sized,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = io::Result<T>>,
{
    let started_at = Instant::now();
    let deadline = policy.timeout.map(|timeout| time::Instant::now() + timeout);
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        let attempted = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(WaitOutcome::Cancelled),
            _ = until(deadline) => {
                return Ok(WaitOutcome::TimedOut {
                    attempts,
                    elapsed: started_at.elapsed(),
                });
            }
            result = attempt(attempts) => result,
        };

        match attempted {
            Ok(value) => return Ok(WaitOutcome::Ready(value)),
            Err(err) if is_transient(&err) => {
                debug!(
                    target: "nvim_ui::session",
                    attempt = attempts,
                    reason = %err,
                    "Listener not ready yet"
                );
            }
            Err(source) => return Err(WaitError::Attach { source }),
        }

        match probe.exit_status() {
            Ok(Some(status)) => return Ok(WaitOutcome::ProcessExited { status }),
            Ok(None) => {}
            Err(source) => return Err(WaitError::Probe { source }),
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(WaitOutcome::Cancelled),
            _ = until(deadline) => {
                return Ok(WaitOutcome::TimedOut {
                    attempts,
                    elapsed: started_at.elapsed(),
                });
            }
            _ = time::sleep(policy.interval) => {}
        }
    }
}

async fn until(deadline: Option<time::Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
