//! Bounded, cancellable polling.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::debug;

use crate::error::{PublishError, PublishResult};

/// How often and for how long to poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
    pub timeout: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_attempts: 450,
            timeout: Duration::from_secs(15 * 60),
        }
    }
}

impl PollPolicy {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Create a linked cancel handle and signal.
pub fn cancel_pair() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx: Arc::new(tx) }, CancelSignal { rx })
}

/// Triggers cancellation.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

/// Observes cancellation.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancelled. Never resolves if the handle is dropped first.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Outcome of one poll attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStep<T> {
    Pending,
    Done(T),
}

/// Call `check` until it is done, fails, runs out of attempts or time, or
/// the signal fires.
pub async fn poll_until<T, F, Fut>(
    policy: &PollPolicy,
    cancel: &CancelSignal,
    mut check: F,
) -> PublishResult<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = PublishResult<PollStep<T>>>,
{
    let started = Instant::now();
    let mut signal = cancel.clone();
    let mut attempts = 0;

    while attempts < policy.max_attempts {
        if signal.is_cancelled() {
            return Err(PublishError::Cancelled);
        }

        attempts += 1;
        if let PollStep::Done(value) = check(attempts).await? {
            return Ok(value);
        }

        if attempts >= policy.max_attempts || started.elapsed() >= policy.timeout {
            break;
        }

        debug!("Waiting {:?} before poll attempt {}", policy.interval, attempts + 1);
        tokio::select! {
            _ = signal.cancelled() => return Err(PublishError::Cancelled),
            _ = tokio::time::sleep(policy.interval) => {}
        }
    }

    Err(PublishError::PollExhausted {
        attempts,
        elapsed_secs: started.elapsed().as_secs(),
    })
}
