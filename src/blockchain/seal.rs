//! Waiting for transactions to be sealed.
//!
//! After submission a transaction moves through pending, finalized and
//! executed before it is sealed. The waiter polls the access node until it
//! sees `Sealed`, and gives up early on transport errors, expiry,
//! cancellation, the optional deadline, or the optional attempt cap.
//!
//! A sealed result is returned as-is even when it carries an execution
//! error; deciding what a failed transaction means is up to the caller.

use std::future::pending;
use std::time::Duration;

use tokio::time::{sleep, sleep_until, Instant};
use tokio_util::sync::CancellationToken;

use crate::blockchain::client::TransactionResultSource;
use crate::blockchain::types::{BlockchainError, BlockchainResult, Identifier, TransactionResult, TransactionStatus};
use crate::config::schema::SealConfig;
use crate::observability::metrics;
use crate::resilience::backoff_delay;

/// How long and how often to poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealPolicy {
    /// Delay between status checks (the base delay when backing off).
    pub poll_interval: Duration,
    /// Give up after this long. `None` waits forever.
    pub timeout: Option<Duration>,
    /// Give up after this many status checks. `None` means no cap.
    pub max_attempts: Option<u32>,
    /// Grow the delay exponentially instead of polling at a fixed rate.
    pub backoff: bool,
    /// Upper bound on a single backoff delay.
    pub max_backoff: Duration,
}

impl SealPolicy {
    /// Poll every `poll_interval` forever.
    pub fn unbounded(poll_interval: Duration) -> Self {
        Self {
            poll_interval,
            timeout: None,
            max_attempts: None,
            backoff: false,
            max_backoff: poll_interval,
        }
    }

    /// Delay to wait after `attempt` status checks.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        if self.backoff {
            backoff_delay(attempt, self.poll_interval, self.max_backoff)
        } else {
            self.poll_interval
        }
    }
}

impl Default for SealPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            timeout: Some(Duration::from_secs(300)),
            max_attempts: None,
            backoff: false,
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl From<&SealConfig> for SealPolicy {
    fn from(config: &SealConfig) -> Self {
        Self {
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            timeout: (config.timeout_secs > 0).then(|| Duration::from_secs(config.timeout_secs)),
            max_attempts: (config.max_attempts > 0).then_some(config.max_attempts),
            backoff: config.backoff,
            max_backoff: Duration::from_millis(config.max_backoff_ms),
        }
    }
}

/// Polls a result source until a transaction is sealed.
#[derive(Debug, Clone, Default)]
pub struct SealWaiter {
    policy: SealPolicy,
    cancel: CancellationToken,
}

impl SealWaiter {
    pub fn new(policy: SealPolicy) -> Self {
        Self {
            policy,
            cancel: CancellationToken::new(),
        }
    }

    /// Stop waiting as soon as `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn policy(&self) -> &SealPolicy {
        &self.policy
    }

    /// Wait for `tx_id` to be sealed.
    ///
    /// # Errors
    /// - the first failed status fetch, unchanged
    /// - [`BlockchainError::Expired`] when the node reports the transaction expired
    /// - [`BlockchainError::SealTimeout`], [`BlockchainError::SealAttemptsExhausted`]
    ///   and [`BlockchainError::Cancelled`] per the policy and token
    pub async fn wait<S>(&self, source: &S, tx_id: &Identifier) -> BlockchainResult<TransactionResult>
    where
        S: TransactionResultSource + ?Sized,
    {
        let started = Instant::now();
        let deadline = self.policy.timeout.map(|t| started + t);
        let mut attempt: u32 = 0;

        tracing::debug!(tx_id = %tx_id, "Waiting for transaction to be sealed");

        loop {
            if self.cancel.is_cancelled() {
                return Err(BlockchainError::Cancelled(*tx_id));
            }

            attempt += 1;
            let result = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(BlockchainError::Cancelled(*tx_id)),
                _ = until(deadline) => return Err(timed_out(tx_id, started)),
                fetched = source.get_transaction_result(tx_id) => fetched?,
            };
            metrics::record_seal_poll();

            match result.status {
                TransactionStatus::Sealed => {
                    let waited = started.elapsed();
                    metrics::record_seal_wait(waited);
                    tracing::info!(
                        tx_id = %tx_id,
                        attempts = attempt,
                        waited_ms = waited.as_millis() as u64,
                        "Transaction sealed"
                    );
                    return Ok(result);
                }
                TransactionStatus::Expired => return Err(BlockchainError::Expired(*tx_id)),
                status => {
                    tracing::debug!(tx_id = %tx_id, attempt, status = ?status, "Transaction not sealed yet");
                }
            }

            if self.policy.max_attempts.is_some_and(|max| attempt >= max) {
                return Err(BlockchainError::SealAttemptsExhausted {
                    tx_id: *tx_id,
                    attempts: attempt,
                });
            }

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(BlockchainError::Cancelled(*tx_id)),
                _ = sleep(self.policy.delay_after(attempt)) => {}
                _ = until(deadline) => return Err(timed_out(tx_id, started)),
            }
        }
    }
}

/// Resolves at `deadline`, or never when there is none.
async fn until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => pending::<()>().await,
    }
}

fn timed_out(tx_id: &Identifier, started: Instant) -> BlockchainError {
    BlockchainError::SealTimeout {
        tx_id: *tx_id,
        waited: started.elapsed(),
    }
}
