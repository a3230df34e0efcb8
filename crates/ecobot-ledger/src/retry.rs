// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Bounded retries with exponential backoff for ledger calls

use crate::error::LedgerResult;
use ecobot_config::LedgerConfig;
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

/// How often and how patiently to repeat a failed call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Initial backoff
    pub base_backoff: Duration,
    /// Upper bound for a single backoff
    pub max_backoff: Duration,
    /// Retries after the first attempt (0 = single attempt)
    pub max_retries: u32,
}

impl RetryPolicy {
    pub fn new(base_backoff: Duration, max_retries: u32) -> Self {
        Self {
            base_backoff,
            max_backoff: Duration::from_secs(5),
            max_retries,
        }
    }

    /// Single attempt, no retries
    pub fn none() -> Self {
        Self::new(Duration::ZERO, 0)
    }

    pub fn from_config(config: &LedgerConfig) -> Self {
        Self::new(
            Duration::from_millis(config.retry_backoff_ms),
            config.retry_attempts,
        )
    }

    pub fn schedule(&self) -> BackoffSchedule {
        BackoffSchedule {
            policy: *self,
            current_attempt: 0,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Duration::from_millis(250), 2)
    }
}

/// Per-call backoff state
#[derive(Debug, Clone)]
pub struct BackoffSchedule {
    policy: RetryPolicy,
    current_attempt: u32,
}

impl BackoffSchedule {
    /// Next backoff (`base * 2^(attempt - 1)`, capped), or `None` when exhausted
    pub fn next_backoff(&mut self) -> Option<Duration> {
        if self.is_exhausted() {
            return None;
        }
        self.current_attempt += 1;

        let factor = 2u32.saturating_pow(self.current_attempt - 1);
        let backoff = self
            .policy
            .base_backoff
            .saturating_mul(factor)
            .min(self.policy.max_backoff);
        Some(backoff)
    }

    pub fn attempt_number(&self) -> u32 {
        self.current_attempt
    }

    pub fn is_exhausted(&self) -> bool {
        self.current_attempt >= self.policy.max_retries
    }
}

/// Run `operation`, repeating it while it fails with a retryable error
///
/// ```ignore
/// let id = retry_with_backoff(&policy, "create period", || ledger.create_period(now)).await?;
/// ```
pub async fn retry_with_backoff<F, Fut, T>(
    policy: &RetryPolicy,
    operation_name: &str,
    mut operation: F,
) -> LedgerResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = LedgerResult<T>>,
{
    let mut schedule = policy.schedule();
    loop {
        match operation().await {
            Ok(result) => {
                if schedule.attempt_number() > 0 {
                    info!(
                        "[LEDGER] {} succeeded after {} retries",
                        operation_name,
                        schedule.attempt_number()
                    );
                }
                return Ok(result);
            }
            Err(e) if e.is_retryable() => match schedule.next_backoff() {
                Some(backoff) => {
                    warn!(
                        "[LEDGER] {} failed (retry {}): {} - retrying in {:?}",
                        operation_name,
                        schedule.attempt_number(),
                        e,
                        backoff
                    );
                    tokio::time::sleep(backoff).await;
                }
                None => {
                    warn!(
                        "[LEDGER] {} failed after {} retries - giving up",
                        operation_name,
                        schedule.attempt_number()
                    );
                    return Err(e);
                }
            },
            Err(e) => return Err(e),
        }
    }
}
