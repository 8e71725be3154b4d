// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Bounded retry of store calls on transient failures

use crate::config::RetryConfig;
use crate::store::{StoreError, StoreResult};
use backon::{ExponentialBuilder, Retryable};
use diagnostics::warn;
use std::future::Future;
use std::time::Duration;

impl RetryConfig {
    /// Backoff schedule for this policy
    #[must_use]
    pub fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_max_times(self.max_retries)
            .with_min_delay(Duration::from_millis(self.min_delay_ms))
            .with_max_delay(Duration::from_millis(self.max_delay_ms))
    }
}

/// Run `op`, retrying while it fails with [`StoreError::Transient`]
///
/// Non-transient errors and the last transient error are returned as-is.
pub async fn with_retry<T, F, Fut>(policy: &RetryConfig, what: &str, op: F) -> StoreResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = StoreResult<T>>,
{
    op.retry(policy.backoff())
        .sleep(tokio::time::sleep)
        .when(StoreError::is_transient)
        .notify(|err: &StoreError, delay: Duration| {
            let err = err.to_string();
            let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
            warn!("retrying {what} in {delay_ms}ms after {error}", what: what, delay_ms: delay_ms, error: err);
        })
        .await
}
