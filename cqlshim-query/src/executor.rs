//! Windowed batch execution with a concurrency ceiling.
//!
//! A batch of `N` statements is cut into `ceil(N / M)` windows of at most
//! `M` statements. All statements of a window are dispatched together and
//! the executor waits for the whole window before starting the next one, so
//! at most `M` statements are ever in flight. Outcomes are written back at
//! their submission index, whatever order they complete in.
//!
//! ```rust,ignore
//! use cqlshim_query::{Batch, BatchExecutor, MAX_ASYNC_QUERIES};
//!
//! let executor = BatchExecutor::new(session);
//! let batch: Batch = (0..1200)
//!     .map(|i| format!("INSERT INTO t (k) VALUES ({i})"))
//!     .collect();
//!
//! let result = executor.execute(&batch, MAX_ASYNC_QUERIES).await?;
//! assert_eq!(result.len(), 1200);
//! ```

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::ops::Range;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, trace, warn};

use crate::error::{BatchError, ExecResult, StatementFailure};
use crate::outcome::{BatchResult, BatchStats, StatementOutcome};
use crate::result_set::ResultSet;
use crate::session::StatementSession;
use crate::statement::{Batch, Statement};

/// Default ceiling on statements in flight for one batch.
pub const MAX_ASYNC_QUERIES: usize = 1000;

/// What the executor does when a statement fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FailurePolicy {
    /// Stop after the failing window and return a single error.
    #[default]
    #[serde(rename = "abort")]
    AbortBatch,
    /// Run every window and keep failures at their index in the result.
    #[serde(rename = "collect")]
    CollectOutcomes,
}

/// Configuration for a [`BatchExecutor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Ceiling used by [`BatchExecutor::execute_batch`].
    pub max_async_queries: usize,
    /// Failure handling for [`BatchExecutor::execute`].
    pub failure_policy: FailurePolicy,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_async_queries: MAX_ASYNC_QUERIES,
            failure_policy: FailurePolicy::AbortBatch,
        }
    }
}

impl ExecutorConfig {
    /// Set the default concurrency ceiling.
    #[must_use]
    pub fn with_max_async_queries(mut self, max: usize) -> Self {
        self.max_async_queries = max.max(1);
        self
    }

    /// Set the failure policy.
    #[must_use]
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }
}

/// Partition `len` statements into windows of at most `max`.
///
/// The partition depends only on `len` and `max`. A `max` of zero is
/// treated as one.
#[must_use]
pub fn windows(len: usize, max: usize) -> Vec<Range<usize>> {
    let max = max.max(1);
    (0..len)
        .step_by(max)
        .map(|start| start..(start + max).min(len))
        .collect()
}

/// Executes batches against a shared session.
pub struct BatchExecutor<S: ?Sized> {
    session: Arc<S>,
    config: ExecutorConfig,
}

impl<S: ?Sized> Clone for BatchExecutor<S> {
    fn clone(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
            config: self.config,
        }
    }
}

impl<S: ?Sized> std::fmt::Debug for BatchExecutor<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchExecutor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<S: StatementSession + ?Sized> BatchExecutor<S> {
    /// Create an executor with the default configuration.
    pub fn new(session: Arc<S>) -> Self {
        Self::with_config(session, ExecutorConfig::default())
    }

    /// Create an executor with a custom configuration.
    pub fn with_config(session: Arc<S>, config: ExecutorConfig) -> Self {
        Self { session, config }
    }

    /// The executor's configuration.
    #[must_use]
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// The shared session.
    #[must_use]
    pub fn session(&self) -> &Arc<S> {
        &self.session
    }

    /// Execute a batch with at most `max_concurrency` statements in flight.
    ///
    /// Returns one outcome per statement in submission order. Under
    /// [`FailurePolicy::AbortBatch`] any failed statement makes this return
    /// [`BatchError::Transient`] for the lowest failing index of the window
    /// in which it occurred; no later window is started.
    pub async fn execute(&self, batch: &Batch, max_concurrency: usize) -> ExecResult<BatchResult> {
        self.execute_with_stats(batch, max_concurrency)
            .await
            .map(|(result, _)| result)
    }

    /// Execute a batch using the configured ceiling.
    pub async fn execute_batch(&self, batch: &Batch) -> ExecResult<BatchResult> {
        self.execute(batch, self.config.max_async_queries).await
    }

    /// Like [`execute`](Self::execute), also returning call statistics.
    pub async fn execute_with_stats(
        &self,
        batch: &Batch,
        max_concurrency: usize,
    ) -> ExecResult<(BatchResult, BatchStats)> {
        let session = &*self.session;
        let (outcomes, stats) = self
            .run_windows(
                batch.statements(),
                max_concurrency,
                self.config.failure_policy,
                |statement| async move {
                    match session.submit(statement).await {
                        StatementOutcome::Success { rows_affected } => Ok(rows_affected),
                        StatementOutcome::Failure(failure) => Err(failure),
                    }
                },
            )
            .await?;

        let outcomes = outcomes.into_iter().map(StatementOutcome::from).collect();
        Ok((BatchResult::new(outcomes), stats))
    }

    /// Run row-returning statements and reassemble their rows.
    ///
    /// Rows appear in statement order, then in the order each statement
    /// returned them. Any failure aborts the call.
    pub async fn execute_query(&self, batch: &Batch, max_concurrency: usize) -> ExecResult<ResultSet> {
        let session = &*self.session;
        let (parts, _) = self
            .run_windows(
                batch.statements(),
                max_concurrency,
                FailurePolicy::AbortBatch,
                |statement| session.fetch(statement),
            )
            .await?;

        // Abort policy guarantees every part is Ok here.
        Ok(ResultSet::concat(parts.into_iter().filter_map(Result::ok)))
    }

    async fn run_windows<'b, T, F, Fut>(
        &self,
        statements: &'b [Statement],
        max_concurrency: usize,
        policy: FailurePolicy,
        dispatch: F,
    ) -> ExecResult<(Vec<Result<T, StatementFailure>>, BatchStats)>
    where
        F: Fn(&'b Statement) -> Fut,
        Fut: Future<Output = Result<T, StatementFailure>>,
    {
        if max_concurrency == 0 {
            return Err(BatchError::InvalidConcurrency(max_concurrency));
        }

        let start = Instant::now();
        let mut stats = BatchStats::default();
        let mut results = Vec::with_capacity(statements.len());

        if statements.is_empty() {
            return Ok((results, stats));
        }

        let windows = windows(statements.len(), max_concurrency);
        debug!(
            statements = statements.len(),
            max_concurrency,
            windows = windows.len(),
            "executing batch"
        );

        for (window_no, range) in windows.into_iter().enumerate() {
            let window = &statements[range.clone()];
            trace!(window = window_no, start = range.start, len = window.len(), "dispatching window");

            stats.windows += 1;
            stats.dispatched += window.len();
            stats.peak_in_flight = stats.peak_in_flight.max(window.len());

            let outcomes = join_all(window.iter().map(&dispatch)).await;

            if policy == FailurePolicy::AbortBatch {
                let first_failure = outcomes
                    .iter()
                    .enumerate()
                    .find_map(|(offset, r)| r.as_ref().err().map(|f| (offset, f)));

                if let Some((offset, failure)) = first_failure {
                    let index = range.start + offset;
                    warn!(
                        index,
                        window = window_no,
                        kind = %failure.kind,
                        error = %failure.message,
                        "statement failed, aborting batch"
                    );
                    return Err(BatchError::Transient {
                        index,
                        failure: failure.clone(),
                    });
                }
            }

            results.extend(outcomes);
        }

        stats.elapsed = start.elapsed();
        debug!(
            dispatched = stats.dispatched,
            windows = stats.windows,
            elapsed_ms = stats.elapsed.as_millis() as u64,
            "batch complete"
        );

        Ok((results, stats))
    }
}
