//! Statement-level facades over the batch executor.
//!
//! [`CassandraStatement`] accumulates literal statements and runs multi-
//! statement text; [`PreparedBatch`] binds one template many times. Both
//! are generic over the session so they can run against anything that
//! implements [`StatementSession`], and default to [`ScyllaPool`].

use std::sync::Arc;

use cqlshim_query::{
    Batch, BatchExecutor, BatchResult, Params, ResultSet, Statement, StatementSession, Value,
    count_placeholders, split_batch,
};
use tracing::debug;

use crate::error::{ScyllaError, ScyllaResult};
use crate::pool::ScyllaPool;

/// Literal statements, run individually or as a windowed batch.
#[derive(Debug)]
pub struct CassandraStatement<S: ?Sized = ScyllaPool> {
    executor: BatchExecutor<S>,
    batch: Batch,
}

impl<S> CassandraStatement<S>
where
    S: StatementSession + ?Sized,
{
    /// Create a statement over an executor.
    #[must_use]
    pub fn new(executor: BatchExecutor<S>) -> Self {
        Self {
            executor,
            batch: Batch::new(),
        }
    }

    /// The concurrency ceiling used for batches.
    #[must_use]
    pub fn max_async_queries(&self) -> usize {
        self.executor.config().max_async_queries
    }

    /// Queue one statement for the next [`execute_batch`](Self::execute_batch).
    pub fn add_batch(&mut self, cql: impl Into<Statement>) {
        self.batch.push(cql);
    }

    /// Drop every queued statement.
    pub fn clear_batch(&mut self) {
        self.batch.clear();
    }

    /// Number of queued statements.
    #[must_use]
    pub fn batch_len(&self) -> usize {
        self.batch.len()
    }

    /// Run the queued statements and clear the queue.
    ///
    /// The queue is cleared whether or not the batch succeeds.
    pub async fn execute_batch(&mut self) -> ScyllaResult<BatchResult> {
        let batch = std::mem::take(&mut self.batch);
        debug!(statements = batch.len(), "executing queued batch");
        Ok(self.executor.execute_batch(&batch).await?)
    }

    /// Split `text` on `;` and run every piece.
    ///
    /// One piece is a one-window batch; several run windowed.
    pub async fn execute(&self, text: &str) -> ScyllaResult<BatchResult> {
        let batch = split_batch(text);
        Ok(self.executor.execute_batch(&batch).await?)
    }

    /// Like [`execute`](Self::execute), returning the total rows affected.
    pub async fn execute_update(&self, text: &str) -> ScyllaResult<u64> {
        let result = self.execute(text).await?;
        Ok(result.outcomes().iter().filter_map(|o| o.rows_affected()).sum())
    }

    /// Split `text` on `;`, run every piece and concatenate the rows in
    /// statement order.
    pub async fn execute_query(&self, text: &str) -> ScyllaResult<ResultSet> {
        let batch = split_batch(text);
        Ok(self
            .executor
            .execute_query(&batch, self.max_async_queries())
            .await?)
    }
}

/// One template bound many times and run as a windowed batch.
#[derive(Debug)]
pub struct PreparedBatch<S: ?Sized = ScyllaPool> {
    executor: BatchExecutor<S>,
    template: Arc<str>,
    params: Params,
    batch: Batch,
}

impl<S> PreparedBatch<S>
where
    S: StatementSession + ?Sized,
{
    /// Wrap `template`; every bind marker (`?` or `:name`) starts out unset.
    ///
    /// Named markers are bound by position, in the order they appear.
    #[must_use]
    pub fn new(executor: BatchExecutor<S>, template: &str) -> Self {
        let params = Params::unset(count_placeholders(template));
        Self {
            executor,
            template: Arc::from(template),
            params,
            batch: Batch::new(),
        }
    }

    /// The CQL template.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Number of bind markers in the template.
    #[must_use]
    pub fn parameter_count(&self) -> usize {
        self.params.len()
    }

    /// Bind the 1-based parameter `index`.
    pub fn set(&mut self, index: usize, value: impl Into<Value>) -> ScyllaResult<()> {
        if index == 0 || index > self.params.len() {
            return Err(ScyllaError::PreparedStatement(format!(
                "parameter index {index} out of range 1..={}",
                self.params.len()
            )));
        }
        self.params.set(index - 1, value);
        Ok(())
    }

    /// Reset every parameter to unset.
    pub fn clear_parameters(&mut self) {
        self.params = Params::unset(self.params.len());
    }

    /// Snapshot the current parameters into the batch.
    ///
    /// Parameters keep their values afterwards; slots never set stay unset
    /// and leave their columns untouched on the server.
    pub fn add_batch(&mut self) {
        self.batch
            .push(Statement::bound(Arc::clone(&self.template), self.params.clone()));
    }

    /// Drop every snapshot.
    pub fn clear_batch(&mut self) {
        self.batch.clear();
    }

    /// Number of snapshots queued.
    #[must_use]
    pub fn batch_len(&self) -> usize {
        self.batch.len()
    }

    /// Run every snapshot and clear the queue.
    pub async fn execute_batch(&mut self) -> ScyllaResult<BatchResult> {
        let batch = std::mem::take(&mut self.batch);
        debug!(cql = %self.template, statements = batch.len(), "executing prepared batch");
        Ok(self.executor.execute_batch(&batch).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use cqlshim_query::{ExecutorConfig, FailureKind, StatementFailure, StatementOutcome};
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;

    /// Records submitted statements; `bogus` in the CQL fails.
    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<Statement>>,
    }

    #[async_trait]
    impl StatementSession for Recorder {
        async fn submit(&self, statement: &Statement) -> StatementOutcome {
            self.seen.lock().push(statement.clone());
            if statement.cql().contains("bogus") {
                StatementOutcome::Failure(StatementFailure::permanent("Undefined column name bogus"))
            } else {
                StatementOutcome::success(1)
            }
        }

        async fn fetch(&self, statement: &Statement) -> Result<ResultSet, StatementFailure> {
            self.seen.lock().push(statement.clone());
            let k: i32 = statement
                .cql()
                .rsplit('=')
                .next()
                .and_then(|k| k.trim().parse().ok())
                .unwrap_or_default();
            Ok(ResultSet::new(vec!["k".to_string()], vec![vec![Value::Int(k)]]))
        }
    }

    fn executor(max: usize) -> (Arc<Recorder>, BatchExecutor<Recorder>) {
        let session = Arc::new(Recorder::default());
        let config = ExecutorConfig::default().with_max_async_queries(max);
        (Arc::clone(&session), BatchExecutor::with_config(session, config))
    }

    #[tokio::test]
    async fn test_add_and_execute_batch() {
        let (session, executor) = executor(4);
        let mut statement = CassandraStatement::new(executor);

        for i in 0..10 {
            statement.add_batch(format!("INSERT INTO testcollection (k,L) VALUES( {i},[1, 3, 12345])"));
        }
        assert_eq!(statement.batch_len(), 10);

        let result = statement.execute_batch().await.unwrap();
        assert_eq!(result.counts(), vec![Some(1); 10]);
        assert_eq!(statement.batch_len(), 0);
        assert_eq!(session.seen.lock().len(), 10);
    }

    #[tokio::test]
    async fn test_failed_batch_still_clears_queue() {
        let (_, executor) = executor(4);
        let mut statement = CassandraStatement::new(executor);
        statement.add_batch("INSERT INTO t (k, bogus) VALUES (1, 1)");

        let err = statement.execute_batch().await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(err.failed_index(), Some(0));
        assert_eq!(statement.batch_len(), 0);
    }

    #[tokio::test]
    async fn test_clear_batch() {
        let (session, executor) = executor(4);
        let mut statement = CassandraStatement::new(executor);
        statement.add_batch("TRUNCATE t");
        statement.clear_batch();

        let result = statement.execute_batch().await.unwrap();
        assert!(result.is_empty());
        assert!(session.seen.lock().is_empty());
    }

    #[tokio::test]
    async fn test_execute_splits_text() {
        let (session, executor) = executor(2);
        let statement = CassandraStatement::new(executor);

        let affected = statement
            .execute_update("INSERT INTO t (k) VALUES (1); INSERT INTO t (k) VALUES (2); INSERT INTO t (k) VALUES (3);")
            .await
            .unwrap();

        assert_eq!(affected, 3);
        assert_eq!(session.seen.lock().len(), 3);
    }

    #[tokio::test]
    async fn test_execute_query_reassembles_rows() {
        let (_, executor) = executor(3);
        let statement = CassandraStatement::new(executor);

        let text: String = (0..7).map(|k| format!("SELECT * FROM t WHERE k = {k};")).collect();
        let rows = statement.execute_query(&text).await.unwrap();

        let keys: Vec<i32> = rows.rows().map(|r| r.get_int("k").unwrap()).collect();
        assert_eq!(keys, (0..7).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_prepared_batch_binds_one_based() {
        let (session, executor) = executor(4);
        let mut prepared = PreparedBatch::new(executor, "INSERT INTO testcollection (k,L,M) VALUES(?,?,?)");
        assert_eq!(prepared.parameter_count(), 3);

        for i in 0..5 {
            prepared.set(1, i).unwrap();
            prepared.set(2, vec![1, 3, 12345]).unwrap();
            prepared.add_batch();
        }

        let result = prepared.execute_batch().await.unwrap();
        assert_eq!(result.len(), 5);
        assert_eq!(prepared.batch_len(), 0);

        let seen = session.seen.lock();
        let params = seen[4].params().unwrap();
        assert_eq!(params.values()[0], Value::Int(4));
        assert_eq!(params.values()[2], Value::Unset);
        assert_eq!(seen[0].params().unwrap().values()[0], Value::Int(0));
    }

    #[tokio::test]
    async fn test_prepared_batch_binds_named_markers_by_position() {
        let (session, executor) = executor(4);
        let mut prepared =
            PreparedBatch::new(executor, "INSERT INTO testcollection (k,L,M) VALUES(:k, :l, :m)");
        assert_eq!(prepared.parameter_count(), 3);

        prepared.set(1, 7).unwrap();
        prepared.set(2, vec![1, 3, 12345]).unwrap();
        prepared.add_batch();
        prepared.execute_batch().await.unwrap();

        let seen = session.seen.lock();
        let values = seen[0].params().unwrap().values();
        assert_eq!(values[0], Value::Int(7));
        assert_eq!(values[2], Value::Unset);
    }

    #[tokio::test]
    async fn test_execute_skips_trailing_comment() {
        let (session, executor) = executor(4);
        let statement = CassandraStatement::new(executor);

        let result = statement
            .execute("INSERT INTO t (k) VALUES (1); -- it's done\n/* costs $5 */")
            .await
            .unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(session.seen.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_prepared_batch_rejects_bad_index() {
        let (_, executor) = executor(4);
        let mut prepared = PreparedBatch::new(executor, "INSERT INTO t (k,L) VALUES(?,?)");

        assert!(matches!(prepared.set(0, 1), Err(ScyllaError::PreparedStatement(_))));
        assert!(matches!(prepared.set(3, 1), Err(ScyllaError::PreparedStatement(_))));
        assert!(prepared.set(2, Value::Null).is_ok());
    }

    #[tokio::test]
    async fn test_clear_parameters() {
        let (session, executor) = executor(4);
        let mut prepared = PreparedBatch::new(executor, "UPDATE t SET v = ? WHERE k = ?");
        prepared.set(1, "x").unwrap();
        prepared.set(2, 1).unwrap();
        prepared.clear_parameters();
        prepared.add_batch();
        prepared.execute_batch().await.unwrap();

        let seen = session.seen.lock();
        assert_eq!(seen[0].params().unwrap().values(), &[Value::Unset, Value::Unset]);
    }

    #[tokio::test]
    async fn test_prepared_batch_failure_kind_is_kept() {
        let (_, executor) = executor(4);
        let mut prepared = PreparedBatch::new(executor, "INSERT INTO t (k, bogus) VALUES(?,?)");
        prepared.set(1, 1).unwrap();
        prepared.add_batch();

        let err = prepared.execute_batch().await.unwrap_err();
        assert_eq!(err.to_failure().kind, FailureKind::Permanent);
    }
}
