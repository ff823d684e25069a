//! [`StatementSession`] over a live cluster.

use async_trait::async_trait;
use cqlshim_query::{ResultSet, Statement, StatementFailure, StatementOutcome, StatementSession};
use scylla::QueryResult;
use tracing::debug;

use crate::error::ScyllaResult;
use crate::pool::ScyllaPool;
use crate::row::{into_result_set, rows_affected};

impl ScyllaPool {
    /// Run one statement: literal text directly, bound statements prepared
    /// through the cache.
    pub async fn run(&self, statement: &Statement) -> ScyllaResult<QueryResult> {
        match statement {
            Statement::Simple(cql) => self.query(cql).await,
            Statement::Bound { template, params } => self.execute(template, params).await,
        }
    }
}

fn failure(cql: &str, err: crate::ScyllaError) -> StatementFailure {
    let failure = err.to_failure();
    debug!(cql, kind = %failure.kind, error = %failure.message, "statement failed");
    failure
}

#[async_trait]
impl StatementSession for ScyllaPool {
    async fn submit(&self, statement: &Statement) -> StatementOutcome {
        match self.run(statement).await {
            Ok(result) => StatementOutcome::success(rows_affected(&result)),
            Err(err) => StatementOutcome::Failure(failure(statement.cql(), err)),
        }
    }

    async fn fetch(&self, statement: &Statement) -> Result<ResultSet, StatementFailure> {
        let result = self
            .run(statement)
            .await
            .map_err(|err| failure(statement.cql(), err))?;
        into_result_set(result).map_err(|err| failure(statement.cql(), err))
    }
}
