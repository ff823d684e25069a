//! The dispatch seam between the executor and a backing store.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::StatementFailure;
use crate::outcome::StatementOutcome;
use crate::result_set::ResultSet;
use crate::statement::Statement;

/// A session able to run single statements.
///
/// Implementations own the wire protocol, retries and consistency; they
/// must classify every failure as transient or permanent. The executor
/// shares one session across all statements of a window, so methods take
/// `&self`.
#[async_trait]
pub trait StatementSession: Send + Sync {
    /// Run a statement for its side effect.
    async fn submit(&self, statement: &Statement) -> StatementOutcome;

    /// Run a statement and return its rows.
    async fn fetch(&self, statement: &Statement) -> Result<ResultSet, StatementFailure>;
}

#[async_trait]
impl<S: StatementSession + ?Sized> StatementSession for Arc<S> {
    async fn submit(&self, statement: &Statement) -> StatementOutcome {
        (**self).submit(statement).await
    }

    async fn fetch(&self, statement: &Statement) -> Result<ResultSet, StatementFailure> {
        (**self).fetch(statement).await
    }
}
