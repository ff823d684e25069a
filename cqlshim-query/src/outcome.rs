//! Per-statement outcomes and their ordered aggregate.

use std::time::Duration;

use crate::error::StatementFailure;

/// Result of dispatching one statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementOutcome {
    /// The statement was applied.
    Success {
        /// Rows affected as reported by the session.
        rows_affected: u64,
    },
    /// The statement failed.
    Failure(StatementFailure),
}

impl StatementOutcome {
    /// Create a success outcome.
    #[must_use]
    pub fn success(rows_affected: u64) -> Self {
        Self::Success { rows_affected }
    }

    /// Check if the statement succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Rows affected, if successful.
    #[must_use]
    pub fn rows_affected(&self) -> Option<u64> {
        match self {
            Self::Success { rows_affected } => Some(*rows_affected),
            Self::Failure(_) => None,
        }
    }

    /// The failure, if any.
    #[must_use]
    pub fn failure(&self) -> Option<&StatementFailure> {
        match self {
            Self::Success { .. } => None,
            Self::Failure(f) => Some(f),
        }
    }
}

impl From<Result<u64, StatementFailure>> for StatementOutcome {
    fn from(result: Result<u64, StatementFailure>) -> Self {
        match result {
            Ok(rows_affected) => Self::Success { rows_affected },
            Err(failure) => Self::Failure(failure),
        }
    }
}

/// Outcomes of a batch, one per statement, in submission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchResult {
    outcomes: Vec<StatementOutcome>,
}

impl BatchResult {
    pub(crate) fn new(outcomes: Vec<StatementOutcome>) -> Self {
        Self { outcomes }
    }

    /// The outcomes; entry `i` belongs to statement `i`.
    #[must_use]
    pub fn outcomes(&self) -> &[StatementOutcome] {
        &self.outcomes
    }

    /// Row counts per statement; failed statements report `None`.
    #[must_use]
    pub fn counts(&self) -> Vec<Option<u64>> {
        self.outcomes.iter().map(StatementOutcome::rows_affected).collect()
    }

    /// Indices and failures of statements that did not succeed.
    pub fn failures(&self) -> impl Iterator<Item = (usize, &StatementFailure)> {
        self.outcomes
            .iter()
            .enumerate()
            .filter_map(|(i, o)| o.failure().map(|f| (i, f)))
    }

    /// Check if every statement succeeded.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(StatementOutcome::is_success)
    }

    /// Number of outcomes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// Check if the result is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Consume the result, returning the outcomes.
    #[must_use]
    pub fn into_outcomes(self) -> Vec<StatementOutcome> {
        self.outcomes
    }
}

impl IntoIterator for BatchResult {
    type Item = StatementOutcome;
    type IntoIter = std::vec::IntoIter<StatementOutcome>;

    fn into_iter(self) -> Self::IntoIter {
        self.outcomes.into_iter()
    }
}

/// Statistics from one executor call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    /// Statements forwarded to the session.
    pub dispatched: usize,
    /// Windows started.
    pub windows: usize,
    /// Largest number of statements in flight at once.
    pub peak_in_flight: usize,
    /// Wall time of the call.
    pub elapsed: Duration,
}
