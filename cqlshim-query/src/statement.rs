//! Statements and batches.
//!
//! A [`Statement`] is either literal CQL text or a template with one bound
//! parameter set. A [`Batch`] is an ordered list of independent statements;
//! the position of a statement in the batch is its submission index.

use std::sync::Arc;

use crate::value::Value;

/// A single statement to dispatch. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Literal CQL text.
    Simple(Arc<str>),
    /// A template with `?` markers and the values bound to them.
    Bound {
        /// The CQL template.
        template: Arc<str>,
        /// Values for the template's markers, in marker order.
        params: Params,
    },
}

impl Statement {
    /// Create a literal statement.
    pub fn simple(cql: impl Into<Arc<str>>) -> Self {
        Self::Simple(cql.into())
    }

    /// Create a parameterized statement.
    pub fn bound(template: impl Into<Arc<str>>, params: impl Into<Params>) -> Self {
        Self::Bound {
            template: template.into(),
            params: params.into(),
        }
    }

    /// The CQL text (the template for bound statements).
    #[must_use]
    pub fn cql(&self) -> &str {
        match self {
            Self::Simple(cql) | Self::Bound { template: cql, .. } => cql,
        }
    }

    /// The bound parameters, if any.
    #[must_use]
    pub fn params(&self) -> Option<&Params> {
        match self {
            Self::Simple(_) => None,
            Self::Bound { params, .. } => Some(params),
        }
    }

    /// Check if the statement carries bound parameters.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        matches!(self, Self::Bound { .. })
    }
}

impl From<&str> for Statement {
    fn from(cql: &str) -> Self {
        Self::simple(cql)
    }
}

impl From<String> for Statement {
    fn from(cql: String) -> Self {
        Self::simple(cql)
    }
}

/// One parameter set for a template.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    values: Vec<Value>,
}

impl Params {
    /// Create an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a parameter set of `len` slots, all unset.
    #[must_use]
    pub fn unset(len: usize) -> Self {
        Self {
            values: vec![Value::Unset; len],
        }
    }

    /// Set the slot at a 0-based position, growing with unset slots as needed.
    pub fn set(&mut self, index: usize, value: impl Into<Value>) {
        if index >= self.values.len() {
            self.values.resize(index + 1, Value::Unset);
        }
        self.values[index] = value.into();
    }

    /// Append a value.
    #[must_use]
    pub fn push(mut self, value: impl Into<Value>) -> Self {
        self.values.push(value.into());
        self
    }

    /// The bound values.
    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Number of slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if there are no slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<Vec<Value>> for Params {
    fn from(values: Vec<Value>) -> Self {
        Self { values }
    }
}

impl FromIterator<Value> for Params {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// An ordered sequence of independent statements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    statements: Vec<Statement>,
}

impl Batch {
    /// Create a new empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a batch with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            statements: Vec::with_capacity(capacity),
        }
    }

    /// Append a statement.
    pub fn push(&mut self, statement: impl Into<Statement>) {
        self.statements.push(statement.into());
    }

    /// Append a statement, builder style.
    #[must_use]
    pub fn add(mut self, statement: impl Into<Statement>) -> Self {
        self.push(statement);
        self
    }

    /// The statements in submission order.
    #[must_use]
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    /// Get the number of statements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    /// Check if the batch is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Remove every statement.
    pub fn clear(&mut self) {
        self.statements.clear();
    }
}

impl<S: Into<Statement>> FromIterator<S> for Batch {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            statements: iter.into_iter().map(Into::into).collect(),
        }
    }
}
