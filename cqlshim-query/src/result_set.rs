//! Rows returned by one or more statements.
//!
//! When a multi-statement query is split and its parts run concurrently, the
//! per-statement result sets are concatenated with [`ResultSet::concat`] in
//! statement order, so the caller sees a single cursor.

use std::sync::Arc;

use uuid::Uuid;

use crate::adapter::{ColumnAdapter, TimeUuidAdapter, Utf8Adapter, UuidAdapter};
use crate::error::ConversionError;
use crate::value::Value;

/// Column names plus ordered rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    columns: Arc<[String]>,
    rows: Vec<Vec<Value>>,
}

impl ResultSet {
    /// Create a result set.
    pub fn new(columns: impl Into<Arc<[String]>>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            columns: columns.into(),
            rows,
        }
    }

    /// A result set with no columns and no rows.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Concatenate result sets in the given order.
    ///
    /// Column names are taken from the first part that has any; parts whose
    /// columns differ keep their rows but are read through the first part's
    /// names.
    pub fn concat(parts: impl IntoIterator<Item = ResultSet>) -> Self {
        let mut columns: Option<Arc<[String]>> = None;
        let mut rows = Vec::new();
        for part in parts {
            if columns.is_none() && !part.columns.is_empty() {
                columns = Some(Arc::clone(&part.columns));
            }
            rows.extend(part.rows);
        }
        Self {
            columns: columns.unwrap_or_else(|| Arc::from(Vec::new())),
            rows,
        }
    }

    /// Column names.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column, matched case-insensitively.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
    }

    /// Iterate over rows.
    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(move |values| Row { set: self, values })
    }

    /// Get a row by position.
    #[must_use]
    pub fn row(&self, index: usize) -> Option<Row<'_>> {
        self.rows.get(index).map(|values| Row { set: self, values })
    }
}

/// A borrowed row of a [`ResultSet`].
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    set: &'a ResultSet,
    values: &'a [Value],
}

impl<'a> Row<'a> {
    /// Get a value by column name.
    pub fn get(&self, column: &str) -> Result<&'a Value, ConversionError> {
        self.set
            .column_index(column)
            .and_then(|i| self.values.get(i))
            .ok_or_else(|| ConversionError::UnknownColumn(column.to_string()))
    }

    /// Get a value by position.
    #[must_use]
    pub fn get_at(&self, index: usize) -> Option<&'a Value> {
        self.values.get(index)
    }

    /// Get an int column.
    pub fn get_int(&self, column: &str) -> Result<i32, ConversionError> {
        self.get(column)?.as_i32()
    }

    /// Get a bigint column.
    pub fn get_long(&self, column: &str) -> Result<i64, ConversionError> {
        self.get(column)?.as_i64()
    }

    /// Get a text column; null maps to `None`.
    pub fn get_string(&self, column: &str) -> Result<Option<String>, ConversionError> {
        Utf8Adapter.compose(self.get(column)?)
    }

    /// Get a uuid or timeuuid column; null maps to `None`.
    pub fn get_uuid(&self, column: &str) -> Result<Option<Uuid>, ConversionError> {
        let value = self.get(column)?;
        match value {
            Value::TimeUuid(_) => TimeUuidAdapter.compose(value),
            _ => UuidAdapter.compose(value),
        }
    }

    /// All values of the row.
    #[must_use]
    pub fn values(&self) -> &'a [Value] {
        self.values
    }
}
