use std::sync::Arc;

use super::row::CustomDbRow;
use crate::types::RowValues;

/// A fully materialized result of a reader execution.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    /// The rows returned by the query, in fetch order.
    pub results: Vec<CustomDbRow>,
    /// Records-affected count as reported by the driver. Reads report `-1`.
    pub records_affected: i64,
    // Column names shared by all rows
    column_names: Option<Arc<Vec<String>>>,
}

impl ResultSet {
    /// Create a result set with preallocated row capacity. The
    /// records-affected count starts at the `-1` read sentinel.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> ResultSet {
        ResultSet {
            results: Vec::with_capacity(capacity),
            records_affected: -1,
            column_names: None,
        }
    }

    /// Set the column names shared by every row of this result set.
    pub fn set_column_names(&mut self, column_names: Arc<Vec<String>>) {
        self.column_names = Some(column_names);
    }

    /// Column names shared by the rows, if any row has been added or the
    /// names were set up front.
    #[must_use]
    pub fn column_names(&self) -> Option<&Arc<Vec<String>>> {
        self.column_names.as_ref()
    }

    /// Append one row of cell values. Requires the column names to have
    /// been set; values beyond the column count are dropped by consumers.
    pub fn add_row_values(&mut self, values: Vec<RowValues>) {
        if let Some(column_names) = &self.column_names {
            self.results
                .push(CustomDbRow::new(column_names.clone(), values));
        }
    }

    /// Number of rows fetched.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.results.len()
    }
}
