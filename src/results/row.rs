use std::collections::HashMap;
use std::sync::Arc;

use crate::types::RowValues;

/// A single row from a reader execution.
///
/// Column names are shared across all rows of a result set.
#[derive(Debug, Clone)]
pub struct CustomDbRow {
    /// The column names for this row (shared across the result set)
    pub column_names: Arc<Vec<String>>,
    /// The cell values for this row
    pub values: Vec<RowValues>,
    // Cache for column lookups, avoids repeated string comparisons
    #[doc(hidden)]
    pub(crate) column_index_cache: Arc<HashMap<String, usize>>,
}

impl CustomDbRow {
    /// Create a new row over shared column names.
    #[must_use]
    pub fn new(column_names: Arc<Vec<String>>, values: Vec<RowValues>) -> Self {
        let cache = Arc::new(
            column_names
                .iter()
                .enumerate()
                .map(|(i, name)| (name.clone(), i))
                .collect::<HashMap<_, _>>(),
        );

        Self {
            column_names,
            values,
            column_index_cache: cache,
        }
    }

    /// Index of a column by name, or `None` if the column does not exist.
    #[must_use]
    pub fn get_column_index(&self, column_name: &str) -> Option<usize> {
        if let Some(&idx) = self.column_index_cache.get(column_name) {
            return Some(idx);
        }

        self.column_names.iter().position(|col| col == column_name)
    }

    /// Value of a column by name, or `None` if the column does not exist.
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&RowValues> {
        self.get_column_index(column_name)
            .and_then(|idx| self.values.get(idx))
    }

    /// Value of a column by position.
    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&RowValues> {
        self.values.get(index)
    }
}
