//! Materialized query results.
//!
//! Reader executions fully drain the driver cursor into a [`ResultSet`]
//! before the cursor is closed; nothing here borrows from the driver.

mod result_set;
mod row;

pub use result_set::ResultSet;
pub use row::CustomDbRow;
