//! The driver collaborator seam.
//!
//! The middleware consumes the DB2 client as an opaque capability: open a
//! connection, create a command, execute it in one of three modes, and
//! begin/commit/roll back a transaction. Everything the orchestrator needs
//! is behind these traits, so it can be exercised against the in-memory
//! driver from `test_utils` and run for real against the ODBC driver.

mod command;
mod native;

use std::time::Duration;

use async_trait::async_trait;

pub use command::{BoundParameter, Command};
pub use native::{NativeIsolationLevel, NativeType};

use crate::error::Db2MiddlewareError;
use crate::types::RowValues;

/// Entry point of a driver: opens connections from an opaque DSN.
#[async_trait]
pub trait Db2Driver: Send + Sync {
    /// Open a connection. The timeout is the login/connect timeout; the
    /// driver decides how to enforce it.
    ///
    /// # Errors
    /// Returns `Db2MiddlewareError::ConnectionError` if the connection
    /// cannot be established.
    async fn open(
        &self,
        connection_string: &str,
        timeout: Duration,
    ) -> Result<Box<dyn Db2Connection>, Db2MiddlewareError>;
}

/// One open connection, owning at most one transaction at a time.
#[async_trait]
pub trait Db2Connection: Send {
    /// Begin a transaction at the given native isolation level.
    ///
    /// # Errors
    /// Returns an error if the driver cannot start the transaction.
    async fn begin_transaction(
        &mut self,
        isolation: NativeIsolationLevel,
    ) -> Result<(), Db2MiddlewareError>;

    /// Commit the open transaction.
    ///
    /// # Errors
    /// Returns an error if the commit fails.
    async fn commit(&mut self) -> Result<(), Db2MiddlewareError>;

    /// Roll back the open transaction.
    ///
    /// # Errors
    /// Returns an error if the rollback itself fails.
    async fn rollback(&mut self) -> Result<(), Db2MiddlewareError>;

    /// Execute without a result set and return the affected-row count
    /// (`-1` when the statement kind has no meaningful count).
    ///
    /// # Errors
    /// Returns an error if execution fails.
    async fn execute_non_query(&mut self, command: &Command)
    -> Result<i64, Db2MiddlewareError>;

    /// Execute and return the first column of the first row,
    /// [`RowValues::Null`] for an empty result.
    ///
    /// # Errors
    /// Returns an error if execution fails.
    async fn execute_scalar(&mut self, command: &Command)
    -> Result<RowValues, Db2MiddlewareError>;

    /// Execute as a reader and return a cursor over the rows.
    ///
    /// # Errors
    /// Returns an error if execution fails.
    async fn execute_reader(
        &mut self,
        command: &Command,
    ) -> Result<Box<dyn Db2Cursor>, Db2MiddlewareError>;

    /// Release the connection. Called on every exit path.
    ///
    /// # Errors
    /// Returns an error if the driver fails to release cleanly; callers
    /// treat this as non-fatal.
    async fn close(&mut self) -> Result<(), Db2MiddlewareError>;
}

/// Cursor over the rows of a reader execution.
///
/// The dispatcher fully materializes the rows and closes the cursor on
/// every exit path, success or failure, so driver-side cursors never leak.
#[async_trait]
pub trait Db2Cursor: Send {
    /// Column names of the result set, in select order.
    fn column_names(&self) -> &[String];

    /// Records-affected count reported by the driver; `-1` for reads.
    fn records_affected(&self) -> i64;

    /// Fetch the next row, or `None` once the cursor is drained.
    ///
    /// # Errors
    /// Returns an error if the fetch fails or the cursor is closed.
    async fn fetch_row(&mut self) -> Result<Option<Vec<RowValues>>, Db2MiddlewareError>;

    /// Whether the cursor has been closed.
    fn is_closed(&self) -> bool;

    /// Close the cursor. Idempotent.
    ///
    /// # Errors
    /// Returns an error if the driver fails to close the cursor.
    async fn close(&mut self) -> Result<(), Db2MiddlewareError>;
}
