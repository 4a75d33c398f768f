//! Async middleware for executing SQL against IBM DB2.
//!
//! One entry point, [`execute_query`]: open a connection, optionally wrap
//! the statement in a transaction at the requested isolation level,
//! dispatch by [`ExecuteType`], and return the uniform [`QueryOutcome`].
//! Failures follow a caller-selectable two-tier policy: raised as
//! [`Db2MiddlewareError::QueryFailure`] or folded into the outcome's
//! `error_message`.
//!
//! Real connectivity goes through the IBM CLI/ODBC driver behind the `odbc`
//! feature; the orchestration logic itself is driver-agnostic and runs
//! against the `test-utils` in-memory driver in the integration tests.
//!
//! ```rust
//! # #[cfg(feature = "test-utils")]
//! # async fn demo() -> Result<(), db2_middleware::Db2MiddlewareError> {
//! use db2_middleware::prelude::*;
//! use db2_middleware::test_utils::MemoryDriver;
//! use tokio_util::sync::CancellationToken;
//!
//! let driver = MemoryDriver::new();
//! let input = QueryInput::new(
//!     "Database=testdb;Hostname=localhost;Port=50000;Uid=db2inst1;Pwd=password;",
//!     "CREATE TABLE people (ID INT, NAME VARCHAR(50))",
//!     ExecuteType::NonQuery,
//! );
//! let outcome =
//!     execute_query(&driver, &input, &QueryOptions::default(), CancellationToken::new()).await?;
//! assert!(outcome.success);
//! # Ok(()) }
//! ```

pub mod driver;
pub mod error;
mod executor;
#[cfg(feature = "odbc")]
pub mod odbc;
pub mod outcome;
pub mod params;
pub mod prelude;
pub mod query;
pub mod results;
#[cfg(feature = "test-utils")]
pub mod test_utils;
pub mod types;

pub use error::Db2MiddlewareError;
pub use executor::execute_query;
pub use outcome::{QueryOutcome, ResultData};
pub use query::{QueryInput, QueryOptions};
pub use types::{
    DataType, ExecuteType, QueryParameter, RowValues, TransactionIsolationLevel,
};
