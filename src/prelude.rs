//! Convenient imports for common functionality.
//!
//! This module re-exports the types most callers need to build a request,
//! execute it, and inspect the outcome.

pub use crate::driver::{
    BoundParameter, Command, Db2Connection, Db2Cursor, Db2Driver, NativeIsolationLevel,
    NativeType,
};
pub use crate::error::Db2MiddlewareError;
pub use crate::execute_query;
pub use crate::outcome::{QueryOutcome, ResultData};
pub use crate::query::{QueryInput, QueryOptions};
pub use crate::results::{CustomDbRow, ResultSet};
pub use crate::types::{
    DataType, ExecuteType, QueryParameter, RowValues, TransactionIsolationLevel,
};

#[cfg(feature = "odbc")]
pub use crate::odbc::OdbcDriver;
