use serde::{Deserialize, Serialize};

use crate::types::{ExecuteType, QueryParameter, TransactionIsolationLevel};

/// One query execution request.
///
/// Immutable once constructed; each invocation of
/// [`execute_query`](crate::execute_query) owns its own request, so there is
/// no shared state between invocations.
///
/// ```rust
/// use db2_middleware::prelude::*;
///
/// let input = QueryInput::new(
///     "Database=testdb;Hostname=localhost;Port=50000;Uid=db2inst1;Pwd=password;",
///     "SELECT * FROM employees WHERE id = ?",
///     ExecuteType::Auto,
/// )
/// .with_parameters(vec![QueryParameter::auto("id", "1")]);
/// # let _ = input;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryInput {
    /// Driver-specific connection string, passed through opaquely.
    pub connection_string: String,
    /// The SQL statement to execute.
    pub query: String,
    /// Parameters bound to the statement, in declaration order.
    pub parameters: Vec<QueryParameter>,
    /// How the statement is dispatched.
    pub execute_type: ExecuteType,
}

impl QueryInput {
    /// Create a request with no parameters.
    pub fn new(
        connection_string: impl Into<String>,
        query: impl Into<String>,
        execute_type: ExecuteType,
    ) -> Self {
        Self {
            connection_string: connection_string.into(),
            query: query.into(),
            parameters: Vec::new(),
            execute_type,
        }
    }

    /// Attach parameters to the request.
    #[must_use]
    pub fn with_parameters(mut self, parameters: Vec<QueryParameter>) -> Self {
        self.parameters = parameters;
        self
    }
}

/// Per-invocation execution options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryOptions {
    /// Transaction isolation for the unit of work.
    /// [`TransactionIsolationLevel::None`] suppresses the transaction.
    pub isolation_level: TransactionIsolationLevel,
    /// Connection timeout in seconds, passed through to the driver.
    pub connection_timeout_secs: u64,
    /// When true, failures are raised as hard errors; when false they are
    /// returned as an unsuccessful outcome with `error_message` populated.
    pub throw_on_failure: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            isolation_level: TransactionIsolationLevel::Unspecified,
            connection_timeout_secs: 30,
            throw_on_failure: false,
        }
    }
}

impl QueryOptions {
    #[must_use]
    pub fn with_isolation_level(mut self, isolation_level: TransactionIsolationLevel) -> Self {
        self.isolation_level = isolation_level;
        self
    }

    #[must_use]
    pub fn with_connection_timeout(mut self, connection_timeout_secs: u64) -> Self {
        self.connection_timeout_secs = connection_timeout_secs;
        self
    }

    #[must_use]
    pub fn with_throw_on_failure(mut self, throw_on_failure: bool) -> Self {
        self.throw_on_failure = throw_on_failure;
        self
    }
}
