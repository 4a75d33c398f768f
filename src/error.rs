use thiserror::Error;

/// Errors raised by the DB2 middleware.
///
/// Everything the orchestrator can catch is funneled through the two-tier
/// policy: with `throw_on_failure` the caller sees a [`Db2MiddlewareError::QueryFailure`]
/// carrying the annotated message and the underlying cause, otherwise the
/// failure is folded into the returned outcome's `error_message`.
#[derive(Debug, Error)]
pub enum Db2MiddlewareError {
    #[error("Type resolution error: {0}")]
    TypeResolution(String),

    #[error("Unsupported execute type: {0}")]
    UnsupportedExecuteType(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Parameter conversion error: {0}")]
    ParameterError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    #[error("Transaction rollback error: {0}")]
    RollbackError(String),

    #[error("Operation cancelled at {0}")]
    Cancelled(String),

    /// Terminal error of the throw-on-failure path. The message states
    /// whether a rollback was performed, succeeded, or itself failed; the
    /// source is the error that drove the failure (the rollback error when
    /// the rollback itself failed).
    #[error("{message}")]
    QueryFailure {
        message: String,
        #[source]
        source: Box<Db2MiddlewareError>,
    },
}
