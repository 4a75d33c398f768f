//! The transaction/error state machine around the dispatcher.
//!
//! Exactly one of {commit, rollback attempt, no-transaction pass-through}
//! happens per invocation. Failures stay values ([`ExecutionFailure`])
//! until the outermost boundary applies the throw-vs-return policy.

use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::dispatch;
use crate::driver::{Command, Db2Connection};
use crate::error::Db2MiddlewareError;
use crate::outcome::QueryOutcome;
use crate::params::bind_parameters;
use crate::query::QueryInput;

/// How the failing invocation ended with respect to its transaction.
#[derive(Debug)]
enum FailureKind {
    /// Isolation level was `None`, nothing to roll back.
    NoTransaction,
    /// Rollback was attempted and completed.
    RolledBack,
    /// Rollback was attempted and failed too.
    RollbackFailed {
        rollback_error: Db2MiddlewareError,
    },
}

/// A dispatch failure annotated with the rollback disposition.
///
/// The three message texts are deliberately distinct so a caller (or a
/// test) can tell from `error_message` alone whether a rollback happened,
/// succeeded, or itself failed.
#[derive(Debug)]
pub(crate) struct ExecutionFailure {
    kind: FailureKind,
    cause: Db2MiddlewareError,
}

impl ExecutionFailure {
    /// The full annotated text used for `QueryOutcome::error_message`.
    pub(crate) fn error_message(&self) -> String {
        match &self.kind {
            FailureKind::NoTransaction => format!(
                "Query execution failed: isolation level was None, so no transaction rollback was performed. {}",
                self.cause
            ),
            FailureKind::RolledBack => format!(
                "Query execution failed: transaction rollback completed without exception. {}",
                self.cause
            ),
            FailureKind::RollbackFailed { rollback_error } => format!(
                "Query execution failed: an exception occurred on transaction rollback. Rollback error: {rollback_error}. || Error leading to rollback: {}",
                self.cause
            ),
        }
    }

    /// The hard error of the throw-on-failure path. The rollback error
    /// takes precedence as the reported cause when the rollback failed.
    pub(crate) fn into_error(self) -> Db2MiddlewareError {
        let message = self.error_message();
        let source = match self.kind {
            FailureKind::RollbackFailed { rollback_error } => Box::new(
                Db2MiddlewareError::RollbackError(rollback_error.to_string()),
            ),
            FailureKind::NoTransaction | FailureKind::RolledBack => Box::new(self.cause),
        };
        Db2MiddlewareError::QueryFailure { message, source }
    }
}

/// Bind, dispatch, and finish the unit of work; on failure, resolve the
/// rollback disposition.
pub(crate) async fn run_guarded(
    connection: &mut dyn Db2Connection,
    input: &QueryInput,
    in_transaction: bool,
    cancellation: &CancellationToken,
) -> Result<QueryOutcome, ExecutionFailure> {
    let cause = match attempt(connection, input, in_transaction, cancellation).await {
        Ok(outcome) => return Ok(outcome),
        Err(cause) => cause,
    };

    if !in_transaction {
        return Err(ExecutionFailure {
            kind: FailureKind::NoTransaction,
            cause,
        });
    }

    warn!(error = %cause, "dispatch failed inside transaction; rolling back");

    // Cancellation is honored at entry to the rollback step; a cancelled
    // rollback reports as a rollback failure rather than leaving the
    // transaction dangling silently.
    let rollback_result = if cancellation.is_cancelled() {
        Err(Db2MiddlewareError::Cancelled(
            "transaction rollback".to_string(),
        ))
    } else {
        connection.rollback().await
    };

    match rollback_result {
        Ok(()) => Err(ExecutionFailure {
            kind: FailureKind::RolledBack,
            cause,
        }),
        Err(rollback_error) => Err(ExecutionFailure {
            kind: FailureKind::RollbackFailed { rollback_error },
            cause,
        }),
    }
}

/// The happy path: bind parameters, dispatch, commit if transactional.
/// Any error falls back to `run_guarded`'s rollback handling — including
/// binder errors and commit errors.
async fn attempt(
    connection: &mut dyn Db2Connection,
    input: &QueryInput,
    in_transaction: bool,
    cancellation: &CancellationToken,
) -> Result<QueryOutcome, Db2MiddlewareError> {
    let mut command = Command::new(&input.query);
    bind_parameters(&mut command, &input.parameters)?;

    let (records_affected, data) =
        dispatch::dispatch(connection, &command, input.execute_type, cancellation).await?;

    if in_transaction {
        // Cancellation is honored at entry to the commit step.
        if cancellation.is_cancelled() {
            return Err(Db2MiddlewareError::Cancelled(
                "transaction commit".to_string(),
            ));
        }
        connection.commit().await?;
    }

    Ok(QueryOutcome::succeeded(records_affected, data))
}
