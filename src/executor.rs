//! Query execution: dispatch by execute type, transaction wrapping, and the
//! two-tier failure policy.

mod dispatch;
mod handler;

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::driver::{Db2Driver, NativeIsolationLevel};
use crate::error::Db2MiddlewareError;
use crate::outcome::QueryOutcome;
use crate::query::{QueryInput, QueryOptions};

/// Execute one SQL statement against DB2 and return the uniform outcome.
///
/// This is the sole entry point. Each invocation opens exactly one
/// connection, at most one transaction, and at most one cursor, and
/// releases all of them before returning. Cancellation is honored
/// cooperatively at the commit, rollback, and reader-close steps; an
/// in-flight statement execution is not preempted.
///
/// Failure handling is two-tier: with `throw_on_failure` set, dispatch and
/// rollback failures are raised as [`Db2MiddlewareError::QueryFailure`]
/// carrying the annotated message and its cause; otherwise they are folded
/// into an unsuccessful [`QueryOutcome`]. Connection-open and
/// transaction-begin failures always raise, since there is no unit of work
/// to report on.
///
/// # Errors
/// Returns an error if the connection cannot be opened, the transaction
/// cannot be started, or — with `throw_on_failure` — execution or rollback
/// failed.
pub async fn execute_query(
    driver: &dyn Db2Driver,
    input: &QueryInput,
    options: &QueryOptions,
    cancellation: CancellationToken,
) -> Result<QueryOutcome, Db2MiddlewareError> {
    debug!(
        execute_type = ?input.execute_type,
        isolation = ?options.isolation_level,
        "executing DB2 query"
    );

    let timeout = Duration::from_secs(options.connection_timeout_secs);
    let mut connection = driver.open(&input.connection_string, timeout).await?;

    let in_transaction = options.isolation_level.is_transactional();
    if in_transaction {
        let native = NativeIsolationLevel::from(options.isolation_level);
        if let Err(error) = connection.begin_transaction(native).await {
            let _ = connection.close().await;
            return Err(error);
        }
    }

    let handled =
        handler::run_guarded(connection.as_mut(), input, in_transaction, &cancellation).await;

    if let Err(error) = connection.close().await {
        warn!(error = %error, "failed to release DB2 connection");
    }

    match handled {
        Ok(outcome) => Ok(outcome),
        Err(failure) => {
            warn!(message = %failure.error_message(), "DB2 query failed");
            if options.throw_on_failure {
                Err(failure.into_error())
            } else {
                Ok(QueryOutcome::failed(failure.error_message()))
            }
        }
    }
}
