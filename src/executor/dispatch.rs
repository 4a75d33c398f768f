use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::driver::{Command, Db2Connection, Db2Cursor};
use crate::error::Db2MiddlewareError;
use crate::outcome::ResultData;
use crate::results::ResultSet;
use crate::types::{ExecuteType, RowValues};

/// The `Auto` heuristic: a raw, case-insensitive `select` prefix test.
///
/// Deliberately no whitespace or comment skipping — `" select"` dispatches
/// as a non-query and `"selective_proc"` dispatches as a reader, matching
/// the behavior callers have always observed.
pub(crate) fn is_select_prefixed(sql: &str) -> bool {
    sql.get(..6)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("select"))
}

/// Run the command through the driver call matching the execute type and
/// shape the output: `(records_affected, payload)`.
pub(crate) async fn dispatch(
    connection: &mut dyn Db2Connection,
    command: &Command,
    execute_type: ExecuteType,
    cancellation: &CancellationToken,
) -> Result<(i64, ResultData), Db2MiddlewareError> {
    match execute_type {
        ExecuteType::Auto if is_select_prefixed(&command.sql) => {
            read_rows(connection, command, cancellation).await
        }
        ExecuteType::ExecuteReader => read_rows(connection, command, cancellation).await,
        ExecuteType::Auto | ExecuteType::NonQuery => {
            let affected = connection.execute_non_query(command).await?;
            Ok((affected, ResultData::affected(affected)))
        }
        ExecuteType::Scalar => {
            let value = connection.execute_scalar(command).await?;
            let count = scalar_to_count(&value)?;
            Ok((count, ResultData::affected(count)))
        }
    }
}

/// Reader execution: fully materialize the result set, then close the
/// cursor. The cursor is also closed on every error path so driver-side
/// cursors never outlive the call.
async fn read_rows(
    connection: &mut dyn Db2Connection,
    command: &Command,
    cancellation: &CancellationToken,
) -> Result<(i64, ResultData), Db2MiddlewareError> {
    let mut cursor = connection.execute_reader(command).await?;

    let mut result_set = ResultSet::with_capacity(16);
    result_set.set_column_names(Arc::new(cursor.column_names().to_vec()));

    loop {
        match cursor.fetch_row().await {
            Ok(Some(values)) => result_set.add_row_values(values),
            Ok(None) => break,
            Err(error) => {
                close_quietly(cursor.as_mut()).await;
                return Err(error);
            }
        }
    }
    result_set.records_affected = cursor.records_affected();

    // Cancellation is honored at the asynchronous reader-close step.
    if cancellation.is_cancelled() {
        close_quietly(cursor.as_mut()).await;
        return Err(Db2MiddlewareError::Cancelled("reader close".to_string()));
    }
    cursor.close().await?;

    Ok((
        result_set.records_affected,
        ResultData::from_result_set(&result_set),
    ))
}

async fn close_quietly(cursor: &mut dyn Db2Cursor) {
    if cursor.is_closed() {
        return;
    }
    if let Err(error) = cursor.close().await {
        warn!(error = %error, "failed to close DB2 cursor");
    }
}

/// Coerce a scalar value into the records-affected count the outcome
/// reports. The payload key stays `AffectedRows` even though a scalar is
/// not a row count; that is the contract callers observe.
fn scalar_to_count(value: &RowValues) -> Result<i64, Db2MiddlewareError> {
    match value {
        RowValues::Int(i) => Ok(*i),
        RowValues::Float(f) if f.fract() == 0.0 => Ok(*f as i64),
        other => Err(Db2MiddlewareError::ExecutionError(format!(
            "scalar value {other:?} cannot be reported as a record count"
        ))),
    }
}
