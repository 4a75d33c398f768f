//! Dedicated worker thread owning the blocking ODBC handles.
//!
//! Requests arrive over a std mpsc channel and answer on tokio oneshot
//! channels, so the async side never blocks on CLI calls.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use odbc_api::parameter::InputParameter;
use odbc_api::DataType as OdbcDataType;
use odbc_api::{Connection, Cursor, CursorRow, IntoParameter, Nullable, ResultSetMetadata};
use tokio::sync::oneshot;
use tracing::debug;

use super::config;
use crate::driver::{BoundParameter, Command, NativeIsolationLevel};
use crate::error::Db2MiddlewareError;
use crate::types::RowValues;

pub(crate) type Responder<T> = oneshot::Sender<Result<T, Db2MiddlewareError>>;

/// One request to the worker thread.
pub(crate) enum WorkerRequest {
    BeginTransaction {
        isolation: NativeIsolationLevel,
        respond: Responder<()>,
    },
    Commit {
        respond: Responder<()>,
    },
    Rollback {
        respond: Responder<()>,
    },
    NonQuery {
        command: Command,
        respond: Responder<i64>,
    },
    Scalar {
        command: Command,
        respond: Responder<RowValues>,
    },
    Reader {
        command: Command,
        respond: Responder<FetchedResult>,
    },
    Shutdown {
        respond: Responder<()>,
    },
}

/// A reader result fully materialized on the worker side.
pub(crate) struct FetchedResult {
    pub column_names: Vec<String>,
    pub rows: Vec<Vec<RowValues>>,
    pub records_affected: i64,
}

/// Spawn a worker that connects and then serves requests until shutdown.
/// The readiness channel carries the connect result.
pub(crate) fn spawn(
    connection_string: String,
    timeout: Duration,
) -> (
    Sender<WorkerRequest>,
    oneshot::Receiver<Result<(), Db2MiddlewareError>>,
) {
    let (tx, rx) = mpsc::channel::<WorkerRequest>();
    let (ready_tx, ready_rx) = oneshot::channel();

    thread::spawn(move || worker_main(&connection_string, timeout, &rx, ready_tx));

    (tx, ready_rx)
}

fn worker_main(
    connection_string: &str,
    timeout: Duration,
    requests: &Receiver<WorkerRequest>,
    ready: oneshot::Sender<Result<(), Db2MiddlewareError>>,
) {
    let environment = match config::environment() {
        Ok(environment) => environment,
        Err(error) => {
            let _ = ready.send(Err(error));
            return;
        }
    };

    let connection = match environment
        .connect_with_connection_string(connection_string, config::connection_options(timeout))
    {
        Ok(connection) => connection,
        Err(error) => {
            let _ = ready.send(Err(Db2MiddlewareError::ConnectionError(format!(
                "failed to connect to DB2: {error}"
            ))));
            return;
        }
    };

    debug!("DB2 ODBC worker connected");
    let _ = ready.send(Ok(()));

    for request in requests {
        match request {
            WorkerRequest::BeginTransaction { isolation, respond } => {
                let _ = respond.send(begin_transaction(&connection, isolation));
            }
            WorkerRequest::Commit { respond } => {
                let _ = respond.send(finish_transaction(&connection, true));
            }
            WorkerRequest::Rollback { respond } => {
                let _ = respond.send(finish_transaction(&connection, false));
            }
            WorkerRequest::NonQuery { command, respond } => {
                let _ = respond.send(run_non_query(&connection, &command));
            }
            WorkerRequest::Scalar { command, respond } => {
                let _ = respond.send(run_scalar(&connection, &command));
            }
            WorkerRequest::Reader { command, respond } => {
                let _ = respond.send(run_reader(&connection, &command));
            }
            WorkerRequest::Shutdown { respond } => {
                let _ = respond.send(Ok(()));
                break;
            }
        }
    }
    // Dropping the connection disconnects; an open manual-commit window is
    // rolled back by the driver on disconnect.
}

/// DB2's `SET CURRENT ISOLATION` register value for the native level.
/// `Unspecified` and `Snapshot` leave the driver default in place.
fn isolation_register(isolation: NativeIsolationLevel) -> Option<&'static str> {
    match isolation {
        NativeIsolationLevel::ReadUncommitted => Some("UR"),
        NativeIsolationLevel::ReadCommitted => Some("CS"),
        // DB2 RS (read stability) is ANSI repeatable read; DB2 RR
        // (repeatable read) is ANSI serializable.
        NativeIsolationLevel::RepeatableRead => Some("RS"),
        NativeIsolationLevel::Serializable => Some("RR"),
        NativeIsolationLevel::Unspecified | NativeIsolationLevel::Snapshot => None,
    }
}

fn begin_transaction(
    connection: &Connection<'_>,
    isolation: NativeIsolationLevel,
) -> Result<(), Db2MiddlewareError> {
    if let Some(register) = isolation_register(isolation) {
        let mut statement = connection.preallocate().map_err(execution_error)?;
        statement
            .execute(&format!("SET CURRENT ISOLATION = {register}"), ())
            .map_err(execution_error)?;
    }
    connection
        .set_autocommit(false)
        .map_err(|e| Db2MiddlewareError::ExecutionError(format!("failed to begin transaction: {e}")))
}

fn finish_transaction(connection: &Connection<'_>, commit: bool) -> Result<(), Db2MiddlewareError> {
    let result = if commit {
        connection.commit()
    } else {
        connection.rollback()
    };
    result.map_err(|e| {
        let verb = if commit { "commit" } else { "rollback" };
        Db2MiddlewareError::ExecutionError(format!("transaction {verb} failed: {e}"))
    })?;
    connection
        .set_autocommit(true)
        .map_err(|e| Db2MiddlewareError::ExecutionError(format!("failed to restore autocommit: {e}")))
}

fn run_non_query(connection: &Connection<'_>, command: &Command) -> Result<i64, Db2MiddlewareError> {
    let parameters = build_parameters(command)?;
    let mut statement = connection.preallocate().map_err(execution_error)?;
    let cursor = statement
        .execute(&command.sql, &parameters[..])
        .map_err(execution_error)?;
    drop(cursor);
    let count = statement.row_count().map_err(execution_error)?;
    Ok(count.map_or(-1, |n| n as i64))
}

fn run_scalar(
    connection: &Connection<'_>,
    command: &Command,
) -> Result<RowValues, Db2MiddlewareError> {
    let parameters = build_parameters(command)?;
    let mut statement = connection.preallocate().map_err(execution_error)?;
    let Some(mut cursor) = statement
        .execute(&command.sql, &parameters[..])
        .map_err(execution_error)?
    else {
        return Err(Db2MiddlewareError::ExecutionError(
            "scalar execution produced no result set".to_string(),
        ));
    };

    let data_type = cursor.col_data_type(1).map_err(execution_error)?;
    match cursor.next_row().map_err(execution_error)? {
        Some(mut row) => read_cell(&mut row, 1, data_type),
        None => Ok(RowValues::Null),
    }
}

fn run_reader(
    connection: &Connection<'_>,
    command: &Command,
) -> Result<FetchedResult, Db2MiddlewareError> {
    let parameters = build_parameters(command)?;
    let mut statement = connection.preallocate().map_err(execution_error)?;
    let Some(mut cursor) = statement
        .execute(&command.sql, &parameters[..])
        .map_err(execution_error)?
    else {
        // No result set (the caller forced reader mode on a non-query);
        // mirror an empty reader carrying the affected-row count.
        let count = statement.row_count().map_err(execution_error)?;
        return Ok(FetchedResult {
            column_names: Vec::new(),
            rows: Vec::new(),
            records_affected: count.map_or(-1, |n| n as i64),
        });
    };

    let column_count = cursor.num_result_cols().map_err(execution_error)?;
    let column_count = u16::try_from(column_count.max(0)).unwrap_or(0);

    let mut column_names = Vec::with_capacity(column_count as usize);
    let mut column_types = Vec::with_capacity(column_count as usize);
    for index in 1..=column_count {
        column_names.push(cursor.col_name(index).map_err(execution_error)?);
        column_types.push(cursor.col_data_type(index).map_err(execution_error)?);
    }

    let mut rows = Vec::new();
    while let Some(mut row) = cursor.next_row().map_err(execution_error)? {
        let mut values = Vec::with_capacity(column_count as usize);
        for (offset, data_type) in column_types.iter().enumerate() {
            values.push(read_cell(&mut row, (offset + 1) as u16, *data_type)?);
        }
        rows.push(values);
    }

    Ok(FetchedResult {
        column_names,
        rows,
        records_affected: -1,
    })
}

/// Convert the bound parameters to ODBC input parameters. DB2 CLI binds
/// markers positionally, so declaration order is binding order; typed
/// parameters coerce their textual value to the native kind here and leave
/// the rest of the conversion to the driver.
fn build_parameters(
    command: &Command,
) -> Result<Vec<Box<dyn InputParameter>>, Db2MiddlewareError> {
    command.parameters.iter().map(to_odbc_parameter).collect()
}

fn to_odbc_parameter(
    parameter: &BoundParameter,
) -> Result<Box<dyn InputParameter>, Db2MiddlewareError> {
    let Some(native_type) = parameter.native_type else {
        return Ok(Box::new(parameter.value.clone().into_parameter()));
    };

    if native_type.is_integer_kind() {
        let value: i64 = parameter.value.trim().parse().map_err(|e| {
            Db2MiddlewareError::ParameterError(format!(
                "parameter '{}' is not a valid {native_type:?}: {e}",
                parameter.name
            ))
        })?;
        Ok(Box::new(value.into_parameter()))
    } else if native_type.is_float_kind() {
        let value: f64 = parameter.value.trim().parse().map_err(|e| {
            Db2MiddlewareError::ParameterError(format!(
                "parameter '{}' is not a valid {native_type:?}: {e}",
                parameter.name
            ))
        })?;
        Ok(Box::new(value.into_parameter()))
    } else if native_type.is_binary_kind() {
        Ok(Box::new(parameter.value.clone().into_bytes().into_parameter()))
    } else {
        // Character, decimal, XML, and date/time kinds bind as text; the
        // CLI converts to the column type.
        Ok(Box::new(parameter.value.clone().into_parameter()))
    }
}

/// Read one cell, choosing the fetch type from the column's data type.
fn read_cell(
    row: &mut CursorRow<'_>,
    index: u16,
    data_type: OdbcDataType,
) -> Result<RowValues, Db2MiddlewareError> {
    match data_type {
        OdbcDataType::TinyInt
        | OdbcDataType::SmallInt
        | OdbcDataType::Integer
        | OdbcDataType::BigInt => {
            let mut value = Nullable::<i64>::null();
            row.get_data(index, &mut value).map_err(execution_error)?;
            Ok(value.into_opt().map_or(RowValues::Null, RowValues::Int))
        }
        OdbcDataType::Real | OdbcDataType::Double | OdbcDataType::Float { .. } => {
            let mut value = Nullable::<f64>::null();
            row.get_data(index, &mut value).map_err(execution_error)?;
            Ok(value.into_opt().map_or(RowValues::Null, RowValues::Float))
        }
        OdbcDataType::Bit => {
            let mut value = Nullable::<i64>::null();
            row.get_data(index, &mut value).map_err(execution_error)?;
            Ok(value
                .into_opt()
                .map_or(RowValues::Null, |i| RowValues::Bool(i != 0)))
        }
        _ => {
            // Everything else (character, decimal, date/time, XML) comes
            // back as text; the driver renders the canonical form.
            let mut buffer = Vec::new();
            let has_value = row.get_text(index, &mut buffer).map_err(execution_error)?;
            if has_value {
                Ok(RowValues::Text(
                    String::from_utf8_lossy(&buffer).into_owned(),
                ))
            } else {
                Ok(RowValues::Null)
            }
        }
    }
}

fn execution_error(error: odbc_api::Error) -> Db2MiddlewareError {
    Db2MiddlewareError::ExecutionError(format!("DB2 CLI error: {error}"))
}
