//! In-memory driver for exercising the orchestrator without a DB2 instance.
//!
//! Recognizes just enough SQL for the integration tests (`CREATE TABLE`,
//! `DROP TABLE [IF EXISTS]`, `INSERT`, `SELECT *`, `SELECT COUNT(*)`,
//! `UPDATE`, `DELETE`), keeps tables in a shared map, and implements
//! transactions as whole-database snapshots restored on rollback. Connect,
//! commit, and rollback failures can be scripted per driver so every branch
//! of the failure state machine is reachable from a test.
//!
//! String literals must not contain commas; the value splitter is a plain
//! `split(',')`.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;

use crate::driver::{
    BoundParameter, Command, Db2Connection, Db2Cursor, Db2Driver, NativeIsolationLevel,
};
use crate::error::Db2MiddlewareError;
use crate::types::RowValues;

type Database = HashMap<String, Table>;

#[derive(Debug, Clone, Default)]
struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<RowValues>>,
}

/// Transaction calls observed by a [`MemoryDriver`], in call order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxEvent {
    Begin(NativeIsolationLevel),
    Commit,
    Rollback,
}

/// Scripted in-memory [`Db2Driver`].
///
/// All connections opened from one driver share the same table map, so a
/// follow-up query observes what an earlier invocation committed.
#[derive(Debug, Default, Clone)]
pub struct MemoryDriver {
    database: Arc<Mutex<Database>>,
    events: Arc<Mutex<Vec<TxEvent>>>,
    fail_connect: bool,
    fail_commit: bool,
    fail_rollback: bool,
}

impl MemoryDriver {
    #[must_use]
    pub fn new() -> Self {
        MemoryDriver::default()
    }

    /// Refuse every `open` call with a connection error.
    #[must_use]
    pub fn fail_connect(mut self) -> Self {
        self.fail_connect = true;
        self
    }

    /// Make every commit fail after the statement has applied.
    #[must_use]
    pub fn fail_commit(mut self) -> Self {
        self.fail_commit = true;
        self
    }

    /// Make every rollback attempt fail.
    #[must_use]
    pub fn fail_rollback(mut self) -> Self {
        self.fail_rollback = true;
        self
    }

    /// Transaction calls observed so far, across all connections.
    #[must_use]
    pub fn events(&self) -> Vec<TxEvent> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Db2Driver for MemoryDriver {
    async fn open(
        &self,
        connection_string: &str,
        _timeout: Duration,
    ) -> Result<Box<dyn Db2Connection>, Db2MiddlewareError> {
        if self.fail_connect {
            return Err(Db2MiddlewareError::ConnectionError(format!(
                "refused connection to '{connection_string}'"
            )));
        }
        Ok(Box::new(MemoryConnection {
            database: self.database.clone(),
            events: self.events.clone(),
            snapshot: None,
            fail_commit: self.fail_commit,
            fail_rollback: self.fail_rollback,
            closed: false,
        }))
    }
}

struct MemoryConnection {
    database: Arc<Mutex<Database>>,
    events: Arc<Mutex<Vec<TxEvent>>>,
    snapshot: Option<Database>,
    fail_commit: bool,
    fail_rollback: bool,
    closed: bool,
}

impl MemoryConnection {
    fn record(&self, event: TxEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }

    fn guard(&self) -> Result<(), Db2MiddlewareError> {
        if self.closed {
            return Err(Db2MiddlewareError::ConnectionError(
                "connection is closed".to_string(),
            ));
        }
        Ok(())
    }

    fn apply(&self, command: &Command) -> Result<Applied, Db2MiddlewareError> {
        self.guard()?;
        let mut database = self
            .database
            .lock()
            .map_err(|_| Db2MiddlewareError::ExecutionError("table map poisoned".to_string()))?;
        apply_statement(&mut database, command)
    }
}

#[async_trait]
impl Db2Connection for MemoryConnection {
    async fn begin_transaction(
        &mut self,
        isolation: NativeIsolationLevel,
    ) -> Result<(), Db2MiddlewareError> {
        self.guard()?;
        let database = self
            .database
            .lock()
            .map_err(|_| Db2MiddlewareError::ExecutionError("table map poisoned".to_string()))?;
        self.snapshot = Some(database.clone());
        drop(database);
        self.record(TxEvent::Begin(isolation));
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), Db2MiddlewareError> {
        self.guard()?;
        if self.fail_commit {
            // Keep the snapshot: the orchestrator rolls back next.
            return Err(Db2MiddlewareError::ExecutionError(
                "simulated commit failure".to_string(),
            ));
        }
        if self.snapshot.take().is_none() {
            return Err(Db2MiddlewareError::ExecutionError(
                "commit without an open transaction".to_string(),
            ));
        }
        self.record(TxEvent::Commit);
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), Db2MiddlewareError> {
        self.guard()?;
        if self.fail_rollback {
            return Err(Db2MiddlewareError::ExecutionError(
                "simulated rollback failure".to_string(),
            ));
        }
        let snapshot = self.snapshot.take().ok_or_else(|| {
            Db2MiddlewareError::ExecutionError("rollback without an open transaction".to_string())
        })?;
        let mut database = self
            .database
            .lock()
            .map_err(|_| Db2MiddlewareError::ExecutionError("table map poisoned".to_string()))?;
        *database = snapshot;
        drop(database);
        self.record(TxEvent::Rollback);
        Ok(())
    }

    async fn execute_non_query(
        &mut self,
        command: &Command,
    ) -> Result<i64, Db2MiddlewareError> {
        match self.apply(command)? {
            Applied::Count(count) => Ok(count),
            // A select run through the non-query path has no count.
            Applied::Rows { .. } => Ok(-1),
        }
    }

    async fn execute_scalar(
        &mut self,
        command: &Command,
    ) -> Result<RowValues, Db2MiddlewareError> {
        match self.apply(command)? {
            Applied::Rows { rows, .. } => Ok(rows
                .first()
                .and_then(|row| row.first())
                .cloned()
                .unwrap_or(RowValues::Null)),
            Applied::Count(_) => Err(Db2MiddlewareError::ExecutionError(
                "scalar execution produced no result set".to_string(),
            )),
        }
    }

    async fn execute_reader(
        &mut self,
        command: &Command,
    ) -> Result<Box<dyn Db2Cursor>, Db2MiddlewareError> {
        let cursor = match self.apply(command)? {
            Applied::Rows { columns, rows } => MemoryCursor {
                column_names: columns,
                rows: rows.into(),
                records_affected: -1,
                closed: false,
            },
            // Forced reader mode on a non-query: empty reader carrying the
            // affected-row count, like the ODBC driver.
            Applied::Count(count) => MemoryCursor {
                column_names: Vec::new(),
                rows: VecDeque::new(),
                records_affected: count,
                closed: false,
            },
        };
        Ok(Box::new(cursor))
    }

    async fn close(&mut self) -> Result<(), Db2MiddlewareError> {
        // Disconnecting with an open manual-commit window rolls it back,
        // like the real CLI.
        if let Some(snapshot) = self.snapshot.take() {
            if let Ok(mut database) = self.database.lock() {
                *database = snapshot;
            }
        }
        self.closed = true;
        Ok(())
    }
}

struct MemoryCursor {
    column_names: Vec<String>,
    rows: VecDeque<Vec<RowValues>>,
    records_affected: i64,
    closed: bool,
}

#[async_trait]
impl Db2Cursor for MemoryCursor {
    fn column_names(&self) -> &[String] {
        &self.column_names
    }

    fn records_affected(&self) -> i64 {
        self.records_affected
    }

    async fn fetch_row(&mut self) -> Result<Option<Vec<RowValues>>, Db2MiddlewareError> {
        if self.closed {
            return Err(Db2MiddlewareError::ExecutionError(
                "cursor is closed".to_string(),
            ));
        }
        Ok(self.rows.pop_front())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    async fn close(&mut self) -> Result<(), Db2MiddlewareError> {
        self.rows.clear();
        self.closed = true;
        Ok(())
    }
}

enum Applied {
    Count(i64),
    Rows {
        columns: Vec<String>,
        rows: Vec<Vec<RowValues>>,
    },
}

fn pattern(re: &'static str) -> Regex {
    Regex::new(re).expect("static pattern")
}

fn apply_statement(
    database: &mut Database,
    command: &Command,
) -> Result<Applied, Db2MiddlewareError> {
    let sql = command.sql.trim();
    let mut parameters = command
        .parameters
        .iter()
        .map(convert_parameter)
        .collect::<Result<VecDeque<_>, _>>()?;

    if let Some(captures) = pattern(r"(?is)^create\s+table\s+(\w+)\s*\((.+)\)$").captures(sql) {
        let name = captures[1].to_lowercase();
        if database.contains_key(&name) {
            return Err(Db2MiddlewareError::ExecutionError(format!(
                "table '{name}' already exists"
            )));
        }
        let columns = captures[2]
            .split(',')
            .filter_map(|column| column.split_whitespace().next())
            .map(str::to_string)
            .collect();
        database.insert(name, Table {
            columns,
            rows: Vec::new(),
        });
        return Ok(Applied::Count(-1));
    }

    if let Some(captures) = pattern(r"(?i)^drop\s+table\s+if\s+exists\s+(\w+)$").captures(sql) {
        database.remove(&captures[1].to_lowercase());
        return Ok(Applied::Count(-1));
    }

    if let Some(captures) = pattern(r"(?i)^drop\s+table\s+(\w+)$").captures(sql) {
        let name = captures[1].to_lowercase();
        if database.remove(&name).is_none() {
            return Err(Db2MiddlewareError::ExecutionError(format!(
                "undefined table name '{name}'"
            )));
        }
        return Ok(Applied::Count(-1));
    }

    if let Some(captures) =
        pattern(r"(?is)^insert\s+into\s+(\w+)\s*\(([^)]*)\)\s*values\s*(.+)$").captures(sql)
    {
        let table = lookup(database, &captures[1])?;
        let declared: Vec<String> = captures[2]
            .split(',')
            .map(|column| column.trim().to_string())
            .collect();
        let positions = declared
            .iter()
            .map(|name| column_index(table, name))
            .collect::<Result<Vec<_>, _>>()?;

        let mut inserted = 0_i64;
        for tuple in pattern(r"\(([^)]*)\)").captures_iter(&captures[3]) {
            let values = tuple[1]
                .split(',')
                .map(|token| parse_value(token, &mut parameters))
                .collect::<Result<Vec<_>, _>>()?;
            if values.len() != positions.len() {
                return Err(Db2MiddlewareError::ExecutionError(format!(
                    "insert lists {} columns but {} values",
                    positions.len(),
                    values.len()
                )));
            }
            let mut row = vec![RowValues::Null; table.columns.len()];
            for (position, value) in positions.iter().zip(values) {
                row[*position] = value;
            }
            table.rows.push(row);
            inserted += 1;
        }
        return Ok(Applied::Count(inserted));
    }

    if let Some(captures) = pattern(r"(?i)^select\s+count\(\*\)\s+from\s+(\w+)$").captures(sql) {
        let table = lookup(database, &captures[1])?;
        let count = i64::try_from(table.rows.len()).unwrap_or(i64::MAX);
        return Ok(Applied::Rows {
            columns: vec!["COUNT".to_string()],
            rows: vec![vec![RowValues::Int(count)]],
        });
    }

    if let Some(captures) =
        pattern(r"(?i)^select\s+\*\s+from\s+(\w+)(?:\s+where\s+(\w+)\s*=\s*('[^']*'|\S+))?$")
            .captures(sql)
    {
        let table = lookup(database, &captures[1])?;
        let rows = match captures.get(2) {
            Some(column) => {
                let position = column_index(table, column.as_str())?;
                let needle = parse_value(&captures[3], &mut parameters)?;
                table
                    .rows
                    .iter()
                    .filter(|row| values_equal(&row[position], &needle))
                    .cloned()
                    .collect()
            }
            None => table.rows.clone(),
        };
        return Ok(Applied::Rows {
            columns: table.columns.clone(),
            rows,
        });
    }

    if let Some(captures) = pattern(
        r"(?i)^update\s+(\w+)\s+set\s+(\w+)\s*=\s*('[^']*'|\S+)\s+where\s+(\w+)\s*=\s*('[^']*'|\S+)$",
    )
    .captures(sql)
    {
        let table = lookup(database, &captures[1])?;
        let target = column_index(table, &captures[2])?;
        let replacement = parse_value(&captures[3], &mut parameters)?;
        let predicate = column_index(table, &captures[4])?;
        let needle = parse_value(&captures[5], &mut parameters)?;

        let mut updated = 0_i64;
        for row in &mut table.rows {
            if values_equal(&row[predicate], &needle) {
                row[target] = replacement.clone();
                updated += 1;
            }
        }
        return Ok(Applied::Count(updated));
    }

    if let Some(captures) =
        pattern(r"(?i)^delete\s+from\s+(\w+)(?:\s+where\s+(\w+)\s*=\s*('[^']*'|\S+))?$")
            .captures(sql)
    {
        let table = lookup(database, &captures[1])?;
        let before = table.rows.len();
        match captures.get(2) {
            Some(column) => {
                let position = column_index(table, column.as_str())?;
                let needle = parse_value(&captures[3], &mut parameters)?;
                table
                    .rows
                    .retain(|row| !values_equal(&row[position], &needle));
            }
            None => table.rows.clear(),
        }
        let deleted = before - table.rows.len();
        return Ok(Applied::Count(i64::try_from(deleted).unwrap_or(i64::MAX)));
    }

    Err(Db2MiddlewareError::ExecutionError(format!(
        "syntax error near '{sql}'"
    )))
}

fn lookup<'db>(
    database: &'db mut Database,
    name: &str,
) -> Result<&'db mut Table, Db2MiddlewareError> {
    let key = name.to_lowercase();
    database.get_mut(&key).ok_or_else(|| {
        Db2MiddlewareError::ExecutionError(format!("undefined table name '{key}'"))
    })
}

fn column_index(table: &Table, name: &str) -> Result<usize, Db2MiddlewareError> {
    table
        .columns
        .iter()
        .position(|column| column.eq_ignore_ascii_case(name))
        .ok_or_else(|| {
            Db2MiddlewareError::ExecutionError(format!("undefined column name '{name}'"))
        })
}

/// Convert one bound parameter the way the real driver would: typed
/// parameters coerce the textual value, `Auto` infers integer, then float,
/// then text.
fn convert_parameter(parameter: &BoundParameter) -> Result<RowValues, Db2MiddlewareError> {
    let Some(native_type) = parameter.native_type else {
        if let Ok(value) = parameter.value.trim().parse::<i64>() {
            return Ok(RowValues::Int(value));
        }
        if let Ok(value) = parameter.value.trim().parse::<f64>() {
            return Ok(RowValues::Float(value));
        }
        return Ok(RowValues::Text(parameter.value.clone()));
    };

    if native_type.is_integer_kind() {
        parameter
            .value
            .trim()
            .parse::<i64>()
            .map(RowValues::Int)
            .map_err(|error| {
                Db2MiddlewareError::ParameterError(format!(
                    "parameter '{}' is not a valid {native_type:?}: {error}",
                    parameter.name
                ))
            })
    } else if native_type.is_float_kind() {
        parameter
            .value
            .trim()
            .parse::<f64>()
            .map(RowValues::Float)
            .map_err(|error| {
                Db2MiddlewareError::ParameterError(format!(
                    "parameter '{}' is not a valid {native_type:?}: {error}",
                    parameter.name
                ))
            })
    } else if native_type.is_binary_kind() {
        Ok(RowValues::Blob(parameter.value.clone().into_bytes()))
    } else {
        Ok(RowValues::Text(parameter.value.clone()))
    }
}

/// Parse one value token; `?` consumes the next converted parameter.
fn parse_value(
    token: &str,
    parameters: &mut VecDeque<RowValues>,
) -> Result<RowValues, Db2MiddlewareError> {
    let token = token.trim();
    if token == "?" {
        return parameters.pop_front().ok_or_else(|| {
            Db2MiddlewareError::ParameterError(
                "more markers than declared parameters".to_string(),
            )
        });
    }
    if token.eq_ignore_ascii_case("null") {
        return Ok(RowValues::Null);
    }
    if token.len() >= 2 && token.starts_with('\'') && token.ends_with('\'') {
        return Ok(RowValues::Text(token[1..token.len() - 1].to_string()));
    }
    if let Ok(value) = token.parse::<i64>() {
        return Ok(RowValues::Int(value));
    }
    if let Ok(value) = token.parse::<f64>() {
        return Ok(RowValues::Float(value));
    }
    Err(Db2MiddlewareError::ExecutionError(format!(
        "unrecognized literal '{token}'"
    )))
}

fn values_equal(left: &RowValues, right: &RowValues) -> bool {
    match (left, right) {
        (RowValues::Int(int), RowValues::Float(float))
        | (RowValues::Float(float), RowValues::Int(int)) =>
        {
            #[allow(clippy::cast_precision_loss)]
            let int = *int as f64;
            int == *float
        }
        _ => left == right,
    }
}
