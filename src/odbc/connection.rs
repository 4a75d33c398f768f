//! Async-facing connection and cursor over the worker channel.
//!
//! Every trait method clones what the worker needs, sends one
//! [`WorkerRequest`], and awaits the oneshot reply. Reader results arrive
//! fully materialized, so the cursor here is a drain over owned rows.

use std::collections::VecDeque;
use std::sync::mpsc::Sender;

use async_trait::async_trait;
use tokio::sync::oneshot;

use super::worker::{FetchedResult, Responder, WorkerRequest};
use crate::driver::{Command, Db2Connection, Db2Cursor, NativeIsolationLevel};
use crate::error::Db2MiddlewareError;
use crate::types::RowValues;

/// [`Db2Connection`] backed by a dedicated ODBC worker thread.
pub struct OdbcConnection {
    sender: Sender<WorkerRequest>,
    closed: bool,
}

impl OdbcConnection {
    pub(crate) fn new(sender: Sender<WorkerRequest>) -> Self {
        Self {
            sender,
            closed: false,
        }
    }

    async fn call<T>(
        &self,
        build: impl FnOnce(Responder<T>) -> WorkerRequest,
    ) -> Result<T, Db2MiddlewareError> {
        if self.closed {
            return Err(Db2MiddlewareError::ConnectionError(
                "connection is closed".to_string(),
            ));
        }
        let (respond, reply) = oneshot::channel();
        self.sender
            .send(build(respond))
            .map_err(|_| Db2MiddlewareError::ConnectionError("DB2 worker is gone".to_string()))?;
        reply.await.map_err(|_| {
            Db2MiddlewareError::ConnectionError("DB2 worker dropped the request".to_string())
        })?
    }
}

#[async_trait]
impl Db2Connection for OdbcConnection {
    async fn begin_transaction(
        &mut self,
        isolation: NativeIsolationLevel,
    ) -> Result<(), Db2MiddlewareError> {
        self.call(|respond| WorkerRequest::BeginTransaction { isolation, respond })
            .await
    }

    async fn commit(&mut self) -> Result<(), Db2MiddlewareError> {
        self.call(|respond| WorkerRequest::Commit { respond }).await
    }

    async fn rollback(&mut self) -> Result<(), Db2MiddlewareError> {
        self.call(|respond| WorkerRequest::Rollback { respond })
            .await
    }

    async fn execute_non_query(
        &mut self,
        command: &Command,
    ) -> Result<i64, Db2MiddlewareError> {
        let command = command.clone();
        self.call(move |respond| WorkerRequest::NonQuery { command, respond })
            .await
    }

    async fn execute_scalar(
        &mut self,
        command: &Command,
    ) -> Result<RowValues, Db2MiddlewareError> {
        let command = command.clone();
        self.call(move |respond| WorkerRequest::Scalar { command, respond })
            .await
    }

    async fn execute_reader(
        &mut self,
        command: &Command,
    ) -> Result<Box<dyn Db2Cursor>, Db2MiddlewareError> {
        let command = command.clone();
        let fetched = self
            .call(move |respond| WorkerRequest::Reader { command, respond })
            .await?;
        Ok(Box::new(OdbcCursor::new(fetched)))
    }

    async fn close(&mut self) -> Result<(), Db2MiddlewareError> {
        if self.closed {
            return Ok(());
        }
        let result = self
            .call(|respond| WorkerRequest::Shutdown { respond })
            .await;
        self.closed = true;
        result
    }
}

impl Drop for OdbcConnection {
    fn drop(&mut self) {
        // Backstop for exit paths that skipped close(); the worker rolls
        // back any open manual-commit window when it disconnects.
        if !self.closed {
            let (respond, _reply) = oneshot::channel();
            let _ = self.sender.send(WorkerRequest::Shutdown { respond });
        }
    }
}

/// Cursor over a result set the worker already materialized.
pub struct OdbcCursor {
    column_names: Vec<String>,
    rows: VecDeque<Vec<RowValues>>,
    records_affected: i64,
    closed: bool,
}

impl OdbcCursor {
    fn new(fetched: FetchedResult) -> Self {
        Self {
            column_names: fetched.column_names,
            rows: fetched.rows.into(),
            records_affected: fetched.records_affected,
            closed: false,
        }
    }
}

#[async_trait]
impl Db2Cursor for OdbcCursor {
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
