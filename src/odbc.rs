//! DB2 connectivity through the IBM CLI/ODBC driver.
//!
//! The ODBC calls are blocking, so each connection owns a dedicated worker
//! thread holding the ODBC handles; the async trait methods talk to it over
//! an mpsc channel and receive answers on oneshot channels. The async
//! runtime is never blocked by the driver.

mod config;
mod connection;
mod worker;

use std::time::Duration;

use async_trait::async_trait;

pub use connection::{OdbcConnection, OdbcCursor};

use crate::driver::{Db2Connection, Db2Driver};
use crate::error::Db2MiddlewareError;

/// [`Db2Driver`] implementation over the IBM CLI/ODBC driver.
///
/// ```rust,no_run
/// use db2_middleware::odbc::OdbcDriver;
/// use db2_middleware::prelude::*;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn demo() -> Result<(), Db2MiddlewareError> {
/// let driver = OdbcDriver::new();
/// let input = QueryInput::new(
///     "Database=testdb;Hostname=localhost;Port=50000;Uid=db2inst1;Pwd=password;",
///     "SELECT * FROM sysibm.sysdummy1",
///     ExecuteType::Auto,
/// );
/// let outcome =
///     execute_query(&driver, &input, &QueryOptions::default(), CancellationToken::new()).await?;
/// assert!(outcome.success);
/// # Ok(()) }
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct OdbcDriver;

impl OdbcDriver {
    #[must_use]
    pub fn new() -> Self {
        OdbcDriver
    }
}

#[async_trait]
impl Db2Driver for OdbcDriver {
    async fn open(
        &self,
        connection_string: &str,
        timeout: Duration,
    ) -> Result<Box<dyn Db2Connection>, Db2MiddlewareError> {
        let (sender, ready) = worker::spawn(connection_string.to_string(), timeout);
        ready.await.map_err(|_| {
            Db2MiddlewareError::ConnectionError(
                "DB2 worker exited before reporting readiness".to_string(),
            )
        })??;
        Ok(Box::new(OdbcConnection::new(sender)))
    }
}
