use std::time::Duration;

use lazy_static::lazy_static;
use odbc_api::{ConnectionOptions, Environment};

use crate::error::Db2MiddlewareError;

lazy_static! {
    // One ODBC environment per process, shared by all worker threads.
    static ref ODBC_ENVIRONMENT: Result<Environment, odbc_api::Error> = Environment::new();
}

/// The process-wide ODBC environment.
///
/// # Errors
/// Returns `Db2MiddlewareError::ConnectionError` if the environment could
/// not be allocated (no driver manager installed, typically).
pub(crate) fn environment() -> Result<&'static Environment, Db2MiddlewareError> {
    ODBC_ENVIRONMENT.as_ref().map_err(|e| {
        Db2MiddlewareError::ConnectionError(format!(
            "failed to initialize ODBC environment: {e}"
        ))
    })
}

/// Connection options carrying the caller's login timeout.
pub(crate) fn connection_options(timeout: Duration) -> ConnectionOptions {
    ConnectionOptions {
        login_timeout_sec: Some(timeout.as_secs().min(u64::from(u32::MAX)) as u32),
        ..ConnectionOptions::default()
    }
}
