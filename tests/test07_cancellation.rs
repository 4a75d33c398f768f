#![cfg(feature = "test-utils")]

use db2_middleware::prelude::*;
use db2_middleware::test_utils::{MemoryDriver, TxEvent};
use serde_json::json;
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

const DSN: &str = "Database=testdb;Hostname=localhost;Port=50000;Uid=db2inst1;Pwd=pw;";

fn no_transaction() -> QueryOptions {
    QueryOptions::default().with_isolation_level(TransactionIsolationLevel::None)
}

async fn seed(driver: &MemoryDriver) -> Result<(), Db2MiddlewareError> {
    let input = QueryInput::new(
        DSN,
        "CREATE TABLE people (ID INT, NAME VARCHAR(50))",
        ExecuteType::NonQuery,
    );
    execute_query(driver, &input, &no_transaction(), CancellationToken::new()).await?;
    let input = QueryInput::new(
        DSN,
        "INSERT INTO people (ID, NAME) VALUES (1, 'alice')",
        ExecuteType::NonQuery,
    );
    execute_query(driver, &input, &no_transaction(), CancellationToken::new()).await?;
    Ok(())
}

#[test]
fn cancellation_is_honored_at_the_commit_step() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let driver = MemoryDriver::new();
        seed(&driver).await?;

        let cancellation = CancellationToken::new();
        cancellation.cancel();

        let input = QueryInput::new(
            DSN,
            "UPDATE people SET NAME = 'mallory' WHERE ID = 1",
            ExecuteType::NonQuery,
        );
        let outcome =
            execute_query(&driver, &input, &QueryOptions::default(), cancellation).await?;
        assert!(!outcome.success);
        let message = outcome.error_message.expect("failure message");
        assert!(
            message.contains("Operation cancelled at transaction commit"),
            "{message}"
        );
        // The same cancellation blocks the rollback attempt, which is
        // reported as a rollback failure.
        assert!(
            message.contains("Operation cancelled at transaction rollback"),
            "{message}"
        );
        assert!(!driver.events().contains(&TxEvent::Commit));

        // Closing the connection rolled the open transaction back.
        let input = QueryInput::new(DSN, "SELECT * FROM people", ExecuteType::Auto);
        let rows =
            execute_query(&driver, &input, &no_transaction(), CancellationToken::new()).await?;
        assert_eq!(
            rows.data.expect("payload").to_json(),
            json!([{ "ID": 1, "NAME": "alice" }])
        );

        Ok(())
    })
}

#[test]
fn cancellation_is_honored_at_the_reader_close_step() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let driver = MemoryDriver::new();
        seed(&driver).await?;

        let cancellation = CancellationToken::new();
        cancellation.cancel();

        let input = QueryInput::new(DSN, "SELECT * FROM people", ExecuteType::Auto);
        let outcome = execute_query(&driver, &input, &no_transaction(), cancellation).await?;
        assert!(!outcome.success);
        let message = outcome.error_message.expect("failure message");
        assert!(
            message.contains("Operation cancelled at reader close"),
            "{message}"
        );
        assert!(
            message.contains("no transaction rollback was performed"),
            "{message}"
        );

        Ok(())
    })
}
