#![cfg(feature = "test-utils")]

use db2_middleware::prelude::*;
use db2_middleware::test_utils::{MemoryDriver, TxEvent};
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

const DSN: &str = "Database=testdb;Hostname=localhost;Port=50000;Uid=db2inst1;Pwd=pw;";

async fn run(
    driver: &MemoryDriver,
    sql: &str,
    execute_type: ExecuteType,
    options: &QueryOptions,
) -> Result<QueryOutcome, Db2MiddlewareError> {
    let input = QueryInput::new(DSN, sql, execute_type);
    execute_query(driver, &input, options, CancellationToken::new()).await
}

fn no_transaction() -> QueryOptions {
    QueryOptions::default().with_isolation_level(TransactionIsolationLevel::None)
}

async fn seed(driver: &MemoryDriver) -> Result<(), Db2MiddlewareError> {
    run(
        driver,
        "CREATE TABLE people (ID INT, NAME VARCHAR(50))",
        ExecuteType::NonQuery,
        &no_transaction(),
    )
    .await?;
    run(
        driver,
        "INSERT INTO people (ID, NAME) VALUES (1, 'alice'), (2, 'bob'), (3, 'carol')",
        ExecuteType::NonQuery,
        &no_transaction(),
    )
    .await?;
    Ok(())
}

async fn count(driver: &MemoryDriver) -> Result<i64, Db2MiddlewareError> {
    let outcome = run(
        driver,
        "SELECT COUNT(*) FROM people",
        ExecuteType::Scalar,
        &no_transaction(),
    )
    .await?;
    Ok(outcome.records_affected)
}

#[test]
fn commit_persists_for_every_transactional_level() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    let levels = [
        (
            TransactionIsolationLevel::Unspecified,
            NativeIsolationLevel::Unspecified,
        ),
        (
            TransactionIsolationLevel::Default,
            NativeIsolationLevel::ReadCommitted,
        ),
        (
            TransactionIsolationLevel::ReadCommitted,
            NativeIsolationLevel::ReadCommitted,
        ),
        (
            TransactionIsolationLevel::ReadUncommitted,
            NativeIsolationLevel::ReadUncommitted,
        ),
        (
            TransactionIsolationLevel::RepeatableRead,
            NativeIsolationLevel::RepeatableRead,
        ),
        (
            TransactionIsolationLevel::Serializable,
            NativeIsolationLevel::Serializable,
        ),
        (
            TransactionIsolationLevel::Snapshot,
            NativeIsolationLevel::Snapshot,
        ),
    ];

    for (level, native) in levels {
        rt.block_on(async {
            let driver = MemoryDriver::new();
            seed(&driver).await?;
            let before = count(&driver).await?;

            let outcome = run(
                &driver,
                "INSERT INTO people (ID, NAME) VALUES (4, 'dan')",
                ExecuteType::NonQuery,
                &QueryOptions::default().with_isolation_level(level),
            )
            .await?;
            assert!(outcome.success, "{level:?}");
            assert_eq!(outcome.records_affected, 1);
            assert_eq!(count(&driver).await?, before + 1, "{level:?}");
            assert_eq!(driver.events(), vec![TxEvent::Begin(native), TxEvent::Commit]);

            Ok::<(), Box<dyn std::error::Error>>(())
        })?;
    }
    Ok(())
}

#[test]
fn no_transaction_is_opened_for_isolation_none() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let driver = MemoryDriver::new();
        seed(&driver).await?;

        run(
            &driver,
            "INSERT INTO people (ID, NAME) VALUES (4, 'dan')",
            ExecuteType::NonQuery,
            &no_transaction(),
        )
        .await?;
        assert!(driver.events().is_empty());

        Ok(())
    })
}

#[test]
fn failing_statement_rolls_back() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let driver = MemoryDriver::new();
        seed(&driver).await?;
        let before = count(&driver).await?;

        let outcome = run(
            &driver,
            "THIS IS NOT SQL",
            ExecuteType::Auto,
            &QueryOptions::default(),
        )
        .await?;
        assert!(!outcome.success);
        let message = outcome.error_message.expect("failure message");
        assert!(
            message.contains("rollback completed without exception"),
            "{message}"
        );
        assert_eq!(count(&driver).await?, before);
        assert_eq!(driver.events().last(), Some(&TxEvent::Rollback));

        Ok(())
    })
}

#[test]
fn commit_failure_restores_the_snapshot() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let driver = MemoryDriver::new().fail_commit();
        seed(&driver).await?;

        // The update applies, the commit fails, the rollback restores.
        let outcome = run(
            &driver,
            "UPDATE people SET NAME = 'mallory' WHERE ID = 1",
            ExecuteType::NonQuery,
            &QueryOptions::default(),
        )
        .await?;
        assert!(!outcome.success);
        let message = outcome.error_message.expect("failure message");
        assert!(message.contains("rollback completed without exception"), "{message}");
        assert!(message.contains("simulated commit failure"), "{message}");

        let rows = run(
            &driver,
            "SELECT * FROM people WHERE ID = 1",
            ExecuteType::Auto,
            &no_transaction(),
        )
        .await?;
        assert_eq!(
            rows.data.expect("payload").to_json(),
            serde_json::json!([{ "ID": 1, "NAME": "alice" }])
        );

        Ok(())
    })
}
