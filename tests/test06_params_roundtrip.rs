#![cfg(feature = "test-utils")]

use db2_middleware::prelude::*;
use db2_middleware::test_utils::MemoryDriver;
use serde_json::json;
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

const DSN: &str = "Database=testdb;Hostname=localhost;Port=50000;Uid=db2inst1;Pwd=pw;";

async fn run_input(
    driver: &MemoryDriver,
    input: QueryInput,
    options: &QueryOptions,
) -> Result<QueryOutcome, Db2MiddlewareError> {
    execute_query(driver, &input, options, CancellationToken::new()).await
}

async fn run(
    driver: &MemoryDriver,
    sql: &str,
    execute_type: ExecuteType,
    options: &QueryOptions,
) -> Result<QueryOutcome, Db2MiddlewareError> {
    run_input(driver, QueryInput::new(DSN, sql, execute_type), options).await
}

async fn seed(driver: &MemoryDriver) -> Result<(), Db2MiddlewareError> {
    let options = QueryOptions::default();
    run(
        driver,
        "CREATE TABLE people (ID INT, NAME VARCHAR(50))",
        ExecuteType::NonQuery,
        &options,
    )
    .await?;
    for (id, name) in [("1", "alice"), ("2", "bob"), ("3", "carol")] {
        let input = QueryInput::new(
            DSN,
            "INSERT INTO people (ID, NAME) VALUES (?, ?)",
            ExecuteType::NonQuery,
        )
        .with_parameters(vec![
            QueryParameter::new("id", id, DataType::Integer),
            QueryParameter::new("name", name, DataType::VarChar),
        ]);
        let outcome = run_input(driver, input, &options).await?;
        assert!(outcome.success);
        assert_eq!(outcome.records_affected, 1);
    }
    Ok(())
}

#[test]
fn typed_parameters_round_trip_in_insertion_order() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let driver = MemoryDriver::new();
        seed(&driver).await?;

        let outcome = run(
            &driver,
            "SELECT * FROM people",
            ExecuteType::Auto,
            &QueryOptions::default(),
        )
        .await?;
        assert_eq!(
            outcome.data.expect("payload").to_json(),
            json!([
                { "ID": 1, "NAME": "alice" },
                { "ID": 2, "NAME": "bob" },
                { "ID": 3, "NAME": "carol" },
            ])
        );

        Ok(())
    })
}

#[test]
fn auto_parameters_are_inferred_by_the_driver() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let driver = MemoryDriver::new();
        seed(&driver).await?;

        let input = QueryInput::new(
            DSN,
            "SELECT * FROM people WHERE ID = ?",
            ExecuteType::Auto,
        )
        .with_parameters(vec![QueryParameter::auto("id", "2")]);
        let outcome = run_input(&driver, input, &QueryOptions::default()).await?;
        assert_eq!(
            outcome.data.expect("payload").to_json(),
            json!([{ "ID": 2, "NAME": "bob" }])
        );

        Ok(())
    })
}

#[test]
fn update_touches_only_the_matching_row() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let driver = MemoryDriver::new();
        seed(&driver).await?;
        let options = QueryOptions::default();

        let outcome = run(
            &driver,
            "UPDATE people SET NAME = 'amelia' WHERE ID = 2",
            ExecuteType::Auto,
            &options,
        )
        .await?;
        assert!(outcome.success);
        assert_eq!(outcome.records_affected, 1);

        let rows = run(&driver, "SELECT * FROM people", ExecuteType::Auto, &options).await?;
        assert_eq!(
            rows.data.expect("payload").to_json(),
            json!([
                { "ID": 1, "NAME": "alice" },
                { "ID": 2, "NAME": "amelia" },
                { "ID": 3, "NAME": "carol" },
            ])
        );

        let outcome = run(
            &driver,
            "DELETE FROM people WHERE ID = 1",
            ExecuteType::Auto,
            &options,
        )
        .await?;
        assert_eq!(outcome.records_affected, 1);

        let outcome = run(
            &driver,
            "SELECT COUNT(*) FROM people",
            ExecuteType::Scalar,
            &options,
        )
        .await?;
        assert_eq!(outcome.records_affected, 2);

        Ok(())
    })
}

#[test]
fn malformed_typed_parameter_fails_the_invocation() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let driver = MemoryDriver::new();
        seed(&driver).await?;

        let input = QueryInput::new(
            DSN,
            "INSERT INTO people (ID, NAME) VALUES (?, ?)",
            ExecuteType::NonQuery,
        )
        .with_parameters(vec![
            QueryParameter::new("id", "not-a-number", DataType::Integer),
            QueryParameter::new("name", "dan", DataType::VarChar),
        ]);
        let outcome = run_input(&driver, input, &QueryOptions::default()).await?;
        assert!(!outcome.success);
        let message = outcome.error_message.expect("failure message");
        assert!(message.contains("not a valid Integer"), "{message}");

        Ok(())
    })
}
