#![cfg(feature = "odbc")]

// Round trip against a real DB2. Needs the IBM CLI/ODBC driver installed
// and DB2_CONNECTION_STRING set, e.g.
// `Driver={IBM DB2 ODBC DRIVER};Database=testdb;Hostname=localhost;Port=50000;Uid=db2inst1;Pwd=password;`

use db2_middleware::odbc::OdbcDriver;
use db2_middleware::prelude::*;
use serde_json::json;
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

#[test]
fn db2_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let Ok(connection_string) = std::env::var("DB2_CONNECTION_STRING") else {
        eprintln!("DB2_CONNECTION_STRING not set; skipping DB2 round trip");
        return Ok(());
    };

    let rt = Runtime::new()?;
    rt.block_on(async {
        let driver = OdbcDriver::new();
        let options = QueryOptions::default();
        let run = |sql: &str, execute_type: ExecuteType, parameters: Vec<QueryParameter>| {
            let input = QueryInput::new(connection_string.as_str(), sql, execute_type)
                .with_parameters(parameters);
            let options = options.clone();
            async move {
                execute_query(&driver, &input, &options, CancellationToken::new()).await
            }
        };

        // DB2 has no DROP TABLE IF EXISTS; a failed drop is fine here.
        let _ = run("DROP TABLE RT_PEOPLE", ExecuteType::NonQuery, Vec::new()).await?;

        let outcome = run(
            "CREATE TABLE RT_PEOPLE (ID INT NOT NULL, NAME VARCHAR(50))",
            ExecuteType::NonQuery,
            Vec::new(),
        )
        .await?;
        assert!(outcome.success, "{:?}", outcome.error_message);

        let outcome = run(
            "INSERT INTO RT_PEOPLE (ID, NAME) VALUES (?, ?)",
            ExecuteType::NonQuery,
            vec![
                QueryParameter::new("id", "1", DataType::Integer),
                QueryParameter::new("name", "alice", DataType::VarChar),
            ],
        )
        .await?;
        assert!(outcome.success, "{:?}", outcome.error_message);
        assert_eq!(outcome.records_affected, 1);

        let outcome = run(
            "SELECT ID, NAME FROM RT_PEOPLE",
            ExecuteType::Auto,
            Vec::new(),
        )
        .await?;
        assert!(outcome.success, "{:?}", outcome.error_message);
        assert_eq!(outcome.records_affected, -1);
        assert_eq!(
            outcome.data.expect("payload").to_json(),
            json!([{ "ID": 1, "NAME": "alice" }])
        );

        let outcome = run(
            "SELECT COUNT(*) FROM RT_PEOPLE",
            ExecuteType::Scalar,
            Vec::new(),
        )
        .await?;
        assert_eq!(outcome.records_affected, 1);

        let outcome = run("DROP TABLE RT_PEOPLE", ExecuteType::NonQuery, Vec::new()).await?;
        assert!(outcome.success, "{:?}", outcome.error_message);

        Ok(())
    })
}
