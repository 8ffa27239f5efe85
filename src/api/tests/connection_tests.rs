use std::time::Duration;

use crate::api::Connection;
use crate::core::common::types::{ExecutionEnvelope, Row, Value};
use crate::core::common::OxisqlError;
use crate::core::config::{Config, Dialect};
use crate::core::query::builder::{insert, select, update, FilterBuilder};
use crate::core::query::condition::Condition;
use crate::core::query::errors::CompileError;
use crate::core::transaction::{DriverCall, RecordingDriver, Scope, TransactionError};
use crate::event_engine::{CollectingListener, TransactionEvent};

fn postgres() -> Config {
    Config::builder().dialect(Dialect::Postgres).build().unwrap()
}

fn connection() -> Connection<RecordingDriver> {
    Connection::new(RecordingDriver::new(), &postgres())
}

#[test]
fn test_execute_outside_transaction() {
    let mut conn = connection();
    let statement = select("users").where_clause(Condition::column("id").equals(7)).build();
    let expected = conn.compile(&statement).unwrap();
    assert_eq!(expected.sql, "SELECT * FROM \"users\" WHERE \"id\" = ?");

    let envelope = conn.execute(&statement).unwrap();
    assert_eq!(envelope.sql, expected.sql);
    assert_eq!(envelope.bindings, vec![Value::Integer(7)]);
    assert!(!conn.in_transaction());
    assert_eq!(conn.driver().calls(), &[DriverCall::Execute(expected.sql)]);
}

#[test]
fn test_compile_error_never_reaches_driver() {
    let mut conn = connection();
    let err = conn.execute(&insert("users").build()).unwrap_err();
    assert!(matches!(err, OxisqlError::Compile(CompileError::EmptyDataset)));
    assert!(conn.driver().calls().is_empty());
}

#[test]
fn test_execute_raw_keeps_driver_envelope() {
    let mut driver = RecordingDriver::new();
    driver.push_response(
        ExecutionEnvelope::new("", Vec::new())
            .with_rows(vec!["id".to_string()], vec![Row::new(vec![Value::Integer(1)])])
            .with_elapsed(Duration::from_secs(2)),
    );
    let config = Config::builder().slow_statement_threshold_ms(500).build().unwrap();
    let mut conn = Connection::new(driver, &config);

    let envelope = conn.execute_raw("SELECT id FROM t WHERE id = ?", &[Value::Integer(1)]).unwrap();
    assert_eq!(envelope.row_count(), 1);
    assert_eq!(envelope.elapsed(), Duration::from_secs(2));
    assert!(envelope.is_slow(config.slow_statement_threshold()));
}

#[test]
fn test_driver_error_surfaces_as_oxisql_error() {
    let mut driver = RecordingDriver::new();
    driver.fail_on(DriverCall::Execute("DELETE FROM t".to_string()));
    let mut conn = Connection::new(driver, &Config::default());

    let err = conn.execute_raw("DELETE FROM t", &[]).unwrap_err();
    assert!(matches!(err, OxisqlError::Driver(_)));
}

#[test]
fn test_transaction_commits_statements() {
    let mut conn = connection();
    let statement = update("users").set("active", true).where_clause(Condition::column("id").equals(1)).build();
    let sql = conn.compile(&statement).unwrap().sql;

    let affected = conn
        .transaction(|session| -> Result<u64, TransactionError<()>> {
            assert_eq!(session.scope(), &Scope::Root);
            assert_eq!(session.depth(), 1);
            Ok(session.execute(&statement)?.affected_rows())
        })
        .unwrap();

    assert_eq!(affected, Some(0));
    assert_eq!(conn.driver().calls(), &[DriverCall::Begin, DriverCall::Execute(sql), DriverCall::Commit]);
}

#[test]
fn test_savepoint_rollback_keeps_outer_work() {
    let mut conn = Connection::new(RecordingDriver::new(), &Config::default());

    let outcome = conn
        .transaction(|session| -> Result<&str, TransactionError<()>> {
            session.execute_raw("INSERT INTO a VALUES (1)", &[])?;
            let inner = session.savepoint(|inner| -> Result<(), TransactionError<()>> {
                inner.execute_raw("INSERT INTO b VALUES (1)", &[])?;
                Err(inner.rollback_savepoint())
            })?;
            assert_eq!(inner, None);
            Ok("done")
        })
        .unwrap();

    assert_eq!(outcome, Some("done"));
    assert_eq!(
        conn.driver().calls(),
        &[
            DriverCall::Begin,
            DriverCall::Execute("INSERT INTO a VALUES (1)".to_string()),
            DriverCall::Savepoint("2".to_string()),
            DriverCall::Execute("INSERT INTO b VALUES (1)".to_string()),
            DriverCall::RollbackToSavepoint("2".to_string()),
            DriverCall::Commit,
        ]
    );
}

#[test]
fn test_compile_error_in_session_aborts_transaction() {
    let mut conn = connection();
    let result = conn.transaction(|session| -> Result<(), TransactionError<()>> {
        session.execute(&update("users").build())?;
        Ok(())
    });

    assert!(matches!(result, Err(TransactionError::Compile(CompileError::EmptyAssignments))));
    assert_eq!(conn.driver().calls(), &[DriverCall::Begin, DriverCall::Rollback]);
    assert!(!conn.in_transaction());
}

#[test]
fn test_nested_transaction_joins_and_rollback_unwinds() {
    let mut conn = connection();
    let result = conn.savepoint(|session| -> Result<(), TransactionError<String>> {
        session.transaction(|joined| -> Result<(), TransactionError<String>> {
            assert_eq!(joined.depth(), 1);
            Err(joined.rollback())
        })?;
        Err(TransactionError::Callback("unreachable".to_string()))
    });

    assert!(matches!(result, Ok(None)));
    assert_eq!(conn.driver().calls(), &[DriverCall::Begin, DriverCall::Rollback]);
}

#[test]
fn test_sql_driver_connection_issues_dialect_sql() {
    let mut conn = Connection::with_executor(RecordingDriver::new(), &postgres());

    conn.transaction(|session| -> Result<(), TransactionError<()>> {
        session.savepoint(|inner| -> Result<(), TransactionError<()>> { Err(inner.rollback_savepoint()) })?;
        Ok(())
    })
    .unwrap();

    let calls: Vec<_> = conn.driver().executor().calls().to_vec();
    assert_eq!(
        calls,
        vec![
            DriverCall::Execute("BEGIN".to_string()),
            DriverCall::Execute("SAVEPOINT \"sp_2\"".to_string()),
            DriverCall::Execute("ROLLBACK TO SAVEPOINT \"sp_2\"".to_string()),
            DriverCall::Execute("COMMIT".to_string()),
        ]
    );
}

#[test]
fn test_counter_naming_from_config() {
    let mut conn = Connection::new(RecordingDriver::new(), &Config::for_testing().unwrap());

    conn.transaction(|session| -> Result<(), TransactionError<()>> {
        session.savepoint(|_| -> Result<(), TransactionError<()>> { Ok(()) })?;
        session.savepoint(|inner| -> Result<(), TransactionError<()>> {
            assert_eq!(inner.scope(), &Scope::Savepoint("2".to_string()));
            Ok(())
        })?;
        Ok(())
    })
    .unwrap();

    assert_eq!(conn.driver().count(&DriverCall::Savepoint("1".to_string())), 1);
    assert_eq!(conn.driver().count(&DriverCall::Savepoint("2".to_string())), 1);
}

#[test]
fn test_listeners_see_connection_transactions() {
    let mut conn = connection();
    let listener = CollectingListener::new();
    conn.subscribe(Box::new(listener.clone()));

    conn.transaction(|_| -> Result<(), TransactionError<()>> { Ok(()) }).unwrap();

    assert_eq!(
        listener.events(),
        vec![TransactionEvent::Began { scope: Scope::Root, depth: 1 }, TransactionEvent::Committed]
    );
}

#[test]
fn test_debug_names_dialect() {
    let conn = connection();
    assert!(format!("{conn:?}").contains("postgres"));
    assert_eq!(conn.formatter().dialect_name(), "postgres");
}

#[test]
fn test_session_rollback_savepoint_in_root_scope_rolls_back_transaction() {
    let mut conn = connection();
    let result = conn.transaction(|session| -> Result<(), TransactionError<()>> {
        let signal = session.rollback_savepoint();
        assert!(matches!(signal, TransactionError::RollbackTransaction));
        Err(signal)
    });

    assert!(matches!(result, Ok(None)));
    assert_eq!(conn.driver().calls(), &[DriverCall::Begin, DriverCall::Rollback]);
}
