use crate::core::common::types::Value;
use crate::core::transaction::{
    Coordinator, DriverCall, DriverError, RecordingDriver, SavepointNaming, Scope, TransactionError,
};
use crate::event_engine::{CollectingListener, TransactionEvent};

type Outcome = Result<(), TransactionError<String>>;

fn coordinator() -> Coordinator<RecordingDriver> {
    Coordinator::new(RecordingDriver::new())
}

fn savepoint(id: &str) -> DriverCall {
    DriverCall::Savepoint(id.to_string())
}

#[test]
fn test_root_run_begins_and_commits() {
    let mut coord = coordinator();
    let value = coord
        .run(false, |tx| -> Result<i32, TransactionError<String>> {
            assert_eq!(tx.scope(), &Scope::Root);
            assert_eq!(tx.depth(), 1);
            Ok(7)
        })
        .unwrap();

    assert_eq!(value, Some(7));
    assert!(!coord.is_active());
    assert_eq!(coord.driver().calls(), &[DriverCall::Begin, DriverCall::Commit]);
}

#[test]
fn test_nested_run_without_savepoint_joins_scope() {
    let mut coord = coordinator();
    coord
        .run(false, |tx| -> Outcome {
            tx.run(false, |inner| -> Outcome {
                assert_eq!(inner.scope(), &Scope::Root);
                assert_eq!(inner.depth(), 1);
                Ok(())
            })?;
            Ok(())
        })
        .unwrap();

    assert_eq!(coord.driver().count(&DriverCall::Begin), 1);
    assert_eq!(coord.driver().calls(), &[DriverCall::Begin, DriverCall::Commit]);
}

#[test]
fn test_savepoint_rollback_leaves_outer_transaction_intact() {
    let mut coord = coordinator();
    coord
        .run(false, |tx| -> Outcome {
            let handled = tx.run(true, |sp| -> Outcome {
                assert_eq!(sp.scope(), &Scope::Savepoint("2".to_string()));
                assert_eq!(sp.depth(), 2);
                Err(sp.rollback_savepoint())
            })?;
            assert_eq!(handled, None);
            assert_eq!(tx.depth(), 1);
            Ok(())
        })
        .unwrap();

    assert_eq!(
        coord.driver().calls(),
        &[
            DriverCall::Begin,
            savepoint("2"),
            DriverCall::RollbackToSavepoint("2".to_string()),
            DriverCall::Commit,
        ]
    );
    assert_eq!(coord.driver().count(&savepoint("2")), 1);
}

#[test]
fn test_rollback_transaction_from_innermost_joined_run() {
    let mut coord = coordinator();
    let result = coord.run(false, |tx| -> Outcome {
        tx.run(false, |middle| -> Outcome {
            middle.run(false, |inner| -> Outcome { Err(inner.rollback()) })?;
            Ok(())
        })?;
        Ok(())
    });

    assert_eq!(result.unwrap(), None);
    assert_eq!(coord.depth(), 0);
    assert_eq!(coord.driver().count(&DriverCall::Rollback), 1);
    assert_eq!(coord.driver().calls(), &[DriverCall::Begin, DriverCall::Rollback]);
}

#[test]
fn test_rollback_transaction_unwinds_through_savepoints() {
    let mut coord = coordinator();
    let result = coord.run(false, |tx| -> Outcome {
        tx.run(true, |sp| -> Outcome {
            sp.run(true, |inner| -> Outcome { Err(inner.rollback()) })?;
            Ok(())
        })?;
        Ok(())
    });

    assert_eq!(result.unwrap(), None);
    assert!(!coord.is_active());
    assert_eq!(
        coord.driver().calls(),
        &[DriverCall::Begin, savepoint("2"), savepoint("3"), DriverCall::Rollback]
    );
}

#[test]
fn test_rollback_to_outer_savepoint_from_inner_one() {
    let mut coord = coordinator();
    coord
        .run(false, |tx| -> Outcome {
            let handled = tx.run(true, |outer_sp| -> Outcome {
                outer_sp.run(true, |_inner| -> Outcome {
                    Err(TransactionError::RollbackSavepoint("2".to_string()))
                })?;
                Ok(())
            })?;
            assert_eq!(handled, None);
            assert_eq!(tx.depth(), 1);
            Ok(())
        })
        .unwrap();

    assert_eq!(
        coord.driver().calls(),
        &[
            DriverCall::Begin,
            savepoint("2"),
            savepoint("3"),
            DriverCall::RollbackToSavepoint("2".to_string()),
            DriverCall::Commit,
        ]
    );
}

#[test]
fn test_rollback_to_unknown_savepoint_aborts() {
    let mut coord = coordinator();
    let result = coord.run(false, |tx| -> Outcome {
        tx.run(true, |_sp| -> Outcome { Err(TransactionError::RollbackSavepoint("9".to_string())) })?;
        Ok(())
    });

    assert!(matches!(result, Err(TransactionError::InvalidSavepoint(ref id)) if id == "9"));
    assert!(!coord.is_active());
    assert_eq!(
        coord.driver().calls(),
        &[DriverCall::Begin, savepoint("2"), DriverCall::Rollback]
    );
}

#[test]
fn test_callback_error_rolls_back_and_is_returned_unchanged() {
    let mut coord = coordinator();
    let result = coord.run(false, |tx| -> Outcome {
        tx.run(true, |_sp| -> Outcome { Err(TransactionError::Callback("disk full".to_string())) })?;
        Ok(())
    });

    assert_eq!(result.unwrap_err().into_callback(), Some("disk full".to_string()));
    assert_eq!(coord.depth(), 0);
    assert_eq!(
        coord.driver().calls(),
        &[DriverCall::Begin, savepoint("2"), DriverCall::Rollback]
    );
}

#[test]
fn test_caught_savepoint_error_keeps_transaction_alive() {
    let mut coord = coordinator();
    coord
        .run(false, |tx| -> Outcome {
            let nested = tx.run(true, |_sp| -> Outcome { Err(TransactionError::Callback("nope".to_string())) });
            assert!(nested.is_err());
            assert_eq!(tx.depth(), 1);
            Ok(())
        })
        .unwrap();

    assert_eq!(
        coord.driver().calls(),
        &[DriverCall::Begin, savepoint("2"), DriverCall::Commit]
    );
}

#[test]
fn test_sibling_savepoints_reuse_depth_ids() {
    let mut coord = coordinator();
    coord
        .run(false, |tx| -> Outcome {
            tx.run(true, |_| -> Outcome { Ok(()) })?;
            tx.run(true, |_| -> Outcome { Ok(()) })?;
            Ok(())
        })
        .unwrap();
    assert_eq!(coord.driver().count(&savepoint("2")), 2);
}

#[test]
fn test_counter_naming_never_reuses_ids() {
    let mut coord = Coordinator::with_naming(RecordingDriver::new(), SavepointNaming::Counter);
    coord
        .run(false, |tx| -> Outcome {
            tx.run(true, |_| -> Outcome { Ok(()) })?;
            tx.run(true, |sp| -> Outcome {
                sp.run(true, |_| -> Outcome { Ok(()) })?;
                Ok(())
            })?;
            Ok(())
        })
        .unwrap();

    assert_eq!(
        coord.driver().calls(),
        &[DriverCall::Begin, savepoint("1"), savepoint("2"), savepoint("3"), DriverCall::Commit]
    );
}

#[test]
fn test_begin_failure_opens_nothing() {
    let mut driver = RecordingDriver::new();
    driver.fail_on(DriverCall::Begin);
    let mut coord = Coordinator::new(driver);

    let mut invoked = false;
    let result = coord.run(false, |_| -> Outcome {
        invoked = true;
        Ok(())
    });

    assert!(matches!(result, Err(TransactionError::Driver(_))));
    assert!(!invoked);
    assert!(!coord.is_active());
}

#[test]
fn test_commit_failure_rolls_back() {
    let mut driver = RecordingDriver::new();
    driver.fail_on(DriverCall::Commit);
    let mut coord = Coordinator::new(driver);

    let result = coord.run(false, |_| -> Outcome { Ok(()) });

    assert!(matches!(result, Err(TransactionError::Driver(_))));
    assert!(!coord.is_active());
    assert_eq!(coord.driver().calls(), &[DriverCall::Begin, DriverCall::Commit, DriverCall::Rollback]);
}

#[test]
fn test_failed_rollback_replaces_original_error() {
    let mut driver = RecordingDriver::new();
    driver.fail_on(DriverCall::Rollback);
    let mut coord = Coordinator::new(driver);

    let result = coord.run(false, |_| -> Outcome { Err(TransactionError::Callback("original".to_string())) });

    match result {
        Err(TransactionError::Driver(DriverError { message, .. })) => assert!(message.contains("Rollback")),
        other => panic!("expected driver error, got {other:?}"),
    }
    assert!(!coord.is_active());
}

#[test]
fn test_execute_goes_through_driver() {
    let mut coord = coordinator();
    coord
        .run(false, |tx| -> Outcome {
            let envelope = tx.execute("UPDATE t SET a = ?", &[Value::Integer(1)])?;
            assert_eq!(envelope.bindings, vec![Value::Integer(1)]);
            Ok(())
        })
        .unwrap();
    assert_eq!(
        coord.driver().calls(),
        &[DriverCall::Begin, DriverCall::Execute("UPDATE t SET a = ?".to_string()), DriverCall::Commit]
    );
}

#[test]
fn test_events_are_emitted_in_order() {
    let listener = CollectingListener::new();
    let mut coord = coordinator();
    coord.subscribe(Box::new(listener.clone()));

    coord
        .run(false, |tx| -> Outcome {
            tx.run(true, |sp| -> Outcome { Err(sp.rollback_savepoint()) })?;
            Ok(())
        })
        .unwrap();
    let _ = coord.run(false, |tx| -> Outcome { Err(tx.rollback()) });

    assert_eq!(
        listener.events(),
        vec![
            TransactionEvent::Began { scope: Scope::Root, depth: 1 },
            TransactionEvent::Began { scope: Scope::Savepoint("2".to_string()), depth: 2 },
            TransactionEvent::RolledBackToSavepoint { id: "2".to_string() },
            TransactionEvent::Committed,
            TransactionEvent::Began { scope: Scope::Root, depth: 1 },
            TransactionEvent::RolledBack,
        ]
    );
}

#[test]
fn test_rollback_savepoint_in_root_scope_rolls_back_everything() {
    let mut coord = coordinator();
    let result = coord.run(false, |tx| -> Outcome { Err(tx.rollback_savepoint()) });
    assert_eq!(result.unwrap(), None);
    assert_eq!(coord.driver().calls(), &[DriverCall::Begin, DriverCall::Rollback]);
}

#[test]
fn test_outer_savepoint_rollback_happens_even_if_signal_is_swallowed() {
    let mut coord = coordinator();
    coord
        .run(false, |tx| -> Outcome {
            let outer = tx.run(true, |sp| -> Outcome {
                let inner = sp.run(true, |_inner| -> Outcome {
                    Err(TransactionError::RollbackSavepoint("2".to_string()))
                });
                assert!(matches!(inner, Ok(None)));
                assert_eq!(sp.depth(), 1);
                Ok(())
            })?;
            assert_eq!(outer, None);
            assert_eq!(tx.depth(), 1);
            Ok(())
        })
        .unwrap();

    assert!(!coord.is_active());
    assert_eq!(
        coord.driver().calls(),
        &[
            DriverCall::Begin,
            savepoint("2"),
            savepoint("3"),
            DriverCall::RollbackToSavepoint("2".to_string()),
            DriverCall::Commit,
        ]
    );
}

#[test]
fn test_joined_run_carries_out_savepoint_rollback() {
    let mut coord = coordinator();
    coord
        .run(false, |tx| -> Outcome {
            let outer = tx.run(true, |sp| -> Outcome {
                let joined = sp.run(false, |j| -> Outcome { Err(j.rollback_savepoint()) });
                assert!(matches!(joined, Ok(None)));
                Ok(())
            })?;
            assert_eq!(outer, None);
            Ok(())
        })
        .unwrap();

    assert_eq!(coord.driver().count(&DriverCall::RollbackToSavepoint("2".to_string())), 1);
    assert_eq!(coord.driver().calls().last(), Some(&DriverCall::Commit));
}

#[test]
fn test_new_savepoint_after_outer_rollback_is_settled_normally() {
    let mut coord = coordinator();
    coord
        .run(false, |tx| -> Outcome {
            tx.run(true, |sp| -> Outcome {
                sp.run(true, |_| -> Outcome { Err(TransactionError::RollbackSavepoint("2".to_string())) })?;
                sp.run(true, |again| -> Outcome {
                    assert_eq!(again.scope(), &Scope::Savepoint("2".to_string()));
                    Ok(())
                })?;
                assert_eq!(sp.depth(), 1);
                Ok(())
            })?;
            Ok(())
        })
        .unwrap();

    assert_eq!(
        coord.driver().calls(),
        &[
            DriverCall::Begin,
            savepoint("2"),
            savepoint("3"),
            DriverCall::RollbackToSavepoint("2".to_string()),
            savepoint("2"),
            DriverCall::Commit,
        ]
    );
}
