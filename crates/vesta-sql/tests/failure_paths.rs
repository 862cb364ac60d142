//! Storage failures seen by the result sink, driven by a scripted engine.

mod common;

use std::sync::Arc;

use common::{init_tracing, int_pair, pair, provisioned_sink, Script, ScriptedEngine, WriteScript};
use vesta_common::{ErrorCode, TempTableConfig};
use vesta_sql::materialize::{CreateOptions, InsertOutcome, QueryShape, SetOpSink, SinkError};
use vesta_storage::{DefaultEngine, HandlerError, Representation};

#[test]
fn test_promotion_is_attempted_once() {
    let engine = ScriptedEngine::new(Script {
        heap_writes: WriteScript::AlwaysFull,
        disk_writes: WriteScript::AlwaysFull,
        ..Script::default()
    });
    let mut sink = provisioned_sink(engine.clone(), QueryShape::new(), true);

    let err = sink.insert(&pair(1, 2)).unwrap_err();
    assert!(matches!(
        err,
        SinkError::StorageFatal {
            source: HandlerError::TableFull {
                representation: Representation::OnDisk,
                ..
            },
            ..
        }
    ));
    assert!(err.is_fatal());
    assert_eq!(engine.calls().promotions, 1);
    assert_eq!(sink.row_count(), 0);
}

#[test]
fn test_promotion_failure_is_fatal() {
    let engine = ScriptedEngine::new(Script {
        heap_writes: WriteScript::AlwaysFull,
        promote_fails: true,
        ..Script::default()
    });
    let mut sink = provisioned_sink(engine.clone(), QueryShape::new().mixed(), true);

    let err = sink.insert(&pair(1, 2)).unwrap_err();
    assert!(matches!(
        err,
        SinkError::StorageFatal {
            source: HandlerError::Io(_),
            ..
        }
    ));
    assert_eq!(err.code(), ErrorCode::Io);
    assert_eq!(engine.calls().promotions, 1);
}

#[test]
fn test_promoted_hash_table_is_reinitialized() {
    let engine = ScriptedEngine::new(Script {
        heap_writes: WriteScript::AlwaysFull,
        ..Script::default()
    });
    let mut sink = provisioned_sink(engine.clone(), QueryShape::new().recursive(), true);

    assert_eq!(sink.insert(&pair(1, 2)).unwrap(), InsertOutcome::Inserted);
    let handler = sink.table().and_then(|t| t.handler()).unwrap();
    assert_eq!(handler.representation(), Representation::OnDisk);
    assert!(handler.index_active());

    assert_eq!(
        sink.insert(&pair(1, 2)).unwrap(),
        InsertOutcome::DuplicateRejected
    );
    assert_eq!(sink.row_count(), 1);
}

#[test]
fn test_other_write_errors_skip_promotion() {
    let engine = ScriptedEngine::new(Script {
        heap_writes: WriteScript::Corrupt,
        ..Script::default()
    });
    let mut sink = provisioned_sink(engine.clone(), QueryShape::new(), false);

    let err = sink.insert(&pair(1, 2)).unwrap_err();
    assert!(matches!(
        err,
        SinkError::StorageFatal {
            source: HandlerError::Corrupted(_),
            ..
        }
    ));
    assert_eq!(err.code(), ErrorCode::Corruption);
    assert_eq!(engine.calls().promotions, 0);
}

#[test]
fn test_allocation_failure() {
    init_tracing();
    let engine = ScriptedEngine::new(Script {
        create_fails: true,
        ..Script::default()
    });
    let mut sink = SetOpSink::new(engine.clone());

    let err = sink
        .create_result_table(&int_pair(), true, &CreateOptions::default(), "u", false, true)
        .unwrap_err();
    assert!(matches!(err, SinkError::AllocationFailure { .. }));
    assert_eq!(err.code(), ErrorCode::OutOfResources);
    assert!(sink.table().is_none());
    assert_eq!(engine.calls().creates, 1);

    // Nothing was provisioned, so a second attempt is allowed.
    let again =
        sink.create_result_table(&int_pair(), true, &CreateOptions::default(), "u", false, true);
    assert!(matches!(again, Err(SinkError::AllocationFailure { .. })));
    assert_eq!(engine.calls().creates, 2);
}

#[test]
fn test_reset_failure_propagates_but_cleanup_swallows_it() {
    let engine = ScriptedEngine::new(Script {
        delete_fails: true,
        ..Script::default()
    });
    let mut sink = provisioned_sink(engine, QueryShape::new(), true);
    sink.insert(&pair(1, 2)).unwrap();

    let err = sink.reset().unwrap_err();
    assert!(matches!(err, SinkError::StorageFatal { .. }));
    assert_eq!(sink.row_count(), 0);

    sink.insert(&pair(3, 4)).unwrap();
    sink.cleanup();
    assert_eq!(sink.row_count(), 0);
}

#[test]
fn test_disk_limit_after_promotion_is_fatal() {
    let config = TempTableConfig::for_testing()
        .with_max_heap_rows(1)
        .with_max_disk_table_size(64);
    let engine = Arc::new(DefaultEngine::new(config).unwrap());
    let mut sink = provisioned_sink(engine.clone(), QueryShape::new(), false);

    let mut result = Ok(InsertOutcome::Inserted);
    for i in 0..16 {
        result = sink.insert(&pair(i, i));
        if result.is_err() {
            break;
        }
    }

    let err = result.unwrap_err();
    assert!(matches!(
        err,
        SinkError::StorageFatal {
            source: HandlerError::NotSupported(_),
            ..
        }
    ));
    assert_eq!(engine.stats().promotions, 1);
}
