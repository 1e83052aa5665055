//! Historical corrections: replace and rename.

use crate::common::*;
use eventkeel::{AggregateId, Event, EventStoreError, EventType, StorageError};
use std::sync::Arc;

#[test]
fn test_replace_touches_only_target_slot() {
    let es = event_store();
    let a = AggregateId::new();
    let b = AggregateId::new();
    es.append(&ctx(), &deposits(a, 1, 3), 0).unwrap();
    es.append(&ctx(), &deposits(b, 1, 2), 0).unwrap();
    let a_before = es.load_aggregate(&ctx(), a).unwrap();
    let b_before = es.load_aggregate(&ctx(), b).unwrap();

    let corrected = Event::new("Withdrawn", Withdrawn { amount: 7 }, ts(99), AGGREGATE_TYPE, a, 2)
        .with_metadata("corrected_by", "ops");
    es.replace(&ctx(), &corrected).unwrap();

    let a_after = es.load_aggregate(&ctx(), a).unwrap();
    assert_eq!(versions(&a_after), vec![1, 2, 3]);
    assert_eq!(a_after[0], a_before[0]);
    assert_eq!(a_after[2], a_before[2]);
    assert_eq!(a_after[1], corrected);
    assert_eq!(a_after[1].data_as::<Withdrawn>(), Some(&Withdrawn { amount: 7 }));
    assert_eq!(a_after[1].timestamp, ts(99));

    assert_eq!(es.load_aggregate(&ctx(), b).unwrap(), b_before);
}

#[test]
fn test_replace_errors() {
    let es = event_store();
    let id = AggregateId::new();

    let err = es.replace(&ctx(), &deposit(id, 1, 1)).unwrap_err();
    assert!(matches!(err, EventStoreError::AggregateNotFound { aggregate_id, .. } if aggregate_id == id));

    es.append(&ctx(), &deposits(id, 1, 1), 0).unwrap();
    let err = es.replace(&ctx(), &deposit(id, 2, 1)).unwrap_err();
    assert!(matches!(err, EventStoreError::MissingEvent { version: 2, .. }));

    // Replace never creates a record
    assert_eq!(versions(&es.load_aggregate(&ctx(), id).unwrap()), vec![1]);
}

#[test]
fn test_rename_across_aggregates() {
    let es = event_store();
    let a = AggregateId::new();
    let b = AggregateId::new();
    es.append(&ctx(), &deposits(a, 1, 2), 0).unwrap();
    es.append(&ctx(), &[deposit(b, 1, 1)], 0).unwrap();
    es.append(
        &ctx(),
        &[Event::new("Withdrawn", Withdrawn { amount: 1 }, ts(2), AGGREGATE_TYPE, b, 2)],
        1,
    )
    .unwrap();

    let renamed = es
        .rename_event_type(&ctx(), &EventType::new("Deposited"), &EventType::new("Credited"))
        .unwrap();
    assert_eq!(renamed, 3);

    let b_events = es.load_aggregate(&ctx(), b).unwrap();
    assert_eq!(b_events[0].event_type, "Credited");
    assert_eq!(b_events[1].event_type, "Withdrawn");
    assert_eq!(b_events[1].data_as::<Withdrawn>(), Some(&Withdrawn { amount: 1 }));

    // Payload, timestamp, and version survive the rename
    let a_events = es.load_aggregate(&ctx(), a).unwrap();
    assert_eq!(versions(&a_events), vec![1, 2]);
    assert_eq!(a_events[1].timestamp, ts(2));
    let raw = a_events[1].payload.raw().unwrap().as_object().unwrap();
    assert_eq!(raw["amount"], eventkeel::Value::Int(20));
}

#[test]
fn test_rename_to_same_type_changes_nothing() {
    let es = event_store();
    let id = AggregateId::new();
    es.append(&ctx(), &deposits(id, 1, 3), 0).unwrap();
    let before = es.load_aggregate(&ctx(), id).unwrap();

    let same = EventType::new("Deposited");
    es.rename_event_type(&ctx(), &same, &same).unwrap();
    assert_eq!(es.load_aggregate(&ctx(), id).unwrap(), before);
}

#[test]
fn test_rename_unknown_type_is_noop() {
    let es = event_store();
    let id = AggregateId::new();
    es.append(&ctx(), &deposits(id, 1, 2), 0).unwrap();

    let n = es
        .rename_event_type(&ctx(), &EventType::new("Nope"), &EventType::new("Other"))
        .unwrap();
    assert_eq!(n, 0);
}

#[test]
fn test_rename_aborts_on_concurrent_retype() {
    let store = Arc::new(RetypingStore::new());
    let es = event_store_over(Arc::clone(&store));
    let id = AggregateId::new();
    es.append(&ctx(), &deposits(id, 1, 3), 0).unwrap();

    // The last scanned record is retagged between the scan and its update
    store.retype_next_scan("Reversed");
    let err = es
        .rename_event_type(&ctx(), &EventType::new("Deposited"), &EventType::new("Credited"))
        .unwrap_err();
    assert!(matches!(
        err.storage_error(),
        Some(StorageError::ConditionalCheckFailed { .. })
    ));

    let raced = store.retyped().expect("a record was retyped");
    assert_eq!(raced.partition, id.to_string());

    // Earlier updates stay applied; the raced record keeps the other writer's tag
    for event in es.load_aggregate(&ctx(), id).unwrap() {
        if event.version == raced.sort {
            assert_eq!(event.event_type, "Reversed");
        } else {
            assert_eq!(event.event_type, "Credited");
        }
    }
}
