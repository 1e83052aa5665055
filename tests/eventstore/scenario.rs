//! Account lifecycle walk-through.

use crate::common::*;
use eventkeel::{AggregateId, Event, EventStoreError, EventType};

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
struct Created {
    name: String,
}

#[test]
fn test_create_conflict_rename() {
    let es = event_store();
    es.registry().register::<Created>("Created").unwrap();
    let a = AggregateId::new();

    let history = vec![
        Event::new("Created", Created { name: "a".into() }, ts(1), AGGREGATE_TYPE, a, 1),
        deposit(a, 2, 20),
        deposit(a, 3, 30),
    ];
    es.append(&ctx(), &history, 0).unwrap();

    let loaded = es.load_aggregate(&ctx(), a).unwrap();
    assert_eq!(loaded, history);
    assert_eq!(versions(&loaded), vec![1, 2, 3]);

    // A writer that last saw version 1 races a write that already landed
    let err = es.append(&ctx(), &[deposit(a, 2, 99)], 1).unwrap_err();
    assert!(matches!(
        err,
        EventStoreError::ConcurrencyConflict { version: 2, expected_version: 1, .. }
    ));
    assert_eq!(es.load_aggregate(&ctx(), a).unwrap(), history);

    es.rename_event_type(&ctx(), &EventType::new("Created"), &EventType::new("Opened"))
        .unwrap();
    let renamed = es.load_aggregate(&ctx(), a).unwrap();
    assert_eq!(renamed[0].event_type, "Opened");
    assert_eq!(renamed[1], history[1]);
    assert_eq!(renamed[2], history[2]);
}
