//! Consistent reads and decoding.

use crate::common::*;
use eventkeel::{codec, AggregateId, Event, EventRegistry, EventStoreBuilder, TableStore, Value};
use std::sync::Arc;

#[test]
fn test_load_returns_versions_in_order() {
    let es = event_store();
    let id = AggregateId::new();
    es.append(&ctx(), &deposits(id, 1, 4), 0).unwrap();
    es.append(&ctx(), &deposits(id, 5, 1), 4).unwrap();

    let loaded = es.load_aggregate(&ctx(), id).unwrap();
    assert_eq!(versions(&loaded), vec![1, 2, 3, 4, 5]);
    assert_eq!(amounts(&loaded), vec![10, 20, 30, 40, 50]);
    assert!(loaded.iter().all(|e| e.aggregate_id == id));
    assert_eq!(loaded[0].timestamp, ts(1));
}

#[test]
fn test_load_only_returns_own_aggregate() {
    let es = event_store();
    let a = AggregateId::new();
    let b = AggregateId::new();
    es.append(&ctx(), &deposits(a, 1, 2), 0).unwrap();
    es.append(&ctx(), &deposits(b, 1, 3), 0).unwrap();

    assert_eq!(es.load_aggregate(&ctx(), a).unwrap().len(), 2);
    assert_eq!(es.load_aggregate(&ctx(), b).unwrap().len(), 3);
    assert_eq!(es.load_all(&ctx()).unwrap().len(), 5);
}

#[test]
fn test_metadata_round_trips() {
    let es = event_store();
    let id = AggregateId::new();
    let event = deposit(id, 1, 5)
        .with_metadata("user", "ada")
        .with_metadata("attempt", Value::Int(2))
        .with_metadata("tags", Value::Array(vec![Value::from("a"), Value::from("b")]));
    es.append(&ctx(), &[event.clone()], 0).unwrap();

    let loaded = es.load_aggregate(&ctx(), id).unwrap();
    assert_eq!(loaded[0].metadata, event.metadata);
}

#[test]
fn test_unknown_type_survives_other_process() {
    // Writer knows the type, reader does not
    let store = Arc::new(eventkeel::MemoryStore::new());
    let writer = event_store_over(Arc::clone(&store));
    let reader = EventStoreBuilder::new()
        .registry(Arc::new(EventRegistry::new()))
        .open(&ctx(), store)
        .unwrap();

    let id = AggregateId::new();
    writer.append(&ctx(), &deposits(id, 1, 1), 0).unwrap();

    let loaded = reader.load_aggregate(&ctx(), id).unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].event_type, "Deposited");
    assert!(loaded[0].data().is_none());
    let raw = loaded[0].payload.raw().unwrap().as_object().unwrap();
    assert_eq!(raw["amount"], Value::Int(10));

    // Writing the raw payload back keeps it intact for the typed reader
    reader.replace(&ctx(), &loaded[0]).unwrap();
    assert_eq!(amounts(&writer.load_aggregate(&ctx(), id).unwrap()), vec![10]);
}

#[test]
fn test_foreign_record_is_malformed() {
    let es = event_store();
    let id = AggregateId::new();
    let mut item = codec::encode(&deposit(id, 1, 1)).unwrap().into_item().unwrap();
    item.remove(codec::EVENT_TYPE);
    es.store().put_item(&ctx(), es.table_name(), item, None).unwrap();

    let err = es.load_aggregate(&ctx(), id).unwrap_err();
    assert!(matches!(err, eventkeel::EventStoreError::MalformedRecord { .. }));
}

#[test]
fn test_payload_with_special_values() {
    #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
    struct Measured {
        reading: f64,
        raw: Vec<u8>,
        note: Option<String>,
    }

    let registry = Arc::new(EventRegistry::new());
    registry.register::<Measured>("Measured").unwrap();
    let es = EventStoreBuilder::new().registry(registry).ephemeral().unwrap();

    let id = AggregateId::new();
    let payload = Measured {
        reading: 0.1,
        raw: vec![0, 255, 7],
        note: None,
    };
    let event = Event::new("Measured", payload.clone(), ts(0), "Sensor", id, 1);
    es.append(&ctx(), &[event], 0).unwrap();

    let loaded = es.load_aggregate(&ctx(), id).unwrap();
    assert_eq!(loaded[0].data_as::<Measured>(), Some(&payload));
}
