//! Racing writers: the store's conditional put is the only arbiter.

use crate::common::*;
use eventkeel::{AggregateId, EventStoreError};
use std::sync::{Arc, Barrier};
use std::thread;

#[test]
fn test_racing_appends_single_winner() {
    const WRITERS: usize = 12;
    let es = event_store();
    let id = AggregateId::new();
    es.append(&ctx(), &deposits(id, 1, 1), 0).unwrap();

    let barrier = Arc::new(Barrier::new(WRITERS));
    let handles: Vec<_> = (0..WRITERS)
        .map(|i| {
            let es = es.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                es.append(&ctx(), &[deposit(id, 2, i as i64)], 1)
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let winners: Vec<_> = results.iter().filter(|r| r.is_ok()).collect();
    assert_eq!(winners.len(), 1);
    for result in &results {
        if let Err(err) = result {
            assert!(
                matches!(err, EventStoreError::ConcurrencyConflict { version: 2, .. }),
                "unexpected error {:?}",
                err
            );
        }
    }

    let loaded = es.load_aggregate(&ctx(), id).unwrap();
    assert_eq!(versions(&loaded), vec![1, 2]);
}

#[test]
fn test_racing_batches_never_interleave_versions() {
    const WRITERS: usize = 8;
    const BATCH: u64 = 5;
    let es = event_store();
    let id = AggregateId::new();

    let barrier = Arc::new(Barrier::new(WRITERS));
    let handles: Vec<_> = (0..WRITERS)
        .map(|writer| {
            let es = es.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let batch: Vec<_> = (1..=BATCH)
                    .map(|v| deposit(id, v, (writer as i64) * 100 + v as i64))
                    .collect();
                barrier.wait();
                es.append(&ctx(), &batch, 0)
            })
        })
        .collect();

    for h in handles {
        // Each writer either finishes or stops at a conflict
        if let Err(err) = h.join().unwrap() {
            assert!(err.is_conflict(), "unexpected error {:?}", err);
        }
    }

    // Every slot has exactly one record, and versions stay contiguous
    let loaded = es.load_aggregate(&ctx(), id).unwrap();
    assert_eq!(versions(&loaded), (1..=BATCH).collect::<Vec<_>>());
    assert_eq!(es.load_all(&ctx()).unwrap().len(), BATCH as usize);
}

#[test]
fn test_independent_aggregates_do_not_conflict() {
    const WRITERS: usize = 8;
    let es = event_store();
    let barrier = Arc::new(Barrier::new(WRITERS));

    let handles: Vec<_> = (0..WRITERS)
        .map(|_| {
            let es = es.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let id = AggregateId::new();
                barrier.wait();
                for v in 1..=10 {
                    es.append(&ctx(), &[deposit(id, v, v as i64)], v - 1)?;
                }
                Ok::<_, EventStoreError>(id)
            })
        })
        .collect();

    for h in handles {
        let id = h.join().unwrap().unwrap();
        assert_eq!(es.current_version(&ctx(), id).unwrap(), 10);
    }
    assert_eq!(es.load_all(&ctx()).unwrap().len(), WRITERS * 10);
}
