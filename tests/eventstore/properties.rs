//! Property tests: contiguity and partial-failure visibility.

use crate::common::*;
use eventkeel::AggregateId;
use proptest::prelude::*;
use std::sync::Arc;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Appending 1..n in any split of batches reads back exactly 1..n.
    #[test]
    fn prop_contiguous_after_batches(sizes in prop::collection::vec(1u64..5, 1..8)) {
        let es = event_store();
        let id = AggregateId::new();

        let mut current = 0;
        for size in &sizes {
            es.append(&ctx(), &deposits(id, current + 1, *size), current).unwrap();
            current += size;
        }

        let loaded = es.load_aggregate(&ctx(), id).unwrap();
        prop_assert_eq!(versions(&loaded), (1..=current).collect::<Vec<_>>());
        prop_assert_eq!(
            amounts(&loaded),
            (1..=current).map(|v| v as i64 * 10).collect::<Vec<_>>()
        );
    }

    /// A store failure at batch event j leaves versions 1..v+j-1.
    #[test]
    fn prop_partial_failure_prefix(v in 0u64..5, k in 1u64..6, j_seed in 0u64..100) {
        let j = 1 + j_seed % k;
        let store = Arc::new(FaultyStore::new());
        let es = event_store_over(Arc::clone(&store));
        let id = AggregateId::new();

        if v > 0 {
            es.append(&ctx(), &deposits(id, 1, v), 0).unwrap();
        }

        store.fail_after((j - 1) as usize);
        let result = es.append(&ctx(), &deposits(id, v + 1, k), v);
        prop_assert!(result.is_err());

        let loaded = es.load_aggregate(&ctx(), id).unwrap();
        prop_assert_eq!(versions(&loaded), (1..v + j).collect::<Vec<_>>());
    }
}
