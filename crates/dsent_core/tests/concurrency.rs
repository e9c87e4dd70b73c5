//! Concurrent updates of the same key are serialized by the store.

use dsent_core::{EntityError, EntitySession, UpdateOutcome};
use dsent_store::{Context, MemoryStore, StoreConfig};
use dsent_testkit::prelude::*;
use std::sync::{Arc, Barrier};
use std::thread;

#[test]
fn concurrent_updates_of_one_key_conflict() {
    init_test_logging();
    let store = MemoryStore::new();
    let records: EntitySession<ExampleRecord, _> = session_over(&store, EXAMPLE_KIND);
    records
        .put(&Context::background(), &mut ExampleRecord::new(1, "start"))
        .unwrap();

    // Both writers read before either commits
    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = ["left", "right"]
        .into_iter()
        .map(|writer| {
            let records = records.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let mut record = ExampleRecord::with_id(1);
                let mut waited = false;
                records.update(&Context::background(), &mut record, |r: &mut ExampleRecord| {
                    if !waited {
                        barrier.wait();
                        waited = true;
                    }
                    r.data = writer.to_string();
                    Ok(())
                })
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let updated = results
        .iter()
        .filter(|r| matches!(r, Ok(UpdateOutcome::Updated)))
        .count();
    let conflicted = results
        .iter()
        .filter(|r| matches!(r, Err(EntityError::ConcurrentTransaction)))
        .count();
    assert_eq!((updated, conflicted), (1, 1), "results: {results:?}");
    assert!(results.iter().filter_map(|r| r.as_ref().err()).all(EntityError::is_retryable));

    let mut stored = ExampleRecord::with_id(1);
    records.get(&Context::background(), &mut stored).unwrap();
    assert!(stored.data == "left" || stored.data == "right");
}

#[test]
fn retrying_store_lets_both_writers_land() {
    let store = MemoryStore::with_config(StoreConfig::new().default_max_attempts(5));
    let records: EntitySession<NamedChild, _> = session_over(&store, CHILD_KIND);
    records
        .put(&Context::background(), &mut NamedChild::new("p", "counter", 0))
        .unwrap();

    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = (0..2)
        .map(|_| {
            let records = records.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let mut waited = false;
                records.update(
                    &Context::background(),
                    &mut NamedChild::new("p", "counter", 0),
                    |c: &mut NamedChild| {
                        if !waited {
                            barrier.wait();
                            waited = true;
                        }
                        c.value += 1;
                        Ok(())
                    },
                )
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap().unwrap(), UpdateOutcome::Updated);
    }

    let mut stored = NamedChild::new("p", "counter", 0);
    records.get(&Context::background(), &mut stored).unwrap();
    assert_eq!(stored.value, 2);
}

#[test]
fn disjoint_keys_do_not_conflict() {
    let store = MemoryStore::new();
    let records: EntitySession<ExampleRecord, _> = session_over(&store, EXAMPLE_KIND);
    let ctx = Context::background();
    let mut seed = vec![ExampleRecord::new(1, "a"), ExampleRecord::new(2, "b")];
    records.batch_put(&ctx, &mut seed).unwrap();

    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = [1i64, 2]
        .into_iter()
        .map(|id| {
            let records = records.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let mut waited = false;
                let mut record = ExampleRecord::with_id(id);
                records.update(&Context::background(), &mut record, |r: &mut ExampleRecord| {
                    if !waited {
                        barrier.wait();
                        waited = true;
                    }
                    r.data.push('!');
                    Ok(())
                })
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap().is_ok());
    }
}
