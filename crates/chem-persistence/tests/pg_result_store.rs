mod common;

use chem_core::{find_calculation, CalculationRecord, LookupError, ResultStore, UpsertOutcome};
use chrono::{Duration, Utc};
use serde_json::json;

use common::{fresh_key, store};

#[test]
fn upsert_is_idempotent_per_hashkey() {
    let Some(store) = store() else { return };
    let key = fresh_key("upsert");
    let first = CalculationRecord::new(key.clone(), json!({"hashkey": key, "status": "queued"}));
    assert_eq!(store.upsert(first.clone()).unwrap(), UpsertOutcome::Inserted);

    let mut again = CalculationRecord::new(key.clone(), json!({"other": true}));
    again.created = first.created + Duration::seconds(5);
    assert_eq!(store.upsert(again.clone()).unwrap(), UpsertOutcome::AlreadyPresent);

    let stored = store.lookup(&key).unwrap().expect("record");
    assert_eq!(stored.payload, first.payload, "el payload original se conserva");
    assert_eq!(stored.created.timestamp_micros(), again.created.timestamp_micros());
}

#[test]
fn touch_refreshes_created_only_for_existing_keys() {
    let Some(store) = store() else { return };
    let key = fresh_key("touch");
    assert!(!store.touch(&key, Utc::now()).unwrap());

    store.upsert(CalculationRecord::new(key.clone(), json!({}))).unwrap();
    let later = Utc::now() + Duration::minutes(1);
    assert!(store.touch(&key, later).unwrap());
    let stored = store.lookup(&key).unwrap().unwrap();
    assert_eq!(stored.created.timestamp_micros(), later.timestamp_micros());
}

#[test]
fn missing_keys_are_not_found() {
    let Some(store) = store() else { return };
    assert!(store.lookup(&fresh_key("missing")).unwrap().is_none());
    assert_eq!(find_calculation(&store, "404").unwrap_err(), LookupError::NotFound);
}

#[test]
fn concurrent_upserts_insert_once() {
    let Some(store) = store() else { return };
    let store = std::sync::Arc::new(store);
    let key = fresh_key("race");
    let handles: Vec<_> = (0..4).map(|i| {
                                    let store = store.clone();
                                    let key = key.clone();
                                    std::thread::spawn(move || {
                                        store.upsert(CalculationRecord::new(key, json!({"writer": i})))
                                             .unwrap()
                                    })
                                })
                                .collect();
    let inserted = handles.into_iter()
                          .map(|h| h.join().unwrap())
                          .filter(|o| *o == UpsertOutcome::Inserted)
                          .count();
    assert_eq!(inserted, 1);
}
