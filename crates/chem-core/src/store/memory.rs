use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::{ResultStore, UpsertOutcome};
use crate::errors::StoreError;
use crate::model::CalculationRecord;

/// Store en memoria para tests y despliegues de un solo proceso.
#[derive(Debug, Default)]
pub struct InMemoryResultStore {
    inner: DashMap<String, CalculationRecord>,
}

impl InMemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl ResultStore for InMemoryResultStore {
    fn lookup(&self, hashkey: &str) -> Result<Option<CalculationRecord>, StoreError> {
        Ok(self.inner.get(hashkey).map(|r| r.value().clone()))
    }

    fn touch(&self, hashkey: &str, at: DateTime<Utc>) -> Result<bool, StoreError> {
        match self.inner.get_mut(hashkey) {
            Some(mut record) => {
                record.created = at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn upsert(&self, record: CalculationRecord) -> Result<UpsertOutcome, StoreError> {
        match self.inner.entry(record.hashkey.clone()) {
            Entry::Occupied(mut existing) => {
                existing.get_mut().created = record.created;
                Ok(UpsertOutcome::AlreadyPresent)
            }
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(UpsertOutcome::Inserted)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    #[test]
    fn upsert_is_idempotent_per_key() {
        let store = InMemoryResultStore::new();
        let first = CalculationRecord::new("k1", json!({"a": 1}));
        assert_eq!(store.upsert(first.clone()).unwrap(), UpsertOutcome::Inserted);
        let mut again = CalculationRecord::new("k1", json!({"a": 2}));
        again.created = first.created + Duration::seconds(5);
        assert_eq!(store.upsert(again.clone()).unwrap(), UpsertOutcome::AlreadyPresent);
        let stored = store.lookup("k1").unwrap().unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(stored.payload, json!({"a": 1}));
        assert_eq!(stored.created, again.created);
    }

    #[test]
    fn touch_only_updates_existing_records() {
        let store = InMemoryResultStore::new();
        assert!(!store.touch("missing", Utc::now()).unwrap());
        store.upsert(CalculationRecord::new("k", json!({}))).unwrap();
        let later = Utc::now() + Duration::minutes(1);
        assert!(store.touch("k", later).unwrap());
        assert_eq!(store.lookup("k").unwrap().unwrap().created, later);
    }
}
