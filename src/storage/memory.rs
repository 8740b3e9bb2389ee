use super::RecordStore;
use crate::error::StoreError;
use crate::models::Record;
use std::sync::Mutex;

/// In-process store, lost on exit.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<Record>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
    fn append(&self, record: Record) -> Result<(), StoreError> {
        self.records
            .lock()
            .map_err(|_| StoreError::Poisoned)?
            .push(record);
        Ok(())
    }

    fn snapshot(&self) -> Result<Vec<Record>, StoreError> {
        Ok(self
            .records
            .lock()
            .map_err(|_| StoreError::Poisoned)?
            .clone())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AgeGroup, Gender};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_append_and_snapshot() {
        let store = MemoryStore::new();
        store
            .append(Record::new(Gender::Female, 25, 170, "V6B 1A1"))
            .unwrap();

        let snapshot = store.snapshot().unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].postal_code, "V6B 1A1");
    }

    #[test]
    fn test_snapshot_is_detached() {
        let store = MemoryStore::new();
        store.append(Record::default()).unwrap();

        let snapshot = store.snapshot().unwrap();
        store.append(Record::default()).unwrap();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(store.len().unwrap(), 2);
    }

    #[test]
    fn test_provided_distributions() {
        let store = MemoryStore::new();
        store
            .append(Record::new(Gender::Male, 60, 182, "K1A 0B1"))
            .unwrap();
        store
            .append(Record::new(Gender::Female, 20, 158, "K1A 0B1"))
            .unwrap();

        assert_eq!(store.gender_distribution().unwrap().get(&Gender::Male), Some(1));
        assert_eq!(
            store.age_group_distribution().unwrap().get(&AgeGroup::Senior),
            Some(1)
        );
        assert_eq!(store.height_distribution().unwrap().buckets(), vec![158, 182]);
        assert_eq!(
            store
                .postal_code_distribution()
                .unwrap()
                .get(&"K1A 0B1".to_string()),
            Some(2)
        );
    }

    #[test]
    fn test_statistics_stable_without_writes() {
        let store = MemoryStore::new();
        store
            .append(Record::new(Gender::Female, 33, 171, "T2X 1V4"))
            .unwrap();

        assert_eq!(store.statistics().unwrap(), store.statistics().unwrap());
    }

    #[test]
    fn test_concurrent_appends_all_counted() {
        let store = Arc::new(MemoryStore::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for _ in 0..50 {
                        store.append(Record::default()).unwrap();
                        let stats = store.statistics().unwrap();
                        assert_eq!(
                            stats.age_group_distribution.total(),
                            stats.gender_distribution.total()
                        );
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len().unwrap(), 400);
    }
}
