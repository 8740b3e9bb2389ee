use super::RecordStore;
use crate::error::StoreError;
use crate::models::{Gender, Record, DEFAULT_AGE, DEFAULT_HEIGHT_CM, UNKNOWN_POSTAL_CODE};
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// Store backed by a single JSON array file.
///
/// The whole collection is held in memory and the file is rewritten on every
/// append. Writes go to a sibling temp file that is then renamed over the
/// target, so a crash never leaves a truncated array behind.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    records: Mutex<Vec<Record>>,
}

impl JsonFileStore {
    /// Open the store at `path`, creating its parent directory if needed.
    ///
    /// A missing file is an empty collection. Rows with badly typed fields
    /// keep what can be read. A file that cannot be read or is not a JSON
    /// array is treated as empty. In both cases the file is first copied
    /// aside so the next append cannot destroy it.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let records = load_records(&path);
        info!(
            "Opened record store at {} ({} records)",
            path.display(),
            records.len()
        );

        Ok(Self {
            path,
            records: Mutex::new(records),
        })
    }

    fn save(&self, records: &[Record]) -> Result<(), StoreError> {
        let content = serde_json::to_string(records)?;
        let tmp_path = self.path.with_extension("json.tmp");

        let result = fs::write(&tmp_path, content)
            .and_then(|_| fs::rename(&tmp_path, &self.path));
        if let Err(source) = result {
            let _ = fs::remove_file(&tmp_path);
            return Err(StoreError::Write {
                path: self.path.clone(),
                source,
            });
        }

        debug!("Saved {} records to {}", records.len(), self.path.display());
        Ok(())
    }
}

fn load_records(path: &Path) -> Vec<Record> {
    if !path.exists() {
        return Vec::new();
    }

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!("Failed to read {}: {}; starting empty", path.display(), e);
            set_aside(path);
            return Vec::new();
        }
    };

    let rows: Vec<Value> = match serde_json::from_str(&content) {
        Ok(rows) => rows,
        Err(e) => {
            warn!("Failed to parse {}: {}; starting empty", path.display(), e);
            set_aside(path);
            return Vec::new();
        }
    };

    let mut records = Vec::with_capacity(rows.len());
    let mut repaired = 0;
    for (i, row) in rows.iter().enumerate() {
        match Record::deserialize(row) {
            Ok(record) => records.push(record),
            Err(e) => {
                warn!("Row {} of {}: {}; keeping readable fields", i, path.display(), e);
                records.push(salvage_row(row));
                repaired += 1;
            }
        }
    }

    if repaired > 0 {
        set_aside(path);
    }

    records
}

/// Rebuild a record from the fields of `row` that have the expected type.
fn salvage_row(row: &Value) -> Record {
    let int_field = |key: &str| {
        row.get(key)
            .and_then(Value::as_i64)
            .and_then(|n| i32::try_from(n).ok())
    };

    Record::new(
        row.get("gender")
            .and_then(Value::as_str)
            .map(Gender::from)
            .unwrap_or_default(),
        int_field("age").unwrap_or(DEFAULT_AGE),
        int_field("height").unwrap_or(DEFAULT_HEIGHT_CM),
        row.get("postal_code")
            .and_then(Value::as_str)
            .unwrap_or(UNKNOWN_POSTAL_CODE),
    )
}

/// Copy the data file to a timestamped sibling before it gets rewritten.
fn set_aside(path: &Path) {
    let mut name = path.as_os_str().to_owned();
    name.push(format!(".corrupt-{}", Utc::now().format("%Y%m%dT%H%M%S%.3f")));
    let backup = PathBuf::from(name);

    match fs::copy(path, &backup) {
        Ok(_) => warn!("Copied {} to {}", path.display(), backup.display()),
        Err(e) => warn!("Failed to copy {} aside: {}", path.display(), e),
    }
}

impl RecordStore for JsonFileStore {
    fn append(&self, record: Record) -> Result<(), StoreError> {
        let mut records = self.records.lock().map_err(|_| StoreError::Poisoned)?;
        records.push(record);

        if let Err(e) = self.save(&records) {
            records.pop();
            return Err(e);
        }

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
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AgeGroup, Gender};
    use tempfile::TempDir;

    fn sample_record() -> Record {
        Record::new(Gender::Female, 25, 170, "V6B 1A1")
    }

    fn backups(dir: &Path) -> Vec<PathBuf> {
        fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|p| p.to_string_lossy().contains(".json.corrupt-"))
            .collect()
    }

    #[test]
    fn test_open_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::open(dir.path().join("data").join("id_cards.json")).unwrap();

        assert_eq!(store.len().unwrap(), 0);
        assert!(dir.path().join("data").is_dir());
    }

    #[test]
    fn test_append_persists_across_instances() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("id_cards.json");

        let store = JsonFileStore::open(&path).unwrap();
        store.append(sample_record()).unwrap();
        drop(store);

        let reopened = JsonFileStore::open(&path).unwrap();
        let records = reopened.snapshot().unwrap();
        assert_eq!(records, vec![sample_record()]);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_file_is_json_array_of_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("id_cards.json");

        let store = JsonFileStore::open(&path).unwrap();
        store.append(sample_record()).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let rows = value.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["height"], 170);
        assert_eq!(rows[0]["age_group"], "25-49");
    }

    #[test]
    fn test_corrupt_file_opens_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("id_cards.json");
        fs::write(&path, "{ not json").unwrap();

        let store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.len().unwrap(), 0);

        let saved = backups(dir.path());
        assert_eq!(saved.len(), 1);
        assert_eq!(fs::read_to_string(&saved[0]).unwrap(), "{ not json");

        store.append(sample_record()).unwrap();
        assert_eq!(JsonFileStore::open(&path).unwrap().len().unwrap(), 1);
    }

    #[test]
    fn test_badly_typed_row_keeps_every_record() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("id_cards.json");
        fs::write(
            &path,
            r#"[{"gender": "F", "age": 25, "height": 170, "postal_code": "V6B 1A1"},
                {"gender": null, "age": "old", "height": 180, "postal_code": "T2X 1V4"},
                {"gender": "M", "age": 61, "height": 175, "postal_code": "Unknown"}]"#,
        )
        .unwrap();

        let store = JsonFileStore::open(&path).unwrap();
        let records = store.snapshot().unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0], sample_record());
        assert_eq!(records[1], Record::new(Gender::Unknown, 25, 180, "T2X 1V4"));
        assert_eq!(records[2].age, 61);
        assert_eq!(backups(dir.path()).len(), 1);

        store.append(sample_record()).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 4);
    }

    #[test]
    fn test_loads_legacy_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("id_cards.json");
        fs::write(
            &path,
            r#"[{"gender": "F", "age": 25, "height": 170, "postal_code": "V6B 1A1"},
                {"gender": "M", "age": 61, "height": 180, "postal_code": "Unknown"}]"#,
        )
        .unwrap();

        let store = JsonFileStore::open(&path).unwrap();
        let stats = store.statistics().unwrap();
        assert!(backups(dir.path()).is_empty());

        assert_eq!(stats.record_count(), 2);
        assert_eq!(stats.age_group_distribution.get(&AgeGroup::Adult), Some(1));
        assert_eq!(stats.age_group_distribution.get(&AgeGroup::Senior), Some(1));
        assert_eq!(stats.gender_distribution.get(&Gender::Female), Some(1));
    }

    #[test]
    fn test_failed_write_rolls_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("id_cards.json");
        let store = JsonFileStore::open(&path).unwrap();

        // A directory where the file should go makes the rename fail.
        fs::create_dir(&path).unwrap();

        assert!(store.append(sample_record()).is_err());
        assert_eq!(store.len().unwrap(), 0);
        assert!(!path.with_extension("json.tmp").exists());
    }
}
