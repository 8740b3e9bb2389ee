//! Data models for ID card statistics.
//!
//! This module contains the structured record produced for each scanned
//! card and the distribution types computed over the record collection.

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

/// Age used when no date of birth could be read.
pub const DEFAULT_AGE: i32 = 25;

/// Height (cm) used when no plausible height could be read.
pub const DEFAULT_HEIGHT_CM: i32 = 170;

/// Placeholder for a missing or malformed postal code.
pub const UNKNOWN_POSTAL_CODE: &str = "Unknown";

/// Gender marker printed on the card.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
    #[default]
    #[serde(other)]
    Unknown,
}

impl Gender {
    /// Returns the label used in persisted rows and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "M",
            Gender::Female => "F",
            Gender::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Gender {
    fn from(s: &str) -> Self {
        match s {
            "M" => Gender::Male,
            "F" => Gender::Female,
            _ => Gender::Unknown,
        }
    }
}

/// Life-stage bucket derived from age.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AgeGroup {
    #[serde(rename = "18-24")]
    Young,
    #[serde(rename = "25-49")]
    Adult,
    #[serde(rename = "50+")]
    Senior,
}

impl AgeGroup {
    /// The canonical buckets, in reporting order.
    pub const ALL: [AgeGroup; 3] = [AgeGroup::Young, AgeGroup::Adult, AgeGroup::Senior];

    /// Buckets an age. Everything under 25 (including ages below 18) lands
    /// in the youngest group.
    pub fn from_age(age: i32) -> Self {
        if age < 25 {
            AgeGroup::Young
        } else if age < 50 {
            AgeGroup::Adult
        } else {
            AgeGroup::Senior
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgeGroup::Young => "18-24",
            AgeGroup::Adult => "25-49",
            AgeGroup::Senior => "50+",
        }
    }
}

impl Default for AgeGroup {
    fn default() -> Self {
        AgeGroup::from_age(DEFAULT_AGE)
    }
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One normalized identity card.
///
/// Every field is always populated. The age group is not stored; it is
/// derived from `age` whenever it is read or persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredRecord", into = "PersistedRecord")]
pub struct Record {
    pub gender: Gender,
    pub age: i32,
    /// Height in centimetres. Persisted under the `height` key.
    pub height_cm: i32,
    pub postal_code: String,
}

impl Record {
    pub fn new(gender: Gender, age: i32, height_cm: i32, postal_code: impl Into<String>) -> Self {
        Self {
            gender,
            age,
            height_cm,
            postal_code: postal_code.into(),
        }
    }

    pub fn age_group(&self) -> AgeGroup {
        AgeGroup::from_age(self.age)
    }
}

impl Default for Record {
    fn default() -> Self {
        Record::new(
            Gender::Unknown,
            DEFAULT_AGE,
            DEFAULT_HEIGHT_CM,
            UNKNOWN_POSTAL_CODE,
        )
    }
}

/// Row shape written to storage, `age_group` included for readers of the
/// raw file.
#[derive(Debug, Serialize)]
struct PersistedRecord {
    gender: Gender,
    age: i32,
    height: i32,
    postal_code: String,
    age_group: AgeGroup,
}

impl From<Record> for PersistedRecord {
    fn from(record: Record) -> Self {
        Self {
            age_group: record.age_group(),
            gender: record.gender,
            age: record.age,
            height: record.height_cm,
            postal_code: record.postal_code,
        }
    }
}

/// Row shape accepted from storage. Older rows may lack fields or carry a
/// stale `age_group`, which is ignored.
#[derive(Debug, Deserialize)]
struct StoredRecord {
    #[serde(default)]
    gender: Gender,
    #[serde(default = "default_age")]
    age: i32,
    #[serde(default = "default_height")]
    height: i32,
    #[serde(default = "default_postal_code")]
    postal_code: String,
}

fn default_age() -> i32 {
    DEFAULT_AGE
}

fn default_height() -> i32 {
    DEFAULT_HEIGHT_CM
}

fn default_postal_code() -> String {
    UNKNOWN_POSTAL_CODE.to_string()
}

impl From<StoredRecord> for Record {
    fn from(row: StoredRecord) -> Self {
        Record::new(row.gender, row.age, row.height, row.postal_code)
    }
}

/// A bucket and the number of records that fell into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketCount<K> {
    pub bucket: K,
    pub count: usize,
}

/// Ordered bucket -> count mapping for one dimension.
///
/// Iteration order is reporting order: first-seen for observed buckets,
/// unless the producer sorted it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Distribution<K> {
    entries: Vec<BucketCount<K>>,
}

impl<K> Default for Distribution<K> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<K: Eq + Hash + Clone> Distribution<K> {
    /// Counts buckets in first-seen order.
    pub fn tally<I>(buckets: I) -> Self
    where
        I: IntoIterator<Item = K>,
    {
        let mut index: HashMap<K, usize> = HashMap::new();
        let mut entries: Vec<BucketCount<K>> = Vec::new();

        for bucket in buckets {
            match index.get(&bucket) {
                Some(&i) => entries[i].count += 1,
                None => {
                    index.insert(bucket.clone(), entries.len());
                    entries.push(BucketCount { bucket, count: 1 });
                }
            }
        }

        Self { entries }
    }

    #[allow(dead_code)] // Lookup for callers and tests
    pub fn get(&self, bucket: &K) -> Option<usize> {
        self.entries
            .iter()
            .find(|e| &e.bucket == bucket)
            .map(|e| e.count)
    }

    #[allow(dead_code)]
    pub fn buckets(&self) -> Vec<K> {
        self.entries.iter().map(|e| e.bucket.clone()).collect()
    }
}

impl<K> Distribution<K> {
    /// Builds a distribution from explicit entries, kept in the given order.
    pub fn from_entries(entries: Vec<BucketCount<K>>) -> Self {
        Self { entries }
    }

    pub fn total(&self) -> usize {
        self.entries.iter().map(|e| e.count).sum()
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BucketCount<K>> {
        self.entries.iter()
    }

    /// Sorts in place by the given key, keeping relative order of equal keys.
    pub fn sort_by_key<F, T>(&mut self, f: F)
    where
        F: FnMut(&BucketCount<K>) -> T,
        T: Ord,
    {
        self.entries.sort_by_key(f);
    }

    pub fn truncate(&mut self, n: usize) {
        self.entries.truncate(n);
    }
}

impl<K: fmt::Display> Serialize for Distribution<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.bucket.to_string(), &entry.count)?;
        }
        map.end()
    }
}

/// All four distributions computed from one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Statistics {
    pub gender_distribution: Distribution<Gender>,
    pub age_group_distribution: Distribution<AgeGroup>,
    pub height_distribution: Distribution<i32>,
    pub postal_code_distribution: Distribution<String>,
}

impl Statistics {
    /// Number of records the snapshot contained.
    pub fn record_count(&self) -> usize {
        self.gender_distribution.total()
    }
}

/// Metadata attached to a generated statistics report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Where the records came from (file path or "memory").
    pub data_source: String,
    /// Number of records in the snapshot.
    pub record_count: usize,
    /// Records ingested during this run.
    pub ingested: usize,
}

/// A statistics report ready for hand-off to rendering.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub statistics: Statistics,
    /// Postal codes ranked by count, descending.
    pub top_postal_codes: Distribution<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_record() {
        let record = Record::default();
        assert_eq!(record.gender, Gender::Unknown);
        assert_eq!(record.age, 25);
        assert_eq!(record.height_cm, 170);
        assert_eq!(record.postal_code, "Unknown");
        assert_eq!(record.age_group(), AgeGroup::Adult);
    }

    #[test]
    fn test_age_group_follows_age() {
        assert_eq!(Record::new(Gender::Male, 19, 180, "Unknown").age_group(), AgeGroup::Young);
        assert_eq!(Record::new(Gender::Male, 70, 180, "Unknown").age_group(), AgeGroup::Senior);
    }

    #[test]
    fn test_age_group_tracks_age_changes() {
        let mut record = Record::new(Gender::Female, 22, 165, "Unknown");
        assert_eq!(record.age_group(), AgeGroup::Young);

        record.age = 70;
        assert_eq!(record.age_group(), AgeGroup::Senior);
        assert_eq!(serde_json::to_value(&record).unwrap()["age_group"], "50+");
    }

    #[test]
    fn test_record_serializes_persisted_schema() {
        let record = Record::new(Gender::Female, 30, 165, "V6B 1A1");
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["gender"], "F");
        assert_eq!(value["age"], 30);
        assert_eq!(value["height"], 165);
        assert_eq!(value["postal_code"], "V6B 1A1");
        assert_eq!(value["age_group"], "25-49");
        assert!(value.get("height_cm").is_none());
    }

    #[test]
    fn test_legacy_row_without_age_group() {
        let row = r#"{"gender": "F", "age": 60, "height": 170, "postal_code": "V6B 1A1"}"#;
        let record: Record = serde_json::from_str(row).unwrap();
        assert_eq!(record.age_group(), AgeGroup::Senior);
    }

    #[test]
    fn test_stale_age_group_is_recomputed() {
        let row = r#"{"gender": "M", "age": 20, "height": 170, "postal_code": "Unknown", "age_group": "50+"}"#;
        let record: Record = serde_json::from_str(row).unwrap();
        assert_eq!(record.age_group(), AgeGroup::Young);
    }

    #[test]
    fn test_unrecognized_gender_deserializes_unknown() {
        let row = r#"{"gender": "X", "age": 40}"#;
        let record: Record = serde_json::from_str(row).unwrap();
        assert_eq!(record.gender, Gender::Unknown);
        assert_eq!(record.height_cm, 170);
        assert_eq!(record.postal_code, "Unknown");
    }

    #[test]
    fn test_tally_keeps_first_seen_order() {
        let dist = Distribution::tally(vec!["b", "a", "b", "c"]);
        assert_eq!(dist.buckets(), vec!["b", "a", "c"]);
        assert_eq!(dist.get(&"b"), Some(2));
        assert_eq!(dist.get(&"z"), None);
        assert_eq!(dist.total(), 4);
    }

    #[test]
    fn test_distribution_serializes_as_object() {
        let dist = Distribution::tally(vec![AgeGroup::Senior, AgeGroup::Young]);
        let json = serde_json::to_string(&dist).unwrap();
        assert_eq!(json, r#"{"50+":1,"18-24":1}"#);
    }
}
