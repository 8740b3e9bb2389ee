//! Record storage.
//!
//! A store is an append-only collection of records. Readers never see the
//! live collection, only a snapshot cloned under the store's lock, so an
//! aggregation cannot observe a half-finished append.

mod json_file;
mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

use crate::analysis;
use crate::error::StoreError;
use crate::models::{AgeGroup, Distribution, Gender, Record, Statistics};

/// Capability set shared by every storage backend.
///
/// Only `append` and `snapshot` are required. The distribution methods
/// compute from one snapshot with the backend-agnostic aggregator; a backend
/// that can group natively may override them.
#[allow(dead_code)] // Per-dimension queries are part of the backend contract
pub trait RecordStore: Send + Sync {
    /// Append one record to the collection.
    fn append(&self, record: Record) -> Result<(), StoreError>;

    /// A stable copy of the whole collection, in insertion order.
    fn snapshot(&self) -> Result<Vec<Record>, StoreError>;

    /// Short human-readable description of where records live.
    fn describe(&self) -> String;

    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.snapshot()?.len())
    }

    fn gender_distribution(&self) -> Result<Distribution<Gender>, StoreError> {
        Ok(analysis::gender_distribution(&self.snapshot()?))
    }

    fn age_group_distribution(&self) -> Result<Distribution<AgeGroup>, StoreError> {
        Ok(analysis::age_group_distribution(&self.snapshot()?))
    }

    fn height_distribution(&self) -> Result<Distribution<i32>, StoreError> {
        Ok(analysis::height_distribution(&self.snapshot()?))
    }

    fn postal_code_distribution(&self) -> Result<Distribution<String>, StoreError> {
        Ok(analysis::postal_code_distribution(&self.snapshot()?))
    }

    /// All four distributions from a single snapshot.
    fn statistics(&self) -> Result<Statistics, StoreError> {
        Ok(analysis::statistics(&self.snapshot()?))
    }
}
