//! Record aggregation and statistics.
//!
//! This module computes per-dimension distributions over a snapshot of
//! records. Nothing here is stateful: every call scans the slice it is
//! given, so callers control consistency by what snapshot they pass in.

use crate::models::{AgeGroup, BucketCount, Distribution, Gender, Record, Statistics};
use std::cmp::Reverse;

/// Count records per gender. Only genders that occur are reported.
pub fn gender_distribution(records: &[Record]) -> Distribution<Gender> {
    Distribution::tally(records.iter().map(|r| r.gender))
}

/// Count records per age group. All three canonical buckets are always
/// present, in canonical order.
pub fn age_group_distribution(records: &[Record]) -> Distribution<AgeGroup> {
    let mut counts = [0usize; AgeGroup::ALL.len()];

    for record in records {
        counts[record.age_group() as usize] += 1;
    }

    Distribution::from_entries(
        AgeGroup::ALL
            .iter()
            .zip(counts)
            .map(|(&bucket, count)| BucketCount { bucket, count })
            .collect(),
    )
}

/// Count records per height, ascending by height.
pub fn height_distribution(records: &[Record]) -> Distribution<i32> {
    let mut dist = Distribution::tally(records.iter().map(|r| r.height_cm));
    dist.sort_by_key(|e| e.bucket);
    dist
}

/// Count records per postal code, in first-seen order.
pub fn postal_code_distribution(records: &[Record]) -> Distribution<String> {
    Distribution::tally(records.iter().map(|r| r.postal_code.clone()))
}

/// Compute all four distributions from the same snapshot.
pub fn statistics(records: &[Record]) -> Statistics {
    Statistics {
        gender_distribution: gender_distribution(records),
        age_group_distribution: age_group_distribution(records),
        height_distribution: height_distribution(records),
        postal_code_distribution: postal_code_distribution(records),
    }
}

/// Postal codes ranked by count, highest first. Equal counts keep their
/// first-seen order. `limit` of `None` keeps every code.
pub fn ranked_postal_codes(
    distribution: &Distribution<String>,
    limit: Option<usize>,
) -> Distribution<String> {
    let mut ranked = distribution.clone();
    ranked.sort_by_key(|e| Reverse(e.count));

    if let Some(n) = limit {
        ranked.truncate(n);
    }

    ranked
}
