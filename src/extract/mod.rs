//! Field extraction from raw OCR text.
//!
//! Card layouts are not reliably segmented, so every field is found by a
//! single regex scan over the whole text and only labelled substrings are
//! trusted. Each field falls back to its default on its own; a bad height
//! never affects the gender or postal code.

use crate::models::{
    AgeGroup, Gender, Record, DEFAULT_AGE, DEFAULT_HEIGHT_CM, UNKNOWN_POSTAL_CODE,
};
use chrono::{Datelike, Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::RangeInclusive;
use tracing::debug;

/// Heights accepted while extracting from card text.
pub const HEIGHT_RANGE_CM: RangeInclusive<i32> = 100..=250;

static GENDER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[MF]\b").unwrap());

static DOB_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"DOB:\s*(\d{4})-(\d{2})-(\d{2})").unwrap());

static HEIGHT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"Height:\s*(\d{3})\s*cm").unwrap());

static POSTAL_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Z][0-9][A-Z] ?[0-9][A-Z][0-9]").unwrap());

static POSTAL_CODE_EXACT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z][0-9][A-Z] ?[0-9][A-Z][0-9]$").unwrap());

/// Parse card text into a fully populated record, using today's local date
/// for the age calculation.
pub fn parse(text: &str) -> Record {
    parse_at(text, Local::now().date_naive())
}

/// Parse card text, computing age as of `today`.
pub fn parse_at(text: &str, today: NaiveDate) -> Record {
    let gender = extract_gender(text);
    let age = extract_age(text, today).unwrap_or_else(|| {
        debug!("No usable date of birth, defaulting age to {}", DEFAULT_AGE);
        DEFAULT_AGE
    });
    let height_cm = extract_height(text).unwrap_or_else(|| {
        debug!("No usable height, defaulting to {} cm", DEFAULT_HEIGHT_CM);
        DEFAULT_HEIGHT_CM
    });
    let postal_code = extract_postal_code(text).unwrap_or_else(|| {
        debug!("No postal code found");
        UNKNOWN_POSTAL_CODE.to_string()
    });

    Record::new(gender, age, height_cm, postal_code)
}

/// Bucket an age into its life-stage group.
#[allow(dead_code)] // Entry point for ages supplied directly by upstream callers
pub fn classify_age_group(age: i32) -> AgeGroup {
    AgeGroup::from_age(age)
}

/// Bucket a manually entered age. Anything that is not an integer lands in
/// the default group.
#[allow(dead_code)] // Manual-entry validation for upstream callers
pub fn classify_age_group_text(raw: &str) -> AgeGroup {
    match raw.trim().parse::<i32>() {
        Ok(age) => classify_age_group(age),
        Err(_) => AgeGroup::default(),
    }
}

/// Whether `code` is exactly a Canadian-style postal code (`A1A 1A1`, the
/// space being optional). Surrounding whitespace is not accepted.
#[allow(dead_code)] // Manual-entry validation for upstream callers
pub fn validate_postal_code(code: &str) -> bool {
    POSTAL_CODE_EXACT_RE.is_match(code)
}

/// Whether a manually entered height is plausible. The upper bound is
/// exclusive here, unlike [`HEIGHT_RANGE_CM`].
#[allow(dead_code)] // Manual-entry validation for upstream callers
pub fn validate_height(height_cm: i32) -> bool {
    (100..250).contains(&height_cm)
}

fn extract_gender(text: &str) -> Gender {
    GENDER_RE
        .find(text)
        .map(|m| Gender::from(m.as_str()))
        .unwrap_or(Gender::Unknown)
}

fn extract_age(text: &str, today: NaiveDate) -> Option<i32> {
    let caps = DOB_RE.captures(text)?;

    // `\d` also matches non-ASCII digits, which fail to parse here.
    let year: i32 = caps[1].parse().ok()?;
    if year < 1 {
        debug!("Year {} of birth is out of range", year);
        return None;
    }
    let month: u32 = caps[2].parse().ok()?;
    let day: u32 = caps[3].parse().ok()?;
    let dob = NaiveDate::from_ymd_opt(year, month, day)?;

    if dob > today {
        debug!("Date of birth {} is in the future", dob);
        return None;
    }

    Some(age_on(dob, today))
}

/// Completed years between `dob` and `today`. The year only counts once the
/// birthday itself has been reached.
fn age_on(dob: NaiveDate, today: NaiveDate) -> i32 {
    let before_birthday = (today.month(), today.day()) < (dob.month(), dob.day());
    today.year() - dob.year() - i32::from(before_birthday)
}

fn extract_height(text: &str) -> Option<i32> {
    let caps = HEIGHT_RE.captures(text)?;
    let height: i32 = caps[1].parse().ok()?;

    if HEIGHT_RANGE_CM.contains(&height) {
        Some(height)
    } else {
        debug!("Height {} cm outside plausible range", height);
        None
    }
}

fn extract_postal_code(text: &str) -> Option<String> {
    POSTAL_CODE_RE.find(text).map(|m| m.as_str().to_string())
}
