/// Aggregation over the ordered observation sequence.
///
/// Each aggregate is built the same way: accumulate into an index-preserving
/// table in first-seen order, then sort. Sorting is stable, so ties keep the
/// order in which their keys first appeared.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::hash::Hash;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::model::{Observation, ReportError};

// ---------------------------------------------------------------------------
// Aggregate types
// ---------------------------------------------------------------------------

/// Total birds seen for one common name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeciesTotal {
    pub com_name: String,
    pub total: u64,
}

/// Total birds seen on one calendar date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateTotal {
    pub date: NaiveDate,
    pub total: u64,
}

// ---------------------------------------------------------------------------
// Generic helpers
// ---------------------------------------------------------------------------

/// Returns each distinct item once, in the order it first appears.
pub fn distinct_in_order<'a, I>(items: I) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    items.into_iter().filter(|item| seen.insert(*item)).collect()
}

/// Sums values per key, returning keys in first-seen order.
pub fn sum_by_key<K, I>(pairs: I) -> Vec<(K, u64)>
where
    K: Eq + Hash + Clone,
    I: IntoIterator<Item = (K, u64)>,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut totals: Vec<(K, u64)> = Vec::new();

    for (key, value) in pairs {
        match index.get(&key) {
            Some(&i) => totals[i].1 += value,
            None => {
                index.insert(key.clone(), totals.len());
                totals.push((key, value));
            }
        }
    }

    totals
}

// ---------------------------------------------------------------------------
// Observation aggregates
// ---------------------------------------------------------------------------

/// Sum of effective counts over every record.
pub fn total_birds(records: &[Observation]) -> u64 {
    records.iter().map(Observation::effective_count).sum()
}

/// Per-species totals, largest first. Equal totals keep first-seen order.
pub fn species_totals(records: &[Observation]) -> Vec<SpeciesTotal> {
    let mut totals: Vec<SpeciesTotal> = sum_by_key(
        records
            .iter()
            .map(|r| (r.com_name.as_str(), r.effective_count())),
    )
    .into_iter()
    .map(|(com_name, total)| SpeciesTotal {
        com_name: com_name.to_string(),
        total,
    })
    .collect();

    totals.sort_by(|a, b| b.total.cmp(&a.total));
    totals
}

/// Per-date totals in ascending date order.
///
/// Fails on the first record whose `obsDt` cannot be normalized.
pub fn date_totals(records: &[Observation]) -> Result<Vec<DateTotal>, ReportError> {
    let mut by_date: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for record in records {
        let date = parse_observation_date(&record.obs_dt)?;
        *by_date.entry(date).or_default() += record.effective_count();
    }

    Ok(by_date
        .into_iter()
        .map(|(date, total)| DateTotal { date, total })
        .collect())
}

/// Σ obsReviewed / Σ obsValid.
///
/// Returns `ArithmeticError` when no record is marked valid.
pub fn review_ratio(records: &[Observation]) -> Result<f64, ReportError> {
    let reviewed: u64 = records.iter().map(|r| u64::from(r.obs_reviewed)).sum();
    let valid: u64 = records.iter().map(|r| u64::from(r.obs_valid)).sum();

    if valid == 0 {
        return Err(ReportError::ArithmeticError(format!(
            "review ratio undefined: {} reviewed over 0 valid observations",
            reviewed
        )));
    }

    Ok(reviewed as f64 / valid as f64)
}

/// Every record whose effective count equals the collection maximum.
pub fn highest_count_records(records: &[Observation]) -> Vec<&Observation> {
    let Some(max) = records.iter().map(Observation::effective_count).max() else {
        return Vec::new();
    };

    records
        .iter()
        .filter(|r| r.effective_count() == max)
        .collect()
}

// ---------------------------------------------------------------------------
// Date normalization
// ---------------------------------------------------------------------------

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

/// Normalizes an eBird `obsDt` value into a calendar date.
///
/// eBird omits the time when the checklist has none, so a single response
/// mixes `2024-05-01 07:30` with `2024-05-01`. RFC 3339 values keep the date
/// in their own offset.
pub fn parse_observation_date(raw: &str) -> Result<NaiveDate, ReportError> {
    let value = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.date_naive());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|dt| dt.date())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        })
        .ok_or_else(|| ReportError::InvalidDate(raw.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
