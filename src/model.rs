/// Core data types for the bird observation report service.
///
/// This module defines the shared domain model imported by all other modules:
/// the observation record as eBird returns it, the region-scoped collection
/// the report engine consumes, and the crate-wide error type.

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Observation types
// ---------------------------------------------------------------------------

/// A single sighting event.
///
/// Corresponds to one object in the JSON array returned by the eBird
/// `data/obs/{regionCode}/recent/notable` endpoint. Unknown fields in the
/// response are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub species_code: String,
    pub com_name: String,
    #[serde(default)]
    pub sci_name: Option<String>,
    pub loc_name: String,
    pub lat: f64,
    pub lng: f64,
    pub obs_dt: String, // e.g. "2024-05-01 07:30" or "2024-05-01"
    #[serde(default)]
    pub how_many: Option<u32>, // absent = present but uncounted
    #[serde(default, deserialize_with = "flag_or_count")]
    pub obs_reviewed: u32,
    #[serde(default, deserialize_with = "flag_or_count")]
    pub obs_valid: u32,
    #[serde(default)]
    pub subnational1_code: Option<String>,
    #[serde(default)]
    pub subnational2_code: Option<String>,
}

impl Observation {
    /// The number of birds this record contributes to every total.
    ///
    /// A missing `howMany` means the observer saw the species but did not
    /// count it; it contributes exactly one bird.
    pub fn effective_count(&self) -> u64 {
        self.how_many.map(u64::from).unwrap_or(1)
    }

    /// The most specific region tag carried by the record, if any.
    pub fn region_tag(&self) -> Option<&str> {
        self.subnational2_code
            .as_deref()
            .or(self.subnational1_code.as_deref())
    }

    /// Returns `true` if the record's region tag places it inside
    /// `region_code`, or if the record carries no region tag at all.
    pub fn belongs_to(&self, region_code: &str) -> bool {
        let Some(tag) = self.region_tag() else {
            return true;
        };

        // A state-only tag cannot rule out membership in one of its counties.
        tag == region_code
            || tag.starts_with(&format!("{}-", region_code))
            || region_code.starts_with(&format!("{}-", tag))
    }
}

/// eBird reports review flags as booleans; older exports use 0/1 integers.
#[derive(Deserialize)]
#[serde(untagged)]
enum FlagOrCount {
    Flag(bool),
    Count(u32),
}

fn flag_or_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<FlagOrCount>::deserialize(deserializer)? {
        Some(FlagOrCount::Flag(true)) => 1,
        Some(FlagOrCount::Flag(false)) | None => 0,
        Some(FlagOrCount::Count(n)) => n,
    })
}

// ---------------------------------------------------------------------------
// Collection
// ---------------------------------------------------------------------------

/// All observations for one region over one lookback window.
///
/// Immutable once built; aggregation produces derived values and never
/// rewrites records.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationCollection {
    region_code: String,
    back_days: u32,
    records: Vec<Observation>,
}

impl ObservationCollection {
    /// Builds a collection, rejecting any record tagged with another region.
    pub fn new(
        region_code: &str,
        back_days: u32,
        records: Vec<Observation>,
    ) -> Result<Self, ReportError> {
        if let Some(stray) = records.iter().find(|r| !r.belongs_to(region_code)) {
            return Err(ReportError::RegionMismatch {
                expected: region_code.to_string(),
                found: stray.region_tag().unwrap_or_default().to_string(),
            });
        }

        Ok(Self {
            region_code: region_code.to_string(),
            back_days,
            records,
        })
    }

    /// Decodes the raw JSON document (as fetched or cached) into a collection.
    pub fn from_json(
        region_code: &str,
        back_days: u32,
        document: &serde_json::Value,
    ) -> Result<Self, ReportError> {
        let records: Vec<Observation> = serde_json::from_value(document.clone())?;
        Self::new(region_code, back_days, records)
    }

    pub fn region_code(&self) -> &str {
        &self.region_code
    }

    pub fn back_days(&self) -> u32 {
        self.back_days
    }

    pub fn records(&self) -> &[Observation] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise while fetching, caching, summarising or plotting
/// observations.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Non-2xx HTTP response from the eBird API.
    #[error("HTTP error: {status}: {body}")]
    Transport { status: u16, body: String },

    /// The request never produced a response (DNS, TLS, timeout, body read).
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// A JSON, GeoJSON or TOML document could not be decoded.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Spatial rendering requested for a region with no registry entry.
    #[error("Unsupported region: {0}")]
    UnsupportedRegion(String),

    /// Review ratio requested while no observation is marked valid.
    #[error("Arithmetic error: {0}")]
    ArithmeticError(String),

    /// Missing credential, boundary dataset or invalid setting.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A record is tagged with a region outside the collection's region.
    #[error("Record region {found} does not belong to {expected}")]
    RegionMismatch { expected: String, found: String },

    /// `obsDt` did not match any accepted date/time layout.
    #[error("Invalid observation date: {0}")]
    InvalidDate(String),

    #[error("Cache error: {0}")]
    Cache(#[from] postgres::Error),

    #[error("Render error: {0}")]
    Render(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for ReportError {
    fn from(err: serde_json::Error) -> Self {
        ReportError::Parse(err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
