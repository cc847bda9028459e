/// eBird API 2.0 Client
///
/// Retrieves recent notable bird observations for a region. One blocking
/// request per call; no paging, no retry. The response is returned as the
/// raw JSON document so the cache can store exactly what the API sent.
///
/// API Documentation: https://documenter.getpostman.com/view/664302/S1ENwy59

use std::time::Duration;

use tracing::{debug, info};

use crate::config::validate_back_days;
use crate::logging::DataSource;
use crate::model::ReportError;

pub const EBIRD_BASE_URL: &str = "https://api.ebird.org/v2";

/// Header carrying the user's API token.
pub const TOKEN_HEADER: &str = "x-ebirdapitoken";

// ============================================================================
// URL construction
// ============================================================================

/// Builds the notable-observations URL for a region.
///
/// Query parameters are attached separately by `fetch_recent_notable`.
pub fn build_notable_url(base_url: &str, region_code: &str) -> String {
    format!(
        "{}/data/obs/{}/recent/notable",
        base_url.trim_end_matches('/'),
        region_code
    )
}

/// Creates the blocking HTTP client used for every eBird request.
pub fn build_client(timeout_secs: u64) -> Result<reqwest::blocking::Client, ReportError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(concat!("birdreport_service/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

// ============================================================================
// API Client Functions
// ============================================================================

/// Fetch notable observations in `region_code` over the last `back_days`.
///
/// # Returns
/// The JSON array exactly as eBird returned it.
///
/// # Errors
/// - `Configuration` if `back_days` is outside 1..=30 or the key is blank
/// - `Transport` for any non-2xx status
/// - `Parse` if the body is not a JSON array
pub fn fetch_recent_notable(
    client: &reqwest::blocking::Client,
    base_url: &str,
    api_key: &str,
    region_code: &str,
    back_days: u32,
) -> Result<serde_json::Value, ReportError> {
    validate_back_days(back_days)?;
    if api_key.trim().is_empty() {
        return Err(ReportError::Configuration("eBird API key is empty".to_string()));
    }

    let url = build_notable_url(base_url, region_code);
    info!(
        source = %DataSource::Ebird,
        region = region_code,
        back_days,
        "fetching notable observations"
    );

    let back = back_days.to_string();
    let response = client
        .get(&url)
        .header(TOKEN_HEADER, api_key)
        .header("Accept", "application/json")
        .query(&[("regionCode", region_code), ("back", back.as_str())])
        .send()?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(ReportError::Transport {
            status: status.as_u16(),
            body,
        });
    }

    let document: serde_json::Value = response.json()?;
    let count = ensure_observation_array(&document)?;
    debug!(source = %DataSource::Ebird, region = region_code, count, "received observations");

    Ok(document)
}

/// Checks that a document has the shape of an observation list and returns
/// its length.
pub fn ensure_observation_array(document: &serde_json::Value) -> Result<usize, ReportError> {
    document.as_array().map(Vec::len).ok_or_else(|| {
        ReportError::Parse(format!(
            "expected a JSON array of observations, got {}",
            json_kind(document)
        ))
    })
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

// ============================================================================
// Tests
// ============================================================================
