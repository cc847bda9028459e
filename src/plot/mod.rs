/// Plot rendering.
///
/// Both renderers are single-shot: they take an already computed input,
/// write one SVG file and return. Nothing is cached between calls.
///
/// Submodules:
/// - `boundary` - GeoJSON boundary layer loading.
/// - `map`      - observation locations over the boundary layer.
/// - `bars`     - birds counted per calendar date.

pub mod bars;
pub mod boundary;
pub mod map;

use chrono::{Duration, NaiveDate};

use crate::model::ReportError;

/// Converts any plotters drawing error into a render failure.
pub(crate) fn render_error<E: std::fmt::Display>(err: E) -> ReportError {
    ReportError::Render(err.to_string())
}

/// First and last day covered by a lookback window ending `today`.
pub fn observation_window(today: NaiveDate, back_days: u32) -> (NaiveDate, NaiveDate) {
    (today - Duration::days(i64::from(back_days)), today)
}

/// Title of the observation map, e.g.
/// "Recent Bird Observations in New Jersey, 2024-04-17 to 2024-05-01".
pub fn map_title(region_name: &str, today: NaiveDate, back_days: u32) -> String {
    let (first, last) = observation_window(today, back_days);
    format!(
        "Recent Bird Observations in {}, {} to {}",
        region_name,
        first.format("%Y-%m-%d"),
        last.format("%Y-%m-%d")
    )
}
