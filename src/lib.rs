/// Bird observation report service.
///
/// Fetches recent notable observations for a region from eBird, caches the
/// raw document, and reports on it: summary statistics, per-species and
/// per-date totals, an observation map and a per-date bar chart.

pub mod analysis;
pub mod cache;
pub mod config;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod plot;
pub mod regions;
pub mod report;

pub use model::{Observation, ObservationCollection, ReportError};
pub use report::{BirdReport, PlotOutputs, ReportSummary};
