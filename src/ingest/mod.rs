/// Observation ingest.
///
/// - `ebird` - blocking client for the eBird API 2.0 observation endpoints.

pub mod ebird;
