/// Observation cache
///
/// Holds the fetched observation document under a single key. Every store
/// replaces the cache's entire contents, so a read always returns the
/// document from the most recent store. Documents are kept as JSON text so
/// a read returns exactly the bytes that were written.

use std::collections::HashMap;

use postgres::{Client, NoTls};
use tracing::debug;

use crate::logging::DataSource;
use crate::model::ReportError;

/// Storage for the raw observation document.
pub trait ObservationCache {
    /// Replace all cached content with `document` under `key`.
    fn store(&mut self, key: &str, document: &serde_json::Value) -> Result<(), ReportError>;

    /// Fetch the document stored under `key`, if any.
    fn retrieve(&mut self, key: &str) -> Result<Option<serde_json::Value>, ReportError>;
}

// ---------------------------------------------------------------------------
// Postgres
// ---------------------------------------------------------------------------

const CREATE_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS observation_cache (
        cache_key  TEXT PRIMARY KEY,
        document   TEXT NOT NULL,
        stored_at  TIMESTAMPTZ NOT NULL DEFAULT now()
    )
";

/// Cache backed by a single Postgres table.
pub struct PostgresCache {
    client: Client,
}

impl PostgresCache {
    /// Connects and makes sure the cache table exists.
    pub fn connect(database_url: &str) -> Result<Self, ReportError> {
        let mut client = Client::connect(database_url, NoTls)?;
        client.batch_execute(CREATE_TABLE)?;
        Ok(Self { client })
    }

    /// When the document under `key` was last stored.
    pub fn stored_at(
        &mut self,
        key: &str,
    ) -> Result<Option<chrono::DateTime<chrono::Utc>>, ReportError> {
        let row = self.client.query_opt(
            "SELECT stored_at FROM observation_cache WHERE cache_key = $1",
            &[&key],
        )?;
        Ok(row.map(|r| r.get(0)))
    }
}

impl ObservationCache for PostgresCache {
    fn store(&mut self, key: &str, document: &serde_json::Value) -> Result<(), ReportError> {
        let text = serde_json::to_string(document)?;

        // Delete and insert commit together; a failed insert leaves the
        // previous document in place.
        let mut tx = self.client.transaction()?;
        let cleared = tx.execute("DELETE FROM observation_cache", &[])?;
        tx.execute(
            "INSERT INTO observation_cache (cache_key, document) VALUES ($1, $2)",
            &[&key, &text],
        )?;
        tx.commit()?;

        debug!(
            source = %DataSource::Cache,
            key,
            cleared,
            bytes = text.len(),
            "stored document"
        );
        Ok(())
    }

    fn retrieve(&mut self, key: &str) -> Result<Option<serde_json::Value>, ReportError> {
        let row = self.client.query_opt(
            "SELECT document FROM observation_cache WHERE cache_key = $1",
            &[&key],
        )?;

        match row {
            Some(row) => {
                let text: String = row.get(0);
                Ok(Some(serde_json::from_str(&text)?))
            }
            None => Ok(None),
        }
    }
}

// ---------------------------------------------------------------------------
// In-process
// ---------------------------------------------------------------------------

/// Cache living in process memory; contents vanish at exit.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: HashMap<String, String>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The stored text for `key`, as it would be read back.
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

impl ObservationCache for MemoryCache {
    fn store(&mut self, key: &str, document: &serde_json::Value) -> Result<(), ReportError> {
        let text = serde_json::to_string(document)?;
        self.entries.clear();
        self.entries.insert(key.to_string(), text);
        Ok(())
    }

    fn retrieve(&mut self, key: &str) -> Result<Option<serde_json::Value>, ReportError> {
        self.entries
            .get(key)
            .map(|text| serde_json::from_str(text).map_err(ReportError::from))
            .transpose()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn notable() -> serde_json::Value {
        json!([
            {
                "speciesCode": "snoowl1",
                "comName": "Snowy Owl",
                "locName": "Island Beach SP",
                "obsDt": "2024-01-14 09:12",
                "howMany": 1,
                "lat": 39.8,
                "lng": -74.09,
                "obsValid": true,
                "obsReviewed": true
            }
        ])
    }

    #[test]
    fn test_round_trip_is_byte_identical() {
        let mut cache = MemoryCache::new();
        let doc = notable();
        cache.store("doc", &doc).unwrap();

        let back = cache.retrieve("doc").unwrap().expect("document was stored");
        assert_eq!(back, doc);
        assert_eq!(
            serde_json::to_string(&back).unwrap(),
            serde_json::to_string(&doc).unwrap()
        );
    }

    #[test]
    fn test_full_precision_coordinates_survive_round_trip() {
        let mut cache = MemoryCache::new();
        let mut values = vec![42.037052891754804, 40.000000000000014, 79.99999999999997];
        // Step through the bit patterns between 40.0 and 80.0.
        let (lo, hi) = (40.0f64.to_bits(), 80.0f64.to_bits());
        let stride = (hi - lo) / 20_000;
        values.extend((0..20_000).map(|i| f64::from_bits(lo + i * stride + i % 7)));

        for lat in values {
            let doc = json!([{ "lat": lat, "lng": -lat }]);
            cache.store("doc", &doc).unwrap();
            let back = cache.retrieve("doc").unwrap().expect("document was stored");
            assert_eq!(back, doc, "lat {:?} changed in the cache", lat);
            assert_eq!(back[0]["lat"].as_f64().map(f64::to_bits), Some(lat.to_bits()));
        }
    }

    #[test]
    fn test_store_replaces_every_previous_key() {
        let mut cache = MemoryCache::new();
        cache.store("first", &json!([1])).unwrap();
        cache.store("second", &json!([2])).unwrap();

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.retrieve("first").unwrap(), None);
        assert_eq!(cache.retrieve("second").unwrap(), Some(json!([2])));
    }

    #[test]
    fn test_retrieve_missing_key_is_none() {
        let mut cache = MemoryCache::new();
        assert!(cache.is_empty());
        assert_eq!(cache.retrieve("doc").unwrap(), None);
    }

    #[test]
    fn test_corrupt_entry_surfaces_parse_error() {
        let mut cache = MemoryCache::new();
        cache.entries.insert("doc".to_string(), "[{not json".to_string());
        let err = cache.retrieve("doc").expect_err("corrupt text must not decode");
        assert!(matches!(err, ReportError::Parse(_)));
    }

    #[test]
    fn test_raw_text_matches_serialized_document() {
        let mut cache = MemoryCache::new();
        let doc = notable();
        cache.store("doc", &doc).unwrap();
        assert_eq!(cache.raw("doc"), Some(serde_json::to_string(&doc).unwrap().as_str()));
    }
}
