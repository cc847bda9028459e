/// Live tests against eBird and PostgreSQL
///
/// These tests verify:
/// 1. The eBird notable-observations endpoint answers for the default region
/// 2. The live response decodes into a collection for that region
/// 3. The Postgres cache keeps exactly one document and returns it unchanged
///
/// Prerequisites:
/// - EBIRD_API_KEY set in the environment or .env
/// - DATABASE_URL pointing at a scratch PostgreSQL database
/// - Internet connectivity to reach api.ebird.org
///
/// Run with: cargo test --test live_sources -- --ignored --test-threads=1
///
/// Note: the cache test replaces whatever is stored in observation_cache.

use birdreport_service::cache::{ObservationCache, PostgresCache};
use birdreport_service::config::Credentials;
use birdreport_service::ingest::ebird;
use birdreport_service::{BirdReport, ObservationCollection, ReportError};

fn credentials() -> Credentials {
    Credentials::from_env()
}

#[test]
#[ignore] // Only run manually - makes real API calls
fn test_live_notable_observations_for_new_jersey() {
    let credentials = credentials();
    let api_key = credentials
        .require_api_key()
        .expect("EBIRD_API_KEY must be set for live tests");
    let client = ebird::build_client(30).unwrap();

    let document =
        ebird::fetch_recent_notable(&client, ebird::EBIRD_BASE_URL, api_key, "US-NJ", 7)
            .expect("eBird should answer for US-NJ");
    let count = ebird::ensure_observation_array(&document).unwrap();
    println!("eBird returned {} notable observations for US-NJ", count);

    let collection = ObservationCollection::from_json("US-NJ", 7, &document)
        .expect("live records should decode and belong to US-NJ");
    let report = BirdReport::new(collection);
    print!("{}", report.summary());

    let species_sum: u64 = report.species_count().iter().map(|s| s.total).sum();
    assert_eq!(species_sum, report.summary().total_birds);
}

#[test]
#[ignore] // Only run manually - makes real API calls
fn test_live_bad_key_is_transport_error() {
    let client = ebird::build_client(30).unwrap();
    let err = ebird::fetch_recent_notable(
        &client,
        ebird::EBIRD_BASE_URL,
        "not-a-real-key",
        "US-NJ",
        7,
    )
    .unwrap_err();

    assert!(
        matches!(err, ReportError::Transport { .. }),
        "expected an HTTP status failure, got {:?}",
        err
    );
}

#[test]
#[ignore] // Only run manually - needs a database
fn test_postgres_cache_keeps_single_document() {
    let credentials = credentials();
    let url = credentials
        .require_database_url()
        .expect("DATABASE_URL must be set for live tests");
    let mut cache = PostgresCache::connect(url).expect("database should be reachable");

    let first = serde_json::json!([{ "speciesCode": "amewig", "howMany": 2 }]);
    let second = serde_json::json!([{ "speciesCode": "whwdov" }]);

    cache.store("doc", &first).unwrap();
    cache.store("other", &second).unwrap();

    assert_eq!(
        cache.retrieve("doc").unwrap(),
        None,
        "storing under a new key flushes everything else"
    );
    assert_eq!(cache.retrieve("other").unwrap(), Some(second));
    assert!(cache.stored_at("other").unwrap().is_some());
}
