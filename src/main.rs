/// birdreport - recent notable bird observations for one region.
///
/// Runs the fixed pipeline: fetch from eBird, store in the cache, read the
/// cached document back, print the report, write both plots.
///
/// Exit codes:
///   0 - Success
///   1 - Any failure (configuration, transport, cache, report, rendering)

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};

use birdreport_service::cache::{MemoryCache, ObservationCache, PostgresCache};
use birdreport_service::config::{self, AppConfig, CacheBackend, Credentials};
use birdreport_service::ingest::ebird;
use birdreport_service::logging::{self, DataSource};
use birdreport_service::{BirdReport, ObservationCollection, ReportError};

/// Report on recent notable bird observations from eBird.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file
    #[arg(short, long, value_name = "FILE", env = "BIRDREPORT_CONFIG")]
    config: Option<PathBuf>,

    /// Region code to report on (overrides the config file)
    #[arg(short, long, value_name = "CODE")]
    region: Option<String>,

    /// Lookback window in days, 1-30 (overrides the config file)
    #[arg(short, long, value_name = "DAYS")]
    back: Option<u32>,

    /// Skip the eBird request and report on the cached document
    #[arg(long)]
    offline: bool,

    /// Print the report without writing plots
    #[arg(long)]
    no_plots: bool,
}

fn main() {
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = logging::init_logger(
        config.logging.level,
        config.logging.file.as_deref(),
        config.logging.timestamps,
    ) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(&args, &config) {
        error!(source = %DataSource::System, "run failed: {}", e);
        eprintln!("\nError: {}", e);
        std::process::exit(1);
    }
}

fn load_config(args: &Args) -> Result<AppConfig, ReportError> {
    let (path, explicit) = match &args.config {
        Some(path) => (path.clone(), true),
        None => (PathBuf::from(config::DEFAULT_CONFIG_FILE), false),
    };

    let mut config = config::load_config(&path, explicit)?;
    if let Some(region) = &args.region {
        config.report.region_code = region.clone();
    }
    if let Some(back) = args.back {
        config.report.back_days = back;
    }
    config.validate()?;
    Ok(config)
}

fn open_cache(
    config: &AppConfig,
    credentials: &Credentials,
) -> Result<Box<dyn ObservationCache>, ReportError> {
    match config.cache.backend {
        CacheBackend::Postgres => {
            let url = credentials.require_database_url()?;
            Ok(Box::new(PostgresCache::connect(url)?))
        }
        CacheBackend::Memory => Ok(Box::new(MemoryCache::new())),
    }
}

fn run(args: &Args, config: &AppConfig) -> Result<(), ReportError> {
    let region = config.report.region_code.as_str();
    let back_days = config.report.back_days;
    let key = config.cache.key.as_str();
    let credentials = Credentials::from_env();

    let mut cache = open_cache(config, &credentials).inspect_err(|e| {
        logging::log_failure(DataSource::Cache, region, "open cache", e);
    })?;

    if args.offline {
        if config.cache.backend == CacheBackend::Memory {
            return Err(ReportError::Configuration(
                "--offline needs a persistent cache backend".to_string(),
            ));
        }
        info!(source = %DataSource::System, region, "offline: skipping eBird request");
    } else {
        let api_key = credentials.require_api_key()?;
        let client = ebird::build_client(config.ebird.timeout_secs)?;
        let document = ebird::fetch_recent_notable(
            &client,
            &config.ebird.base_url,
            api_key,
            region,
            back_days,
        )
        .inspect_err(|e| {
            logging::log_failure(DataSource::Ebird, region, "fetch notable observations", e);
        })?;

        cache.store(key, &document).inspect_err(|e| {
            logging::log_failure(DataSource::Cache, region, "store", e);
        })?;
    }

    let document = cache
        .retrieve(key)
        .inspect_err(|e| logging::log_failure(DataSource::Cache, region, "retrieve", e))?
        .ok_or_else(|| {
            ReportError::Configuration(format!("no cached document under key '{}'", key))
        })?;

    let collection = ObservationCollection::from_json(region, back_days, &document)?;
    let report = BirdReport::new(collection);

    println!("Generating birding report for {} ({} days back):", region, back_days);
    print!("{}", report.summary());

    println!("\nSpecies observed:");
    for name in report.species_observed() {
        println!("  {}", name);
    }

    println!("\nBirds per species:");
    for species in report.species_count() {
        println!("  {:<40} {:>6}", species.com_name, species.total);
    }

    if args.no_plots {
        return Ok(());
    }

    let outputs = report.write_plots(&config.plot)?;
    match &outputs.map {
        Some(map) => println!("\nObservation map: {}", map.display()),
        None => println!("\nObservation map: not available for {}", region),
    }
    println!("Counts by date:  {}", outputs.counts.display());

    Ok(())
}
