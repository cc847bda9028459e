/// Configuration loading for the bird report service.
///
/// Settings come from a TOML file (`birdreport.toml` by default); every key
/// has a default so a missing file or section still yields a usable config.
/// Credentials never live in the file: they are read from the environment
/// after `.env` has been loaded.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::logging::LogLevel;
use crate::model::ReportError;
use crate::regions;

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "birdreport.toml";

/// eBird accepts a lookback window of 1 to 30 days.
pub const MAX_BACK_DAYS: u32 = 30;

pub const ENV_API_KEY: &str = "EBIRD_API_KEY";
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";

// ============================================================================
// File configuration
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub report: ReportSettings,
    #[serde(default)]
    pub ebird: EbirdSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub plot: PlotSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Which region to report on and how far back to look.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportSettings {
    #[serde(default = "default_region_code")]
    pub region_code: String,
    #[serde(default = "default_back_days")]
    pub back_days: u32,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            region_code: default_region_code(),
            back_days: default_back_days(),
        }
    }
}

fn default_region_code() -> String {
    "US-NJ".to_string()
}

fn default_back_days() -> u32 {
    14
}

#[derive(Debug, Clone, Deserialize)]
pub struct EbirdSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EbirdSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    crate::ingest::ebird::EBIRD_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_cache_backend")]
    pub backend: CacheBackend,
    /// Key the observation document is stored under.
    #[serde(default = "default_cache_key")]
    pub key: String,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            backend: default_cache_backend(),
            key: default_cache_key(),
        }
    }
}

fn default_cache_backend() -> CacheBackend {
    CacheBackend::Postgres
}

fn default_cache_key() -> String {
    "doc".to_string()
}

/// Where and how large plots are written, and which boundary dataset backs
/// each region's map.
#[derive(Debug, Clone, Deserialize)]
pub struct PlotSettings {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_plot_size")]
    pub width: u32,
    #[serde(default = "default_plot_size")]
    pub height: u32,
    /// Region code -> GeoJSON boundary file.
    #[serde(default)]
    pub boundaries: HashMap<String, PathBuf>,
}

impl Default for PlotSettings {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            width: default_plot_size(),
            height: default_plot_size(),
            boundaries: HashMap::new(),
        }
    }
}

impl PlotSettings {
    /// Boundary dataset for `region_code`: the configured path, else the
    /// registry default, else `None` for unregistered regions.
    pub fn boundary_for(&self, region_code: &str) -> Option<PathBuf> {
        self.boundaries.get(region_code).cloned().or_else(|| {
            regions::find_region(region_code).map(|r| PathBuf::from(r.default_boundary))
        })
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("plots")
}

fn default_plot_size() -> u32 {
    1000
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: LogLevel,
    #[serde(default)]
    pub file: Option<PathBuf>,
    #[serde(default)]
    pub timestamps: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
            timestamps: false,
        }
    }
}

fn default_log_level() -> LogLevel {
    LogLevel::Info
}

impl AppConfig {
    /// Parses configuration from TOML text and validates it.
    pub fn from_toml_str(text: &str) -> Result<Self, ReportError> {
        let config: AppConfig =
            toml::from_str(text).map_err(|e| ReportError::Parse(format!("config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the settings every run depends on.
    pub fn validate(&self) -> Result<(), ReportError> {
        if !regions::is_valid_region_code(&self.report.region_code) {
            return Err(ReportError::Configuration(format!(
                "region_code '{}' is not an eBird region code",
                self.report.region_code
            )));
        }
        validate_back_days(self.report.back_days)?;
        if self.plot.width == 0 || self.plot.height == 0 {
            return Err(ReportError::Configuration(
                "plot width and height must be non-zero".to_string(),
            ));
        }
        if self.cache.key.is_empty() {
            return Err(ReportError::Configuration("cache key must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Rejects lookback windows outside what the eBird API serves.
pub fn validate_back_days(back_days: u32) -> Result<(), ReportError> {
    if back_days == 0 || back_days > MAX_BACK_DAYS {
        return Err(ReportError::Configuration(format!(
            "back_days must be between 1 and {}, got {}",
            MAX_BACK_DAYS, back_days
        )));
    }
    Ok(())
}

/// Load configuration from `path`.
///
/// A missing file at the default location falls back to defaults; a missing
/// file the caller named explicitly is an error.
pub fn load_config(path: &Path, explicit: bool) -> Result<AppConfig, ReportError> {
    match fs::read_to_string(path) {
        Ok(text) => AppConfig::from_toml_str(&text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && !explicit => {
            let config = AppConfig::default();
            config.validate()?;
            Ok(config)
        }
        Err(e) => Err(ReportError::Configuration(format!(
            "cannot read config file {}: {}",
            path.display(),
            e
        ))),
    }
}

// ============================================================================
// Credentials
// ============================================================================

/// Secrets needed to reach the collaborators.
#[derive(Clone)]
pub struct Credentials {
    pub api_key: Option<String>,
    pub database_url: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("database_url", &self.database_url.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Credentials {
    /// Reads credentials from the process environment, loading `.env` first.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds credentials from any variable lookup; blank values count as
    /// missing.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        Self {
            api_key: get(ENV_API_KEY),
            database_url: get(ENV_DATABASE_URL),
        }
    }

    pub fn require_api_key(&self) -> Result<&str, ReportError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| ReportError::Configuration(format!("{} must be set", ENV_API_KEY)))
    }

    pub fn require_database_url(&self) -> Result<&str, ReportError> {
        self.database_url
            .as_deref()
            .ok_or_else(|| ReportError::Configuration(format!("{} must be set", ENV_DATABASE_URL)))
    }
}

// ============================================================================
// Tests
// ============================================================================
