/// Bird observation report.
///
/// `BirdReport` owns one region's observation collection. Summary statistics
/// are computed once, at construction; the species and date aggregates are
/// recomputed on demand from the untouched records.
///
/// # Clock injection
/// Map titles depend on today's date. `plot_observations_at` takes the date
/// as a parameter; `plot_observations` is the wrapper that reads the local
/// clock. Tests use the former to stay deterministic.

use std::fmt;
use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::analysis::groupings::{self, DateTotal, SpeciesTotal};
use crate::config::PlotSettings;
use crate::logging::{self, DataSource};
use crate::model::{Observation, ObservationCollection, ReportError};
use crate::plot::{self, bars, boundary, map};
use crate::regions;

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// One of the records sharing the collection's highest count.
#[derive(Debug, Clone, PartialEq)]
pub struct HighCount {
    pub com_name: String,
    pub how_many: u64,
    pub loc_name: String,
    pub obs_dt: String,
}

/// Statistics computed when a report is built.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSummary {
    pub unique_species: usize,
    pub unique_locations: usize,
    pub total_birds: u64,
    /// `None` when no observation is marked valid.
    pub review_ratio: Option<f64>,
    pub highest_counts: Vec<HighCount>,
}

impl ReportSummary {
    fn compute(records: &[Observation]) -> Self {
        let review_ratio = match groupings::review_ratio(records) {
            Ok(ratio) => Some(ratio),
            Err(e) => {
                warn!(source = %DataSource::Report, "{}", e);
                None
            }
        };

        Self {
            unique_species: groupings::distinct_in_order(
                records.iter().map(|r| r.species_code.as_str()),
            )
            .len(),
            unique_locations: groupings::distinct_in_order(
                records.iter().map(|r| r.loc_name.as_str()),
            )
            .len(),
            total_birds: groupings::total_birds(records),
            review_ratio,
            highest_counts: groupings::highest_count_records(records)
                .into_iter()
                .map(|r| HighCount {
                    com_name: r.com_name.clone(),
                    how_many: r.effective_count(),
                    loc_name: r.loc_name.clone(),
                    obs_dt: r.obs_dt.clone(),
                })
                .collect(),
        }
    }
}

impl fmt::Display for ReportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "------------------------------------------------------")?;
        writeln!(f, "Birdreport summary stats:")?;
        writeln!(f, "Number of unique species seen: {}", self.unique_species)?;
        writeln!(f, "Number of unique locations: {}", self.unique_locations)?;
        writeln!(f, "Total number of birds observed: {}", self.total_birds)?;
        match self.review_ratio {
            Some(ratio) => writeln!(
                f,
                "Percentage of observations reviewed by birding experts: {:.0}%",
                ratio * 100.0
            )?,
            None => writeln!(
                f,
                "Percentage of observations reviewed by birding experts: \
                 undefined (no valid observations)"
            )?,
        }
        writeln!(f, "Largest amount seen of any species at one time:")?;
        if self.highest_counts.is_empty() {
            writeln!(f, "  (no observations)")?;
        }
        for high in &self.highest_counts {
            writeln!(
                f,
                "  {} x{} at {} on {}",
                high.com_name, high.how_many, high.loc_name, high.obs_dt
            )?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Files written by `BirdReport::write_plots`.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotOutputs {
    /// `None` when the region has no map.
    pub map: Option<PathBuf>,
    pub counts: PathBuf,
}

pub struct BirdReport {
    collection: ObservationCollection,
    summary: ReportSummary,
}

impl BirdReport {
    /// Builds the report and computes its summary.
    pub fn new(collection: ObservationCollection) -> Self {
        info!(
            source = %DataSource::Report,
            region = collection.region_code(),
            records = collection.len(),
            back_days = collection.back_days(),
            "generating birding report"
        );
        for record in collection.records().iter().take(5) {
            debug!(
                source = %DataSource::Report,
                species = %record.species_code,
                location = %record.loc_name,
                obs_dt = %record.obs_dt,
                how_many = ?record.how_many,
                "sample record"
            );
        }

        let summary = ReportSummary::compute(collection.records());
        Self { collection, summary }
    }

    pub fn summary(&self) -> &ReportSummary {
        &self.summary
    }

    pub fn collection(&self) -> &ObservationCollection {
        &self.collection
    }

    /// Distinct common names in first-seen order.
    pub fn species_observed(&self) -> Vec<&str> {
        groupings::distinct_in_order(self.collection.records().iter().map(|r| r.com_name.as_str()))
    }

    /// Birds per species, largest total first.
    pub fn species_count(&self) -> Vec<SpeciesTotal> {
        groupings::species_totals(self.collection.records())
    }

    /// Birds per calendar date, earliest first.
    pub fn date_count(&self) -> Result<Vec<DateTotal>, ReportError> {
        groupings::date_totals(self.collection.records())
    }

    /// Draws every observation over the region's boundary layer.
    ///
    /// Returns the path of the written SVG.
    pub fn plot_observations(&self, settings: &PlotSettings) -> Result<PathBuf, ReportError> {
        self.plot_observations_at(settings, chrono::Local::now().date_naive())
    }

    /// As `plot_observations`, with the title's end date supplied.
    pub fn plot_observations_at(
        &self,
        settings: &PlotSettings,
        today: NaiveDate,
    ) -> Result<PathBuf, ReportError> {
        let region_code = self.collection.region_code();
        let region = regions::find_region(region_code).ok_or_else(|| {
            ReportError::UnsupportedRegion(format!(
                "{} (maps are available for: {})",
                region_code,
                regions::supported_region_codes().join(", ")
            ))
        })?;

        let boundary_path = settings.boundary_for(region_code).ok_or_else(|| {
            ReportError::Configuration(format!(
                "no boundary dataset configured for {}",
                region_code
            ))
        })?;
        let boundary = boundary::load_boundary(&boundary_path)?;

        let points: Vec<(f64, f64)> = self
            .collection
            .records()
            .iter()
            .map(|r| (r.lng, r.lat))
            .collect();
        let outside = points
            .iter()
            .filter(|(lng, lat)| !boundary.contains(*lng, *lat))
            .count();
        if outside > 0 {
            warn!(
                source = %DataSource::Plot,
                region = region_code,
                outside,
                "observations fall outside the boundary layer"
            );
        }

        fs::create_dir_all(&settings.output_dir)?;
        let path = settings
            .output_dir
            .join(format!("observations_{}.svg", region_code));
        let title = plot::map_title(region.name, today, self.collection.back_days());

        map::render_observation_map(
            &points,
            &boundary,
            &title,
            &path,
            (settings.width, settings.height),
        )?;
        info!(
            source = %DataSource::Plot,
            region = region_code,
            path = %path.display(),
            "observation map written"
        );
        Ok(path)
    }

    /// Draws the per-date totals as a bar chart.
    ///
    /// Returns the path of the written SVG.
    pub fn plot_count(&self, settings: &PlotSettings) -> Result<PathBuf, ReportError> {
        let days = self.date_count()?;
        let region_code = self.collection.region_code();

        fs::create_dir_all(&settings.output_dir)?;
        let path = settings
            .output_dir
            .join(format!("counts_by_date_{}.svg", region_code));

        bars::render_date_counts(&days, &path, (settings.width, settings.height))?;
        info!(
            source = %DataSource::Plot,
            region = region_code,
            days = days.len(),
            path = %path.display(),
            "date chart written"
        );
        Ok(path)
    }

    /// Writes both plots.
    ///
    /// A region with no map skips only the map; the bar chart is still
    /// written. Any other failure ends the call.
    pub fn write_plots(&self, settings: &PlotSettings) -> Result<PlotOutputs, ReportError> {
        self.write_plots_at(settings, chrono::Local::now().date_naive())
    }

    /// As `write_plots`, with the map title's end date supplied.
    pub fn write_plots_at(
        &self,
        settings: &PlotSettings,
        today: NaiveDate,
    ) -> Result<PlotOutputs, ReportError> {
        let map = match self.plot_observations_at(settings, today) {
            Ok(path) => Some(path),
            Err(e @ ReportError::UnsupportedRegion(_)) => {
                logging::log_failure(
                    DataSource::Plot,
                    self.collection.region_code(),
                    "plot observations",
                    &e,
                );
                None
            }
            Err(e) => return Err(e),
        };
        let counts = self.plot_count(settings)?;
        Ok(PlotOutputs { map, counts })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
