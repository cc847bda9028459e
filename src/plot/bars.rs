/// Bar chart of birds counted per calendar date, oldest date first.

use std::path::Path;

use plotters::prelude::*;

use super::render_error;
use crate::analysis::groupings::DateTotal;
use crate::model::ReportError;

pub const BAR_CHART_TITLE: &str = "Number of Birds Seen on Each Date";

/// Renders one bar per entry of `days` (already in ascending date order)
/// into an SVG file at `path`.
pub fn render_date_counts(
    days: &[DateTotal],
    path: &Path,
    size: (u32, u32),
) -> Result<(), ReportError> {
    let labels: Vec<String> = days
        .iter()
        .map(|d| d.date.format("%Y-%m-%d").to_string())
        .collect();
    let slots = days.len().max(1);
    let peak = days.iter().map(|d| d.total).max().unwrap_or(0);
    let y_max = peak + (peak / 10).max(1);

    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE).map_err(render_error)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(BAR_CHART_TITLE, ("sans-serif", 22))
        .margin(15)
        .x_label_area_size(90)
        .y_label_area_size(60)
        .build_cartesian_2d((0..slots).into_segmented(), 0u64..y_max)
        .map_err(render_error)?;

    let label_for = |v: &SegmentValue<usize>| match v {
        SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => {
            labels.get(*i).cloned().unwrap_or_default()
        }
        SegmentValue::Last => String::new(),
    };

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(slots)
        .x_label_formatter(&label_for)
        .x_label_style(("sans-serif", 12).into_font().transform(FontTransform::Rotate90))
        .x_desc("Date")
        .y_desc("Number of Birds")
        .draw()
        .map_err(render_error)?;

    chart
        .draw_series(
            Histogram::vertical(&chart)
                .style(BLUE.filled())
                .margin(6)
                .data(days.iter().enumerate().map(|(i, d)| (i, d.total))),
        )
        .map_err(render_error)?;

    root.present().map_err(render_error)?;
    Ok(())
}
