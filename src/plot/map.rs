/// Observation map: one translucent point per record over the boundary
/// layer, longitude on x and latitude on y.

use std::path::Path;

use plotters::prelude::*;

use super::boundary::Boundary;
use super::render_error;
use crate::model::ReportError;

const BOUNDARY_FILL: RGBColor = RGBColor(169, 169, 169);
const POINT_ALPHA: f64 = 0.3;
const POINT_RADIUS: i32 = 4;

/// Renders `points` as (longitude, latitude) pairs over `boundary` into an
/// SVG file at `path`.
pub fn render_observation_map(
    points: &[(f64, f64)],
    boundary: &Boundary,
    title: &str,
    path: &Path,
    size: (u32, u32),
) -> Result<(), ReportError> {
    let (x_range, y_range) = plot_extent(points, boundary);

    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE).map_err(render_error)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 22))
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, y_range)
        .map_err(render_error)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("Longitude")
        .y_desc("Latitude")
        .draw()
        .map_err(render_error)?;

    chart
        .draw_series(
            boundary
                .rings()
                .map(|ring| Polygon::new(ring, BOUNDARY_FILL.filled())),
        )
        .map_err(render_error)?;
    chart
        .draw_series(
            boundary
                .rings()
                .map(|ring| PathElement::new(ring, WHITE.stroke_width(1))),
        )
        .map_err(render_error)?;

    chart
        .draw_series(
            points.iter().map(|&(lng, lat)| {
                Circle::new((lng, lat), POINT_RADIUS, BLUE.mix(POINT_ALPHA).filled())
            }),
        )
        .map_err(render_error)?;

    root.present().map_err(render_error)?;
    Ok(())
}

/// Axis ranges covering the boundary and every point, padded by 2%.
fn plot_extent(
    points: &[(f64, f64)],
    boundary: &Boundary,
) -> (std::ops::Range<f64>, std::ops::Range<f64>) {
    let mut min_x = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;

    let mut include = |x: f64, y: f64| {
        min_x = min_x.min(x);
        max_x = max_x.max(x);
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    };

    if let Some(rect) = boundary.bounds() {
        include(rect.min().x, rect.min().y);
        include(rect.max().x, rect.max().y);
    }
    for &(x, y) in points {
        include(x, y);
    }

    let pad = |lo: f64, hi: f64| {
        let margin = ((hi - lo) * 0.02).max(0.01);
        (lo - margin)..(hi + margin)
    };
    (pad(min_x, max_x), pad(min_y, max_y))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Boundary {
        Boundary::from_geojson_str(
            r#"{ "type": "Polygon",
                 "coordinates": [[[-75.0, 39.0], [-74.0, 39.0], [-74.0, 40.0],
                                  [-75.0, 40.0], [-75.0, 39.0]]] }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_extent_covers_boundary_and_outliers() {
        let (x, y) = plot_extent(&[(-73.5, 39.5)], &square());
        assert!(x.start < -75.0 && x.end > -73.5, "x range {:?}", x);
        assert!(y.start < 39.0 && y.end > 40.0, "y range {:?}", y);
    }

    #[test]
    fn test_map_written_as_svg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.svg");
        render_observation_map(
            &[(-74.5, 39.5), (-74.2, 39.8)],
            &square(),
            "Recent Bird Observations in Square County, 2024-04-17 to 2024-05-01",
            &path,
            (640, 640),
        )
        .expect("render succeeds");

        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.starts_with("<svg"), "output should be an SVG document");
        assert!(svg.contains("Square County"));
        assert!(svg.contains("Longitude"));
        assert!(svg.matches("<circle").count() >= 2);
    }
}
