/// Reference boundary layer for observation maps.
///
/// Boundaries are GeoJSON documents in WGS84 longitude/latitude (the only
/// CRS RFC 7946 allows), so no reprojection happens here. Any mix of
/// Polygon, MultiPolygon and nested GeometryCollection geometries is
/// flattened into one MultiPolygon; other geometry types are ignored.

use std::fs;
use std::path::Path;

use geo::{BoundingRect, Contains, Geometry, GeometryCollection, MultiPolygon, Point, Polygon, Rect};
use geojson::GeoJson;

use crate::model::ReportError;

#[derive(Debug, Clone)]
pub struct Boundary {
    shapes: MultiPolygon<f64>,
}

/// Loads a boundary dataset from disk.
///
/// A missing file is a configuration problem (the path comes from the
/// config), not an I/O fault.
pub fn load_boundary(path: &Path) -> Result<Boundary, ReportError> {
    let text = fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ReportError::Configuration(format!(
            "boundary dataset not found: {}",
            path.display()
        )),
        _ => ReportError::Io(e),
    })?;
    Boundary::from_geojson_str(&text)
}

impl Boundary {
    pub fn from_geojson_str(text: &str) -> Result<Self, ReportError> {
        let geojson: GeoJson = text
            .parse()
            .map_err(|e: geojson::Error| ReportError::Parse(format!("boundary: {}", e)))?;
        let collection = GeometryCollection::<f64>::try_from(&geojson)
            .map_err(|e| ReportError::Parse(format!("boundary: {}", e)))?;

        let mut polygons = Vec::new();
        collect_polygons(collection.0, &mut polygons);

        if polygons.is_empty() {
            return Err(ReportError::Parse(
                "boundary: dataset contains no polygons".to_string(),
            ));
        }

        Ok(Self {
            shapes: MultiPolygon::new(polygons),
        })
    }

    pub fn polygon_count(&self) -> usize {
        self.shapes.0.len()
    }

    /// Exterior ring of every polygon as (longitude, latitude) pairs.
    pub fn rings(&self) -> impl Iterator<Item = Vec<(f64, f64)>> + '_ {
        self.shapes
            .iter()
            .map(|poly| poly.exterior().coords().map(|c| (c.x, c.y)).collect())
    }

    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.shapes.bounding_rect()
    }

    pub fn contains(&self, lng: f64, lat: f64) -> bool {
        self.shapes.contains(&Point::new(lng, lat))
    }
}

fn collect_polygons(geometries: Vec<Geometry<f64>>, out: &mut Vec<Polygon<f64>>) {
    for geometry in geometries {
        match geometry {
            Geometry::Polygon(p) => out.push(p),
            Geometry::MultiPolygon(mp) => out.extend(mp.0),
            Geometry::GeometryCollection(gc) => collect_polygons(gc.0, out),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": { "NAME": "Square County" },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[-75.0, 39.0], [-74.0, 39.0], [-74.0, 40.0],
                                     [-75.0, 40.0], [-75.0, 39.0]]]
                }
            },
            {
                "type": "Feature",
                "properties": { "NAME": "Ocean" },
                "geometry": { "type": "Point", "coordinates": [-74.5, 39.5] }
            }
        ]
    }"#;

    #[test]
    fn test_feature_collection_polygons_are_kept_points_dropped() {
        let boundary = Boundary::from_geojson_str(SQUARE).expect("valid GeoJSON");
        assert_eq!(boundary.polygon_count(), 1);

        let rings: Vec<_> = boundary.rings().collect();
        assert_eq!(rings[0].first(), Some(&(-75.0, 39.0)));
    }

    #[test]
    fn test_bounds_and_containment() {
        let boundary = Boundary::from_geojson_str(SQUARE).unwrap();
        let rect = boundary.bounds().expect("non-empty boundary has bounds");
        assert_eq!(rect.min().x, -75.0);
        assert_eq!(rect.max().y, 40.0);

        assert!(boundary.contains(-74.5, 39.5));
        assert!(!boundary.contains(-73.5, 39.5));
    }

    #[test]
    fn test_points_only_dataset_rejected() {
        let text = r#"{ "type": "Point", "coordinates": [-74.5, 39.5] }"#;
        let err = Boundary::from_geojson_str(text).expect_err("no polygons to draw");
        assert!(matches!(err, ReportError::Parse(_)));
    }

    #[test]
    fn test_missing_file_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_boundary(&dir.path().join("absent.geojson")).expect_err("file absent");
        assert!(
            matches!(err, ReportError::Configuration(ref m) if m.contains("absent.geojson")),
            "got {:?}",
            err
        );
    }

    #[test]
    fn test_shipped_new_jersey_boundary_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/boundaries/US-NJ.geojson");
        let boundary = load_boundary(&path).expect("bundled boundary must parse");
        // Cape May Point and Sandy Hook are both inside the state outline.
        assert!(boundary.contains(-74.96, 38.94));
        assert!(boundary.contains(-74.00, 40.43));
        assert!(!boundary.contains(-73.97, 40.78), "Central Park is in New York");
    }
}
