/// Region registry for the spatial renderer.
///
/// Defines the regions whose observations can be drawn over a boundary
/// layer. Any region can be fetched and summarised, but a map needs a
/// display name and a boundary dataset, so map rendering is limited to the
/// regions listed here. This is the single source of truth for that
/// restriction: other modules should look regions up here rather than
/// comparing region codes themselves.

// ---------------------------------------------------------------------------
// Region metadata
// ---------------------------------------------------------------------------

/// Metadata for one mappable region.
#[derive(Debug)]
pub struct Region {
    /// ISO 3166-2 style code as used by eBird (e.g. "US-NJ").
    pub code: &'static str,
    /// Name used in plot titles.
    pub name: &'static str,
    /// Boundary dataset used when the configuration names none.
    pub default_boundary: &'static str,
}

/// All regions the spatial renderer supports.
pub static REGION_REGISTRY: &[Region] = &[Region {
    code: "US-NJ",
    name: "New Jersey",
    default_boundary: "data/boundaries/US-NJ.geojson",
}];

/// Looks up a region by code. Returns `None` if not registered.
pub fn find_region(code: &str) -> Option<&'static Region> {
    REGION_REGISTRY.iter().find(|r| r.code == code)
}

/// Returns the codes of all registered regions.
pub fn supported_region_codes() -> Vec<&'static str> {
    REGION_REGISTRY.iter().map(|r| r.code).collect()
}

/// Checks the shape of an eBird region code: a two-letter country, an
/// optional subdivision and an optional county, separated by '-'.
pub fn is_valid_region_code(code: &str) -> bool {
    let parts: Vec<&str> = code.split('-').collect();
    if parts.is_empty() || parts.len() > 3 {
        return false;
    }
    let country_ok = parts[0].len() == 2 && parts[0].chars().all(|c| c.is_ascii_uppercase());
    let rest_ok = parts[1..]
        .iter()
        .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_alphanumeric()));
    country_ok && rest_ok
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_registered_codes_are_valid() {
        for region in REGION_REGISTRY {
            assert!(
                is_valid_region_code(region.code),
                "region code for '{}' is malformed: '{}'",
                region.name,
                region.code
            );
        }
    }

    #[test]
    fn test_no_duplicate_region_codes() {
        let mut seen = std::collections::HashSet::new();
        for region in REGION_REGISTRY {
            assert!(
                seen.insert(region.code),
                "duplicate region code '{}' found in REGION_REGISTRY",
                region.code
            );
        }
    }

    #[test]
    fn test_new_jersey_is_supported() {
        let nj = find_region("US-NJ").expect("New Jersey should be in registry");
        assert_eq!(nj.name, "New Jersey");
        assert!(nj.default_boundary.ends_with(".geojson"));
    }

    #[test]
    fn test_new_york_is_not_supported() {
        assert!(find_region("US-NY").is_none());
        assert!(!supported_region_codes().contains(&"US-NY"));
    }

    #[test]
    fn test_region_code_format() {
        assert!(is_valid_region_code("US"));
        assert!(is_valid_region_code("US-NJ"));
        assert!(is_valid_region_code("US-NJ-009"));
        assert!(!is_valid_region_code(""));
        assert!(!is_valid_region_code("us-nj"));
        assert!(!is_valid_region_code("US-"));
        assert!(!is_valid_region_code("US-NJ-009-1"));
        assert!(!is_valid_region_code("US/NJ"));
    }
}
