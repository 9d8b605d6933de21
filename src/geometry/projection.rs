use proj4rs::{proj::Proj, transform::transform};

use crate::domain::{GeoPoint, ProjectedPoint};
use crate::error::{LocatorError, Result};

/// ETRS89 / UTM zone 33N, the system the facility data store uses for shelters
const ETRS89_UTM33: &str =
    "+proj=utm +zone=33 +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +units=m +no_defs";
const WGS84_LONGLAT: &str = "+proj=longlat +datum=WGS84 +no_defs";

/// Extent accepted as zone 33 input, in meters.
///
/// Norwegian agencies publish the whole country in zone 33, so the easting
/// range is much wider than the nominal 6° band (Bergen sits near E -30 km,
/// eastern Finnmark beyond E 1000 km).
const MIN_EASTING: f64 = -250_000.0;
const MAX_EASTING: f64 = 1_350_000.0;
const MIN_NORTHING: f64 = 0.0;
const MAX_NORTHING: f64 = 9_400_000.0;

/// Converts EPSG:25833 coordinates into WGS84 longitude/latitude.
///
/// The two coordinate system definitions are parsed once in [`CoordinateTransform::new`];
/// after that the transform is immutable and every call is a pure function.
pub struct CoordinateTransform {
    source: Proj,
    target: Proj,
}

impl CoordinateTransform {
    pub fn new() -> Result<Self> {
        let source = Proj::from_proj_string(ETRS89_UTM33)
            .map_err(|e| LocatorError::Projection(format!("{}: {}", ETRS89_UTM33, e)))?;
        let target = Proj::from_proj_string(WGS84_LONGLAT)
            .map_err(|e| LocatorError::Projection(format!("{}: {}", WGS84_LONGLAT, e)))?;
        Ok(Self { source, target })
    }

    /// Transform a projected point to geographic degrees.
    ///
    /// Fails with [`LocatorError::InvalidCoordinate`] for points outside the
    /// zone 33 extent instead of producing a nonsensical position.
    pub fn to_geographic(&self, p: ProjectedPoint) -> Result<GeoPoint> {
        let invalid = || LocatorError::InvalidCoordinate {
            easting: p.easting,
            northing: p.northing,
        };

        if !in_zone_extent(p) {
            return Err(invalid());
        }

        // Meters in, radians out
        let mut point = (p.easting, p.northing, 0.0);
        transform(&self.source, &self.target, &mut point).map_err(|_| invalid())?;

        GeoPoint::new(point.0.to_degrees(), point.1.to_degrees()).map_err(|_| invalid())
    }
}

fn in_zone_extent(p: ProjectedPoint) -> bool {
    p.easting.is_finite()
        && p.northing.is_finite()
        && (MIN_EASTING..=MAX_EASTING).contains(&p.easting)
        && (MIN_NORTHING..=MAX_NORTHING).contains(&p.northing)
}
