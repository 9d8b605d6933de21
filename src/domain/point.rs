use crate::error::{LocatorError, Result};

/// A WGS84 position in degrees.
///
/// Construction validates the ranges, so every `GeoPoint` in the crate has
/// longitude in [-180, 180] and latitude in [-90, 90].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    longitude: f64,
    latitude: f64,
}

impl GeoPoint {
    pub fn new(longitude: f64, latitude: f64) -> Result<Self> {
        let valid = longitude.is_finite()
            && latitude.is_finite()
            && (-180.0..=180.0).contains(&longitude)
            && (-90.0..=90.0).contains(&latitude);
        if !valid {
            return Err(LocatorError::InvalidGeoPoint {
                longitude,
                latitude,
            });
        }
        Ok(Self {
            longitude,
            latitude,
        })
    }

    /// Build from a (lat, lon) pair, the order used on the command line.
    pub fn from_lat_lon(latitude: f64, longitude: f64) -> Result<Self> {
        Self::new(longitude, latitude)
    }

    pub fn lon(&self) -> f64 {
        self.longitude
    }

    pub fn lat(&self) -> f64 {
        self.latitude
    }

    /// Point halfway between `self` and `other` in degree space.
    ///
    /// Good enough for viewport centering at city scale.
    pub fn midpoint(&self, other: &GeoPoint) -> GeoPoint {
        GeoPoint {
            longitude: (self.longitude + other.longitude) / 2.0,
            latitude: (self.latitude + other.latitude) / 2.0,
        }
    }

    pub fn to_coord(self) -> geo::Coord<f64> {
        geo::coord! { x: self.longitude, y: self.latitude }
    }
}

impl From<GeoPoint> for geo::Point<f64> {
    fn from(p: GeoPoint) -> Self {
        geo::Point::new(p.longitude, p.latitude)
    }
}

/// A position in ETRS89 / UTM zone 33N (EPSG:25833), in meters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedPoint {
    pub easting: f64,
    pub northing: f64,
}

impl ProjectedPoint {
    pub fn new(easting: f64, northing: f64) -> Self {
        Self { easting, northing }
    }
}
