use thiserror::Error;

/// Errors raised by the locator core and its gateways.
///
/// None of these are fatal: callers degrade to an emptier display or retry on
/// the next event.
#[derive(Debug, Error)]
pub enum LocatorError {
    #[error("projected point (E {easting}, N {northing}) lies outside the UTM zone 33 extent")]
    InvalidCoordinate { easting: f64, northing: f64 },

    #[error("geographic point (lon {longitude}, lat {latitude}) is out of range")]
    InvalidGeoPoint { longitude: f64, latitude: f64 },

    #[error("[{section}] {key} is not configured")]
    Config {
        section: &'static str,
        key: &'static str,
    },

    #[error("coordinate system setup failed: {0}")]
    Projection(String),

    #[error("failed to load {dataset}: {reason}")]
    DataLoad {
        dataset: &'static str,
        reason: String,
    },

    #[error("route request failed: {0}")]
    RouteFetch(String),

    #[error("directions service returned no routes")]
    EmptyRouteResult,

    #[error("no police district known for county \"{0}\"")]
    DistrictUnresolved(String),

    #[error("geolocation unavailable")]
    GeolocationUnavailable,

    #[error("reverse geocoding failed: {0}")]
    Geocoding(String),

    #[error("incident feed request failed: {0}")]
    Incidents(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, LocatorError>;
