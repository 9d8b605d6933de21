use crate::domain::GeoPoint;

/// Mean Earth radius used for great-circle distances
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Assumed constant walking speed
pub const WALKING_SPEED_KMH: f64 = 5.0;

/// Great-circle distance in kilometers (Haversine formula).
///
/// Symmetric, and zero for identical points.
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.lat().to_radians();
    let lat2 = b.lat().to_radians();
    let d_lat = (b.lat() - a.lat()).to_radians();
    let d_lon = (b.lon() - a.lon()).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    // Rounding can push h just past 1 for near-antipodal points
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// Minutes needed to walk `distance_km` at [`WALKING_SPEED_KMH`].
///
/// `distance_km` must not be negative.
pub fn walk_minutes(distance_km: f64) -> f64 {
    debug_assert!(distance_km >= 0.0, "negative distance {}", distance_km);
    (distance_km / WALKING_SPEED_KMH) * 60.0
}

/// Distance and walking time from the user to a selected facility
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TravelEstimate {
    pub distance_km: f64,
    pub walk_minutes: f64,
}

impl TravelEstimate {
    pub fn between(from: GeoPoint, to: GeoPoint) -> Self {
        let distance_km = distance_km(from, to);
        Self {
            distance_km,
            walk_minutes: walk_minutes(distance_km),
        }
    }

    /// Walking time rounded to whole minutes for display
    pub fn rounded_minutes(&self) -> u64 {
        self.walk_minutes.round() as u64
    }
}
