pub mod distance;
pub mod nearest;
pub mod projection;

pub use distance::{TravelEstimate, distance_km, walk_minutes};
pub use nearest::nearest;
pub use projection::CoordinateTransform;
