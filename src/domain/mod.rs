pub mod facility;
pub mod point;
pub mod route;
pub mod shelters;

pub use facility::{Facility, FacilityKind, FacilityRef, Hospital, PoliceStation, Shelter};
pub use point::{GeoPoint, ProjectedPoint};
pub use route::RouteGeometry;
pub use shelters::ShelterCollection;
