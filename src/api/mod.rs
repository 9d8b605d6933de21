pub mod datastore;
pub mod directions;
pub mod incidents;
pub mod nominatim;

pub use datastore::{FacilityData, FacilityDataGateway};
pub use directions::{RouteGateway, RouteSource};
pub use incidents::{IncidentClient, IncidentMessage};
pub use nominatim::{Geocoder, ReverseGeocode};
