pub mod events;
pub mod export;
pub mod session;
pub mod state;
pub mod surface;

pub use events::{ClickBus, Subscription};
pub use export::{to_geojson, write_geojson};
pub use session::Session;
pub use state::{
    MapCommand, MapEvent, MapStateCoordinator, Phase, RouteRequest, RouteTicket, Selection,
};
pub use surface::{LogSurface, MapSurface};
