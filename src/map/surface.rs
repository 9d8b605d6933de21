use crate::map::state::{MapCommand, Selection};

/// Receiver of the coordinator's visual commands.
///
/// Route requests never reach a surface; the session handles those.
pub trait MapSurface {
    fn apply(&mut self, command: &MapCommand);
}

/// Surface that only logs what a map would render
#[derive(Debug, Default)]
pub struct LogSurface;

impl MapSurface for LogSurface {
    fn apply(&mut self, command: &MapCommand) {
        match command {
            MapCommand::RefreshLayer(kind) => log::debug!("Refresh layer {}", kind.layer_name()),
            MapCommand::MoveUserMarker(Some(p)) => {
                log::debug!("User marker at {:.5}, {:.5}", p.lat(), p.lon())
            }
            MapCommand::MoveUserMarker(None) => log::debug!("User marker removed"),
            MapCommand::FlyTo { center, zoom } => log::info!(
                "Fly to {:.5}, {:.5} at zoom {}",
                center.lat(),
                center.lon(),
                zoom
            ),
            MapCommand::FitBounds { bounds, padding } => log::info!(
                "Fit bounds {:?} - {:?} with {}px padding",
                bounds.min(),
                bounds.max(),
                padding
            ),
            MapCommand::DrawRoute(route) => {
                log::info!("Draw route with {} points", route.points().len())
            }
            MapCommand::ShowSelection { selection, travel } => {
                let label = match selection {
                    Selection::None => {
                        log::debug!("Selection cleared");
                        return;
                    }
                    Selection::Shelter(s) => format!("shelter {} ({})", s.id, s.address),
                    Selection::PoliceStation(p) => format!("police station {}", p.name),
                    Selection::Hospital(h) => format!("hospital {}", h.name),
                };
                match travel {
                    Some(t) => log::info!(
                        "Selected {}: {:.2} km, about {} min on foot",
                        label,
                        t.distance_km,
                        t.rounded_minutes()
                    ),
                    None => log::info!("Selected {}", label),
                }
            }
            MapCommand::RequestRoute(_) => {}
        }
    }
}
