use geo::Rect;

use crate::domain::{
    FacilityKind, FacilityRef, GeoPoint, Hospital, PoliceStation, RouteGeometry, Shelter,
    ShelterCollection,
};
use crate::geometry::{TravelEstimate, nearest};

/// Zoom used when flying to the automatically selected shelter
pub const AUTO_SELECT_ZOOM: f64 = 14.0;

/// Padding in pixels around user and facility when fitting the viewport
pub const FIT_PADDING_PX: u32 = 200;

/// Where the coordinator is in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No user location
    Idle,
    /// User location known, nothing selected yet
    Located,
    /// The one automatic nearest-shelter fix of the session
    ShelterAutoSelected,
    /// The user clicked a facility of this kind
    UserSelected(FacilityKind),
}

/// Whether the automatic nearest-shelter selection is still to come.
///
/// Fires at most once per session; a user click also consumes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AutoSelect {
    Armed,
    Done,
}

/// The single active facility selection. Selecting one kind replaces any other.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Selection {
    #[default]
    None,
    Shelter(Shelter),
    PoliceStation(PoliceStation),
    Hospital(Hospital),
}

impl Selection {
    pub fn kind(&self) -> Option<FacilityKind> {
        match self {
            Selection::None => None,
            Selection::Shelter(_) => Some(FacilityKind::Shelter),
            Selection::PoliceStation(_) => Some(FacilityKind::PoliceStation),
            Selection::Hospital(_) => Some(FacilityKind::Hospital),
        }
    }

    pub fn location(&self) -> Option<GeoPoint> {
        match self {
            Selection::None => None,
            Selection::Shelter(s) => Some(s.location),
            Selection::PoliceStation(p) => Some(p.location),
            Selection::Hospital(h) => Some(h.location),
        }
    }

    pub fn facility_ref(&self) -> Option<FacilityRef> {
        let id = match self {
            Selection::None => return None,
            Selection::Shelter(s) => s.id,
            Selection::PoliceStation(p) => p.id,
            Selection::Hospital(h) => h.id,
        };
        self.kind().map(|kind| FacilityRef::new(kind, id))
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Selection::None)
    }
}

/// Sequence number attached to each route request.
///
/// Only the response to the most recently issued ticket is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RouteTicket(u64);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteRequest {
    pub ticket: RouteTicket,
    pub start: GeoPoint,
    pub end: GeoPoint,
}

/// Inputs to the coordinator
#[derive(Debug, Clone)]
pub enum MapEvent {
    LocationFixed(GeoPoint),
    TrackingEnded,
    SheltersLoaded(ShelterCollection),
    PoliceStationsLoaded(Vec<PoliceStation>),
    HospitalsLoaded(Vec<Hospital>),
    FacilityClicked(FacilityRef),
    RouteArrived {
        ticket: RouteTicket,
        route: Option<RouteGeometry>,
    },
}

/// Outputs of the coordinator, applied by the session to the map and network
#[derive(Debug, Clone, PartialEq)]
pub enum MapCommand {
    RefreshLayer(FacilityKind),
    MoveUserMarker(Option<GeoPoint>),
    FlyTo { center: GeoPoint, zoom: f64 },
    FitBounds { bounds: Rect<f64>, padding: u32 },
    RequestRoute(RouteRequest),
    DrawRoute(RouteGeometry),
    ShowSelection {
        selection: Selection,
        travel: Option<TravelEstimate>,
    },
}

/// Owns all mutable map state: user location, facility layers, the current
/// selection and the current route.
///
/// Every event runs to completion in [`MapStateCoordinator::handle`] and
/// returns the commands it produced. Nothing else mutates this state.
#[derive(Debug)]
pub struct MapStateCoordinator {
    phase: Phase,
    auto_select: AutoSelect,
    user_location: Option<GeoPoint>,
    shelters: ShelterCollection,
    police_stations: Vec<PoliceStation>,
    hospitals: Vec<Hospital>,
    selection: Selection,
    /// Phase to return to when tracking resumes with a kept selection
    selection_phase: Option<Phase>,
    travel: Option<TravelEstimate>,
    route: Option<RouteGeometry>,
    last_ticket: u64,
}

impl Default for MapStateCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl MapStateCoordinator {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            auto_select: AutoSelect::Armed,
            user_location: None,
            shelters: ShelterCollection::new(),
            police_stations: Vec::new(),
            hospitals: Vec::new(),
            selection: Selection::None,
            selection_phase: None,
            travel: None,
            route: None,
            last_ticket: 0,
        }
    }

    pub fn handle(&mut self, event: MapEvent) -> Vec<MapCommand> {
        match event {
            MapEvent::LocationFixed(point) => self.on_location_fixed(point),
            MapEvent::TrackingEnded => self.on_tracking_ended(),
            MapEvent::SheltersLoaded(shelters) => {
                log::info!("Shelter layer loaded with {} shelters", shelters.len());
                self.shelters = shelters;
                let mut commands = vec![MapCommand::RefreshLayer(FacilityKind::Shelter)];
                commands.extend(self.try_auto_select());
                commands
            }
            MapEvent::PoliceStationsLoaded(stations) => {
                log::info!("Police layer loaded with {} stations", stations.len());
                self.police_stations = stations;
                vec![MapCommand::RefreshLayer(FacilityKind::PoliceStation)]
            }
            MapEvent::HospitalsLoaded(hospitals) => {
                log::info!("Hospital layer loaded with {} hospitals", hospitals.len());
                self.hospitals = hospitals;
                vec![MapCommand::RefreshLayer(FacilityKind::Hospital)]
            }
            MapEvent::FacilityClicked(facility) => self.on_facility_clicked(facility),
            MapEvent::RouteArrived { ticket, route } => self.on_route_arrived(ticket, route),
        }
    }

    fn on_location_fixed(&mut self, point: GeoPoint) -> Vec<MapCommand> {
        if self.user_location == Some(point) {
            return Vec::new();
        }

        self.user_location = Some(point);
        let mut commands = vec![MapCommand::MoveUserMarker(Some(point))];

        if self.phase == Phase::Idle {
            self.phase = self.selection_phase.unwrap_or(Phase::Located);
            log::debug!("Location acquired, phase {:?}", self.phase);
        }

        // Keep the distance readout live for a selection carried across fixes
        if let Some(target) = self.selection.location() {
            self.travel = Some(TravelEstimate::between(point, target));
            commands.push(self.show_selection());
        }

        commands.extend(self.try_auto_select());
        commands
    }

    fn on_tracking_ended(&mut self) -> Vec<MapCommand> {
        if self.phase == Phase::Idle && self.user_location.is_none() {
            return Vec::new();
        }

        log::info!("Location tracking ended");
        self.phase = Phase::Idle;
        self.user_location = None;
        self.travel = None;

        // Selection and route stay on screen without live positioning
        vec![MapCommand::MoveUserMarker(None), self.show_selection()]
    }

    fn try_auto_select(&mut self) -> Vec<MapCommand> {
        if self.auto_select != AutoSelect::Armed || self.phase != Phase::Located {
            return Vec::new();
        }
        let Some(user) = self.user_location else {
            return Vec::new();
        };
        let Some(shelter) = nearest(user, &self.shelters).cloned() else {
            log::debug!("No shelters available yet, automatic selection stays pending");
            return Vec::new();
        };

        log::info!("Nearest shelter is {} at {}", shelter.id, shelter.address);

        let target = shelter.location;
        self.auto_select = AutoSelect::Done;
        self.phase = Phase::ShelterAutoSelected;
        self.selection_phase = Some(Phase::ShelterAutoSelected);
        self.selection = Selection::Shelter(shelter);
        self.travel = Some(TravelEstimate::between(user, target));

        vec![
            self.show_selection(),
            MapCommand::RequestRoute(self.issue_route(user, target)),
            MapCommand::FlyTo {
                center: user.midpoint(&target),
                zoom: AUTO_SELECT_ZOOM,
            },
        ]
    }

    fn on_facility_clicked(&mut self, facility: FacilityRef) -> Vec<MapCommand> {
        let selection = match facility.kind {
            FacilityKind::Shelter => self
                .shelters
                .get(facility.id)
                .cloned()
                .map(Selection::Shelter),
            FacilityKind::PoliceStation => self
                .police_stations
                .iter()
                .find(|p| p.id == facility.id)
                .cloned()
                .map(Selection::PoliceStation),
            FacilityKind::Hospital => self
                .hospitals
                .iter()
                .find(|h| h.id == facility.id)
                .cloned()
                .map(Selection::Hospital),
        };

        let Some(selection) = selection else {
            log::warn!("Click on unknown {} {}, ignoring", facility.kind, facility.id);
            return Vec::new();
        };
        let Some(target) = selection.location() else {
            return Vec::new();
        };

        let phase = Phase::UserSelected(facility.kind);
        self.phase = phase;
        self.selection_phase = Some(phase);
        self.auto_select = AutoSelect::Done;
        self.selection = selection;

        let Some(user) = self.user_location else {
            log::debug!("No user location, showing {} without distance", facility.kind);
            self.travel = None;
            return vec![self.show_selection()];
        };

        self.travel = Some(TravelEstimate::between(user, target));
        vec![
            self.show_selection(),
            MapCommand::RequestRoute(self.issue_route(user, target)),
            MapCommand::FitBounds {
                bounds: Rect::new(user.to_coord(), target.to_coord()),
                padding: FIT_PADDING_PX,
            },
        ]
    }

    fn on_route_arrived(
        &mut self,
        ticket: RouteTicket,
        route: Option<RouteGeometry>,
    ) -> Vec<MapCommand> {
        if ticket.0 != self.last_ticket {
            log::debug!(
                "Discarding stale route response {:?} (latest is {})",
                ticket,
                self.last_ticket
            );
            return Vec::new();
        }

        match route {
            Some(route) => {
                self.route = Some(route.clone());
                vec![MapCommand::DrawRoute(route)]
            }
            None => {
                log::warn!("No route received, keeping the previous one");
                Vec::new()
            }
        }
    }

    fn issue_route(&mut self, start: GeoPoint, end: GeoPoint) -> RouteRequest {
        self.last_ticket += 1;
        RouteRequest {
            ticket: RouteTicket(self.last_ticket),
            start,
            end,
        }
    }

    fn show_selection(&self) -> MapCommand {
        MapCommand::ShowSelection {
            selection: self.selection.clone(),
            travel: self.travel,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn user_location(&self) -> Option<GeoPoint> {
        self.user_location
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn travel(&self) -> Option<TravelEstimate> {
        self.travel
    }

    pub fn route(&self) -> Option<&RouteGeometry> {
        self.route.as_ref()
    }

    pub fn shelters(&self) -> &ShelterCollection {
        &self.shelters
    }

    pub fn police_stations(&self) -> &[PoliceStation] {
        &self.police_stations
    }

    pub fn hospitals(&self) -> &[Hospital] {
        &self.hospitals
    }
}
