use std::sync::{Arc, Mutex};
use std::time::Duration;

use shelter_locator::api::{FacilityData, RouteSource};
use shelter_locator::domain::{
    FacilityKind, FacilityRef, GeoPoint, Hospital, PoliceStation, RouteGeometry, Shelter,
};
use shelter_locator::map::{MapCommand, MapEvent, MapSurface, Phase, Selection, Session};

fn pt(lat: f64, lon: f64) -> GeoPoint {
    GeoPoint::from_lat_lon(lat, lon).unwrap()
}

/// Returns a straight two-point route, or nothing for destinations in `unroutable`
#[derive(Default)]
struct FakeRoutes {
    unroutable: Vec<GeoPoint>,
    calls: Mutex<Vec<(GeoPoint, GeoPoint)>>,
}

impl RouteSource for FakeRoutes {
    fn fetch_walking_route(&self, start: GeoPoint, end: GeoPoint) -> Option<RouteGeometry> {
        self.calls.lock().unwrap().push((start, end));
        if self.unroutable.contains(&end) {
            return None;
        }
        RouteGeometry::new(vec![start, end])
    }
}

struct PanickingRoutes;

impl RouteSource for PanickingRoutes {
    fn fetch_walking_route(&self, _start: GeoPoint, _end: GeoPoint) -> Option<RouteGeometry> {
        panic!("directions client blew up");
    }
}

#[derive(Default)]
struct RecordingSurface {
    commands: Vec<MapCommand>,
}

impl MapSurface for RecordingSurface {
    fn apply(&mut self, command: &MapCommand) {
        self.commands.push(command.clone());
    }
}

fn oslo_data() -> FacilityData {
    FacilityData {
        shelters: vec![
            Shelter {
                id: 1,
                location: pt(60.10, 10.80),
                address: "Nordre gate 1".to_string(),
                capacity: 400,
                population_served: Some(200),
                coverage_ratio: Some(200.0),
            },
            Shelter {
                id: 2,
                location: pt(59.92, 10.76),
                address: "Storgata 10".to_string(),
                capacity: 250,
                population_served: Some(500),
                coverage_ratio: Some(50.0),
            },
        ]
        .into_iter()
        .collect(),
        police_stations: vec![PoliceStation {
            id: 12,
            name: "Grønland politistasjon".to_string(),
            phone: Some("02800".to_string()),
            location: pt(59.912, 10.761),
        }],
        hospitals: vec![Hospital {
            id: 30,
            name: "Ullevål sykehus".to_string(),
            phone: None,
            location: pt(59.936, 10.738),
        }],
    }
}

fn session_with(routes: FakeRoutes) -> (Session<RecordingSurface>, Arc<FakeRoutes>) {
    let routes = Arc::new(routes);
    let session = Session::new(routes.clone(), RecordingSurface::default())
        .with_route_wait(Duration::from_secs(5));
    (session, routes)
}

#[test]
fn test_first_fix_selects_and_routes_to_nearest_shelter() {
    let (mut session, routes) = session_with(FakeRoutes::default());
    session.load(oslo_data());
    session.submit(MapEvent::LocationFixed(pt(59.91, 10.75)));

    assert!(session.run_until_idle());

    let state = session.state();
    assert_eq!(state.phase(), Phase::ShelterAutoSelected);
    assert!(matches!(state.selection(), Selection::Shelter(s) if s.id == 2));

    let travel = state.travel().unwrap();
    assert!((travel.distance_km - 1.244).abs() < 0.01);
    assert_eq!(travel.rounded_minutes(), 15);

    let route = state.route().unwrap();
    assert_eq!(route.start(), pt(59.91, 10.75));
    assert_eq!(route.end(), pt(59.92, 10.76));
    assert_eq!(routes.calls.lock().unwrap().len(), 1);

    let commands = &session.surface().commands;
    assert!(commands.iter().any(|c| matches!(c, MapCommand::FlyTo { .. })));
    assert!(commands.iter().any(|c| matches!(c, MapCommand::DrawRoute(_))));
    assert_eq!(
        commands
            .iter()
            .filter(|c| matches!(c, MapCommand::RefreshLayer(_)))
            .count(),
        3
    );
}

#[test]
fn test_unroutable_selection_keeps_previous_route() {
    let (mut session, _routes) = session_with(FakeRoutes {
        unroutable: vec![pt(59.936, 10.738)],
        ..Default::default()
    });
    session.load(oslo_data());
    session.submit(MapEvent::LocationFixed(pt(59.91, 10.75)));
    assert!(session.run_until_idle());
    let shelter_route = session.state().route().cloned().unwrap();

    session.click(FacilityRef::new(FacilityKind::Hospital, 30));
    assert!(session.run_until_idle());

    let state = session.state();
    assert!(matches!(state.selection(), Selection::Hospital(h) if h.id == 30));
    assert!(state.travel().is_some());
    assert_eq!(state.route(), Some(&shelter_route));
}

#[test]
fn test_police_click_replaces_shelter_selection() {
    let (mut session, _routes) = session_with(FakeRoutes::default());
    session.load(oslo_data());
    session.submit(MapEvent::LocationFixed(pt(59.91, 10.75)));
    session.process_pending();

    session.click(FacilityRef::new(FacilityKind::PoliceStation, 12));
    assert!(session.run_until_idle());

    let state = session.state();
    assert_eq!(state.phase(), Phase::UserSelected(FacilityKind::PoliceStation));
    assert!(matches!(state.selection(), Selection::PoliceStation(p) if p.id == 12));
    assert_eq!(state.route().unwrap().end(), pt(59.912, 10.761));
    assert!(
        session
            .surface()
            .commands
            .iter()
            .any(|c| matches!(c, MapCommand::FitBounds { .. }))
    );
}

#[test]
fn test_reselecting_same_shelter_is_idempotent() {
    let (mut session, routes) = session_with(FakeRoutes::default());
    session.load(oslo_data());
    session.submit(MapEvent::LocationFixed(pt(59.91, 10.75)));
    assert!(session.run_until_idle());
    let before = session.state().selection().clone();

    session.click(FacilityRef::new(FacilityKind::Shelter, 2));
    session.click(FacilityRef::new(FacilityKind::Shelter, 2));
    assert!(session.run_until_idle());

    assert_eq!(session.state().selection(), &before);
    assert_eq!(session.state().route().unwrap().end(), pt(59.92, 10.76));
    assert_eq!(routes.calls.lock().unwrap().len(), 3);
    assert_eq!(session.routes_in_flight(), 0);
}

#[test]
fn test_detached_layer_ignores_clicks() {
    let (mut session, _routes) = session_with(FakeRoutes::default());
    session.load(oslo_data());
    session.process_pending();
    assert_eq!(session.bus().handler_count(FacilityKind::Hospital), 1);

    session.detach(FacilityKind::Hospital);
    session.click(FacilityRef::new(FacilityKind::Hospital, 30));
    session.process_pending();

    assert_eq!(session.bus().handler_count(FacilityKind::Hospital), 0);
    assert!(session.state().selection().is_none());
}

#[test]
fn test_tracking_end_keeps_selection_and_route() {
    let (mut session, _routes) = session_with(FakeRoutes::default());
    session.load(oslo_data());
    session.submit(MapEvent::LocationFixed(pt(59.91, 10.75)));
    assert!(session.run_until_idle());

    session.submit(MapEvent::TrackingEnded);
    session.process_pending();

    let state = session.state();
    assert_eq!(state.phase(), Phase::Idle);
    assert!(state.user_location().is_none());
    assert!(state.travel().is_none());
    assert!(matches!(state.selection(), Selection::Shelter(s) if s.id == 2));
    assert!(state.route().is_some());
}

#[test]
fn test_no_location_means_no_selection() {
    let (mut session, routes) = session_with(FakeRoutes::default());
    session.load(oslo_data());
    assert!(session.run_until_idle());

    assert_eq!(session.state().phase(), Phase::Idle);
    assert!(session.state().selection().is_none());
    assert!(routes.calls.lock().unwrap().is_empty());
}

#[test]
fn test_panicking_route_source_still_settles() {
    let mut session = Session::new(Arc::new(PanickingRoutes), RecordingSurface::default())
        .with_route_wait(Duration::from_secs(5));
    session.load(oslo_data());
    session.submit(MapEvent::LocationFixed(pt(59.91, 10.75)));

    assert!(session.run_until_idle());

    assert_eq!(session.routes_in_flight(), 0);
    assert!(session.state().route().is_none());
    assert!(matches!(session.state().selection(), Selection::Shelter(s) if s.id == 2));
}
