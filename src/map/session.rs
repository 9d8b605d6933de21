use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use crate::api::{FacilityData, RouteSource};
use crate::domain::{FacilityKind, FacilityRef};
use crate::map::events::{ClickBus, Subscription};
use crate::map::state::{MapCommand, MapEvent, MapStateCoordinator, RouteRequest};
use crate::map::surface::MapSurface;

/// How long [`Session::run_until_idle`] waits for an outstanding route
pub const DEFAULT_ROUTE_WAIT: Duration = Duration::from_secs(20);

/// Drives a [`MapStateCoordinator`] from a single event queue.
///
/// Data loads, location fixes, clicks and route responses all become
/// [`MapEvent`]s on one channel and are handled one at a time on the thread
/// that owns the session. Route fetches run on worker threads and report back
/// through the same channel.
pub struct Session<S: MapSurface> {
    state: MapStateCoordinator,
    surface: S,
    routes: Arc<dyn RouteSource>,
    bus: ClickBus,
    subscriptions: Vec<Subscription>,
    tx: Sender<MapEvent>,
    rx: Receiver<MapEvent>,
    routes_in_flight: usize,
    route_wait: Duration,
}

impl<S: MapSurface> Session<S> {
    pub fn new(routes: Arc<dyn RouteSource>, surface: S) -> Self {
        let (tx, rx) = mpsc::channel();
        let bus = ClickBus::new();

        let subscriptions = FacilityKind::ALL
            .iter()
            .map(|&kind| {
                let tx = tx.clone();
                bus.subscribe(kind, move |facility| {
                    let _ = tx.send(MapEvent::FacilityClicked(facility));
                })
            })
            .collect();

        Self {
            state: MapStateCoordinator::new(),
            surface,
            routes,
            bus,
            subscriptions,
            tx,
            rx,
            routes_in_flight: 0,
            route_wait: DEFAULT_ROUTE_WAIT,
        }
    }

    pub fn with_route_wait(mut self, wait: Duration) -> Self {
        self.route_wait = wait;
        self
    }

    /// Sender for feeding events from other threads (location provider, loaders)
    pub fn sender(&self) -> Sender<MapEvent> {
        self.tx.clone()
    }

    pub fn bus(&self) -> &ClickBus {
        &self.bus
    }

    pub fn state(&self) -> &MapStateCoordinator {
        &self.state
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn routes_in_flight(&self) -> usize {
        self.routes_in_flight
    }

    /// Queue the three facility layers as load events
    pub fn load(&mut self, data: FacilityData) {
        self.submit(MapEvent::SheltersLoaded(data.shelters));
        self.submit(MapEvent::PoliceStationsLoaded(data.police_stations));
        self.submit(MapEvent::HospitalsLoaded(data.hospitals));
    }

    pub fn submit(&mut self, event: MapEvent) {
        // The session holds a receiver, so this cannot fail
        let _ = self.tx.send(event);
    }

    /// Simulate a click on a rendered facility
    pub fn click(&mut self, facility: FacilityRef) {
        if self.bus.emit(facility) == 0 {
            log::debug!("No handler for {} clicks", facility.kind);
        }
    }

    /// Stop listening for clicks on `kind`
    pub fn detach(&mut self, kind: FacilityKind) {
        self.subscriptions.retain(|s| s.kind() != kind);
    }

    /// Handle every queued event without waiting for routes
    pub fn process_pending(&mut self) {
        while let Ok(event) = self.rx.try_recv() {
            self.dispatch(event);
        }
    }

    /// Handle queued events, then keep going until no route is outstanding.
    ///
    /// Returns false if a route did not arrive within the wait limit.
    pub fn run_until_idle(&mut self) -> bool {
        loop {
            self.process_pending();
            if self.routes_in_flight == 0 {
                return true;
            }

            match self.rx.recv_timeout(self.route_wait) {
                Ok(event) => self.dispatch(event),
                Err(RecvTimeoutError::Timeout) => {
                    log::warn!(
                        "Gave up waiting for {} route response(s)",
                        self.routes_in_flight
                    );
                    return false;
                }
                Err(RecvTimeoutError::Disconnected) => return false,
            }
        }
    }

    fn dispatch(&mut self, event: MapEvent) {
        if matches!(event, MapEvent::RouteArrived { .. }) {
            self.routes_in_flight = self.routes_in_flight.saturating_sub(1);
        }

        for command in self.state.handle(event) {
            match command {
                MapCommand::RequestRoute(request) => self.spawn_route_fetch(request),
                other => self.surface.apply(&other),
            }
        }
    }

    fn spawn_route_fetch(&mut self, request: RouteRequest) {
        let routes = Arc::clone(&self.routes);
        let tx = self.tx.clone();
        self.routes_in_flight += 1;

        log::debug!("Requesting route {:?}", request.ticket);
        thread::spawn(move || {
            // Always report back so the in-flight count cannot leak
            let route = panic::catch_unwind(AssertUnwindSafe(|| {
                routes.fetch_walking_route(request.start, request.end)
            }))
            .unwrap_or_else(|_| {
                log::error!("Route source panicked on {:?}", request.ticket);
                None
            });
            let _ = tx.send(MapEvent::RouteArrived {
                ticket: request.ticket,
                route,
            });
        });
    }
}
