use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::domain::{FacilityKind, FacilityRef};

type Handler = Rc<RefCell<dyn FnMut(FacilityRef)>>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    handlers: Vec<(u64, FacilityKind, Handler)>,
}

/// Dispatches facility clicks to the handlers registered for that layer.
///
/// Handlers live exactly as long as the [`Subscription`] returned by
/// [`ClickBus::subscribe`]; dropping it detaches the handler.
#[derive(Clone, Default)]
pub struct ClickBus {
    registry: Rc<RefCell<Registry>>,
}

impl ClickBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, kind: FacilityKind, handler: F) -> Subscription
    where
        F: FnMut(FacilityRef) + 'static,
    {
        let mut registry = self.registry.borrow_mut();
        registry.next_id += 1;
        let id = registry.next_id;
        registry
            .handlers
            .push((id, kind, Rc::new(RefCell::new(handler))));

        Subscription {
            id,
            kind,
            registry: Rc::downgrade(&self.registry),
        }
    }

    /// Deliver a click to every handler of its layer. Returns how many ran.
    pub fn emit(&self, facility: FacilityRef) -> usize {
        // Snapshot first so handlers may subscribe or unsubscribe while running
        let handlers: Vec<Handler> = self
            .registry
            .borrow()
            .handlers
            .iter()
            .filter(|(_, kind, _)| *kind == facility.kind)
            .map(|(_, _, handler)| Rc::clone(handler))
            .collect();

        let mut delivered = 0;
        for handler in handlers {
            match handler.try_borrow_mut() {
                Ok(mut handler) => {
                    (*handler)(facility);
                    delivered += 1;
                }
                Err(_) => log::warn!("Skipping re-entrant click handler for {}", facility.kind),
            }
        }
        delivered
    }

    pub fn handler_count(&self, kind: FacilityKind) -> usize {
        self.registry
            .borrow()
            .handlers
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .count()
    }
}

/// Handle for a registered click handler
#[must_use = "dropping a Subscription detaches its handler"]
pub struct Subscription {
    id: u64,
    kind: FacilityKind,
    registry: Weak<RefCell<Registry>>,
}

impl Subscription {
    pub fn kind(&self) -> FacilityKind {
        self.kind
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry
                .borrow_mut()
                .handlers
                .retain(|(id, _, _)| *id != self.id);
            log::debug!("Detached {} click handler {}", self.kind, self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_emit_reaches_matching_layer_only() {
        let bus = ClickBus::new();
        let shelter_clicks = Rc::new(Cell::new(0));
        let hospital_clicks = Rc::new(Cell::new(0));

        let counter = Rc::clone(&shelter_clicks);
        let _s = bus.subscribe(FacilityKind::Shelter, move |_| counter.set(counter.get() + 1));
        let counter = Rc::clone(&hospital_clicks);
        let _h = bus.subscribe(FacilityKind::Hospital, move |_| counter.set(counter.get() + 1));

        assert_eq!(bus.emit(FacilityRef::new(FacilityKind::Shelter, 7)), 1);
        assert_eq!(shelter_clicks.get(), 1);
        assert_eq!(hospital_clicks.get(), 0);
    }

    #[test]
    fn test_drop_detaches_handler() {
        let bus = ClickBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let sink = Rc::clone(&seen);
        let subscription = bus.subscribe(FacilityKind::PoliceStation, move |f| {
            sink.borrow_mut().push(f.id)
        });
        bus.emit(FacilityRef::new(FacilityKind::PoliceStation, 1));
        assert_eq!(bus.handler_count(FacilityKind::PoliceStation), 1);

        drop(subscription);
        assert_eq!(bus.handler_count(FacilityKind::PoliceStation), 0);
        assert_eq!(bus.emit(FacilityRef::new(FacilityKind::PoliceStation, 2)), 0);
        assert_eq!(*seen.borrow(), vec![1]);
    }

    #[test]
    fn test_resubscribe_does_not_duplicate() {
        let bus = ClickBus::new();
        let calls = Rc::new(Cell::new(0));

        for _ in 0..3 {
            let counter = Rc::clone(&calls);
            let subscription =
                bus.subscribe(FacilityKind::Shelter, move |_| counter.set(counter.get() + 1));
            drop(subscription);
        }
        let counter = Rc::clone(&calls);
        let _live = bus.subscribe(FacilityKind::Shelter, move |_| counter.set(counter.get() + 1));

        bus.emit(FacilityRef::new(FacilityKind::Shelter, 1));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_subscription_outliving_bus() {
        let bus = ClickBus::new();
        let subscription = bus.subscribe(FacilityKind::Hospital, |_| {});
        drop(bus);
        drop(subscription);
    }
}
