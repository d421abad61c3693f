//! Unit tests for ms-events.

#[cfg(test)]
mod manager {
    use std::cell::RefCell;
    use std::rc::Rc;

    use ms_core::{AgentId, LinkId, SimTime, TransportMode};
    use crate::{Event, EventHandler, EventKind, EventRecorder, EventsManager};

    fn departure(t: f64, agent: u32) -> Event {
        Event::new(
            SimTime(t),
            AgentId(agent),
            EventKind::PersonDeparture { link: LinkId(0), mode: TransportMode::Car },
        )
    }

    #[test]
    fn dispatch_in_order_to_all_handlers() {
        let mut em = EventsManager::new();
        let a = EventRecorder::shared();
        let b = EventRecorder::shared();
        em.add_handler(Box::new(a.clone()));
        em.add_handler(Box::new(b.clone()));

        em.process_all([departure(1.0, 2), departure(1.0, 1), departure(3.0, 0)]);

        let agents: Vec<u32> = a.borrow().events().iter().map(|e| e.agent.0).collect();
        assert_eq!(agents, vec![2, 1, 0]);
        assert_eq!(a.borrow().events(), b.borrow().events());
        assert_eq!(em.processed(), 3);
    }

    #[test]
    #[should_panic(expected = "after event")]
    fn rejects_time_going_backwards() {
        let mut em = EventsManager::new();
        em.process_event(departure(5.0, 0));
        em.process_event(departure(4.0, 0));
    }

    #[test]
    fn reset_clears_and_reaches_handlers() {
        struct Resets(Vec<u32>);
        impl EventHandler for Resets {
            fn handle_event(&mut self, _event: &Event) {}
            fn reset(&mut self, iteration: u32) {
                self.0.push(iteration);
            }
        }

        let mut em = EventsManager::new();
        let resets = Rc::new(RefCell::new(Resets(Vec::new())));
        let rec = EventRecorder::shared();
        em.add_handler(Box::new(resets.clone()));
        em.add_handler(Box::new(rec.clone()));

        em.process_event(departure(100.0, 0));
        em.reset(1);
        // Time starts over in a new iteration.
        em.process_event(departure(0.0, 0));

        assert_eq!(resets.borrow().0, vec![1]);
        assert_eq!(rec.borrow().events().len(), 1);
        assert_eq!(em.processed(), 1);
    }
}

#[cfg(test)]
mod event {
    use ms_core::{AgentId, LinkId, SimTime, TransportMode};
    use crate::{Event, EventKind};

    #[test]
    fn link_accessor() {
        let e = Event::new(SimTime(1.0), AgentId(0), EventKind::LinkEnter { link: LinkId(4) });
        assert_eq!(e.link(), Some(LinkId(4)));
        let t = Event::new(
            SimTime(1.0),
            AgentId(0),
            EventKind::TeleportationArrival { mode: TransportMode::Walk, distance_m: 10.0 },
        );
        assert_eq!(t.link(), None);
        let s = Event::new(SimTime(1.0), AgentId(0), EventKind::PersonStuck { link: None, mode: None });
        assert!(s.is_stuck());
        assert!(!e.is_stuck());
    }

    #[test]
    fn display() {
        let e = Event::new(SimTime(7.0), AgentId(3), EventKind::LinkLeave { link: LinkId(1) });
        assert_eq!(e.to_string(), "7 AgentId(3) left link LinkId(1)");
    }
}
