//! Event consumers.

use std::cell::RefCell;
use std::rc::Rc;

use crate::Event;

/// Receives every event, in order, read-only.
///
/// `reset` is called once at the start of every iteration, before the first
/// event of that iteration.
pub trait EventHandler {
    fn handle_event(&mut self, event: &Event);

    fn reset(&mut self, _iteration: u32) {}
}

/// Lets a caller keep a handle on a handler after registering it.
impl<H: EventHandler + ?Sized> EventHandler for Rc<RefCell<H>> {
    fn handle_event(&mut self, event: &Event) {
        self.borrow_mut().handle_event(event);
    }

    fn reset(&mut self, iteration: u32) {
        self.borrow_mut().reset(iteration);
    }
}

/// Keeps a copy of every event of the current iteration.
#[derive(Default, Debug)]
pub struct EventRecorder {
    events: Vec<Event>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A recorder wrapped for registration with an `EventsManager`.
    pub fn shared() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::new()))
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn take(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}

impl EventHandler for EventRecorder {
    fn handle_event(&mut self, event: &Event) {
        self.events.push(event.clone());
    }

    fn reset(&mut self, _iteration: u32) {
        self.events.clear();
    }
}
