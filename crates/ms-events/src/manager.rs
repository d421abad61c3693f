//! `EventsManager`: synchronous, ordered dispatch.
//!
//! Engines never call handlers directly.  They append to the per-tick
//! buffer of the step context; the mobsim drains that buffer into
//! [`EventsManager::process_event`] after each engine step, so handlers see
//! exactly the emission order.

use ms_core::SimTime;
use tracing::debug;

use crate::{Event, EventHandler};

pub struct EventsManager {
    handlers: Vec<Box<dyn EventHandler>>,
    last_time: SimTime,
    processed: u64,
}

impl Default for EventsManager {
    fn default() -> Self {
        Self {
            handlers: Vec::new(),
            last_time: SimTime(f64::NEG_INFINITY),
            processed: 0,
        }
    }
}

impl EventsManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handlers are called in registration order.
    pub fn add_handler(&mut self, handler: Box<dyn EventHandler>) {
        self.handlers.push(handler);
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Dispatch one event to every handler.
    ///
    /// # Panics
    ///
    /// Panics if `event` is earlier than the previous event; engines only
    /// emit at the current clock time, so this is a scheduler defect.
    pub fn process_event(&mut self, event: Event) {
        assert!(
            event.time >= self.last_time,
            "event at {} after event at {}: {event}",
            event.time,
            self.last_time,
        );
        self.last_time = event.time;
        self.processed += 1;
        for h in &mut self.handlers {
            h.handle_event(&event);
        }
    }

    /// Dispatch a batch in order.
    pub fn process_all(&mut self, events: impl IntoIterator<Item = Event>) {
        for e in events {
            self.process_event(e);
        }
    }

    /// Start a new iteration: reset every handler and the ordering check.
    pub fn reset(&mut self, iteration: u32) {
        debug!(iteration, previous_events = self.processed, "resetting event handlers");
        self.last_time = SimTime(f64::NEG_INFINITY);
        self.processed = 0;
        for h in &mut self.handlers {
            h.reset(iteration);
        }
    }

    /// Events processed since the last reset.
    pub fn processed(&self) -> u64 {
        self.processed
    }
}
