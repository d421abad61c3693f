//! Per-tick context handed to every engine call.
//!
//! The mobsim loop owns the clock, the agents and the event buffer, and
//! lends them to one engine at a time through a `StepContext`.  Engines keep
//! no references between calls.

use ms_agent::AgentStore;
use ms_core::{AgentId, SimTime};
use ms_events::{Event, EventKind, EventsManager};
use ms_network::Network;

// ── EventEmitter ──────────────────────────────────────────────────────────────

/// Anything events can be appended to.
pub trait EventEmitter {
    fn emit(&mut self, event: Event);

    fn emit_at(&mut self, time: SimTime, agent: AgentId, kind: EventKind) {
        self.emit(Event::new(time, agent, kind));
    }
}

impl EventEmitter for Vec<Event> {
    fn emit(&mut self, event: Event) {
        self.push(event);
    }
}

impl EventEmitter for EventsManager {
    fn emit(&mut self, event: Event) {
        self.process_event(event);
    }
}

// ── StepContext ───────────────────────────────────────────────────────────────

pub struct StepContext<'c, 'a> {
    /// Current clock time.
    pub now: SimTime,
    /// Zero-based index of the current tick.
    pub tick: u64,
    pub step_secs: f64,
    pub network: &'a Network,
    pub agents: &'c mut AgentStore<'a>,
    events: &'c mut Vec<Event>,
    released: &'c mut Vec<AgentId>,
}

impl<'c, 'a> StepContext<'c, 'a> {
    pub fn new(
        now: SimTime,
        tick: u64,
        step_secs: f64,
        network: &'a Network,
        agents: &'c mut AgentStore<'a>,
        events: &'c mut Vec<Event>,
        released: &'c mut Vec<AgentId>,
    ) -> Self {
        Self { now, tick, step_secs, network, agents, events, released }
    }

    /// Emit an event stamped with the current time.
    pub fn emit_now(&mut self, agent: AgentId, kind: EventKind) {
        let now = self.now;
        self.events.emit_at(now, agent, kind);
    }

    /// Hand `agent` back to the mobsim loop, which decides what it does
    /// next.  The engine must have released its custody first.
    pub fn release(&mut self, agent: AgentId) {
        self.released.push(agent);
    }
}

impl EventEmitter for StepContext<'_, '_> {
    fn emit(&mut self, event: Event) {
        self.events.push(event);
    }
}
