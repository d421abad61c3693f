//! `TeleportationEngine`: legs that are not simulated on the network.
//!
//! # Ordering
//!
//! Agents wait in a binary heap keyed by arrival time.  Equal arrival times
//! dequeue the larger `AgentId` first, so the release order is a total
//! order that does not depend on insertion order.
//!
//! # Travel time
//!
//! ```text
//! travel = max(expected, beeline(origin, destination) / speed)
//! ```
//!
//! `expected` comes from the router and must be present.  Modes configured
//! without a speed use `expected` alone.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ms_agent::{Holder, MobsimAgent};
use ms_core::{AgentId, LinkId, ModeSet, QSimConfig, RoutingConfig, SimTime, TransportMode};
use ms_events::EventKind;
use ms_network::Network;
use tracing::debug;

use crate::{DepartureHandler, MobsimError, MobsimResult, StepContext, Steppable};

// ── Entry ─────────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug)]
struct Entry {
    arrival: SimTime,
    agent: AgentId,
    mode: TransportMode,
    distance_m: f64,
}

/// Max-heap order: the entry that should leave first is the greatest.
impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .arrival
            .cmp(&self.arrival)
            .then(self.agent.cmp(&other.agent))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

// ── TeleportationEngine ───────────────────────────────────────────────────────

pub struct TeleportationEngine {
    queue: BinaryHeap<Entry>,
    /// `Some(speed)` for every teleported mode; `Some(None)` if it has no speed.
    teleported: [Option<Option<f64>>; TransportMode::ALL.len()],
    network_modes: ModeSet,
}

impl TeleportationEngine {
    pub fn new(qsim: &QSimConfig, routing: &RoutingConfig) -> Self {
        let mut teleported = [None; TransportMode::ALL.len()];
        for p in &routing.teleported_modes {
            teleported[p.mode.index()] = Some(p.speed_mps);
        }
        Self {
            queue: BinaryHeap::new(),
            teleported,
            network_modes: qsim.network_modes.iter().copied().collect(),
        }
    }

    /// Travel time for `agent`'s current leg, departing now.
    fn travel_time(
        &self,
        agent: &MobsimAgent<'_>,
        network: &Network,
        mode: TransportMode,
    ) -> MobsimResult<f64> {
        let expected = agent
            .expected_travel_time()
            .ok_or(MobsimError::UndefinedTravelTime { agent: agent.id(), mode })?;
        let Some(Some(speed)) = self.teleported[mode.index()] else {
            return Ok(expected);
        };
        let coord_of = |act: Option<&ms_population::Activity>| {
            act.and_then(|a| a.coord.or_else(|| a.link.map(|l| network.link_to_coord(l))))
        };
        match (coord_of(agent.origin_activity()), coord_of(agent.destination_activity())) {
            (Some(from), Some(to)) => Ok((from.distance(to) / speed).max(expected)),
            _ => Ok(expected),
        }
    }

    /// Arrival time of the next agent due, if any.
    pub fn next_arrival(&self) -> Option<SimTime> {
        self.queue.peek().map(|e| e.arrival)
    }

    /// Queued agents in release order.
    pub fn queued(&self) -> Vec<(SimTime, AgentId)> {
        let mut v: Vec<Entry> = self.queue.iter().copied().collect();
        v.sort_by(|a, b| b.cmp(a));
        v.into_iter().map(|e| (e.arrival, e.agent)).collect()
    }
}

impl DepartureHandler for TeleportationEngine {
    fn handle_departure(
        &mut self,
        ctx: &mut StepContext<'_, '_>,
        id: AgentId,
        _link: LinkId,
    ) -> MobsimResult<bool> {
        let agent = ctx.agents.get(id)?;
        let Some(mode) = agent.mode() else {
            return Ok(false);
        };
        let accepts = self.teleported[mode.index()].is_some()
            || (self.network_modes.contains(mode) && agent.is_same_link_leg());
        if !accepts {
            return Ok(false);
        }

        let travel = self.travel_time(agent, ctx.network, mode)?;
        let entry = Entry {
            arrival: ctx.now + travel,
            agent: id,
            mode,
            distance_m: agent.expected_distance(),
        };
        ctx.agents.get_mut(id)?.claim(Holder::Teleportation);
        self.queue.push(entry);
        Ok(true)
    }
}

impl Steppable for TeleportationEngine {
    fn name(&self) -> &'static str {
        "teleportation"
    }

    fn do_sim_step(&mut self, ctx: &mut StepContext<'_, '_>) -> MobsimResult<()> {
        while let Some(head) = self.queue.peek() {
            if head.arrival > ctx.now {
                break;
            }
            let Some(e) = self.queue.pop() else { break };
            let agent = ctx.agents.get_mut(e.agent)?;
            agent.release(Holder::Teleportation);
            if let Some(dest) = agent.destination_link() {
                agent.notify_arrival_on_link_by_non_network_mode(dest);
            }
            ctx.emit_now(
                e.agent,
                EventKind::TeleportationArrival { mode: e.mode, distance_m: e.distance_m },
            );
            ctx.release(e.agent);
        }
        Ok(())
    }

    fn after_sim(&mut self, ctx: &mut StepContext<'_, '_>) -> MobsimResult<()> {
        debug!(remaining = self.queue.len(), "teleportation engine draining");
        while let Some(e) = self.queue.pop() {
            let agent = ctx.agents.get_mut(e.agent)?;
            agent.release(Holder::Teleportation);
            // Reported where the leg was heading.
            let link = agent.destination_link().unwrap_or(agent.current_link());
            agent.abort();
            ctx.emit_now(e.agent, EventKind::PersonStuck { link: Some(link), mode: Some(e.mode) });
        }
        Ok(())
    }

    fn held(&self) -> usize {
        self.queue.len()
    }
}
