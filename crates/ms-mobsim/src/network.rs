//! `NetworkEngine`: the queue model for network modes.
//!
//! # Link model
//!
//! Every link is a FIFO queue of vehicles plus a waiting list of vehicles
//! that departed on the link and wait to enter traffic.  A vehicle entering
//! a link may leave it no earlier than
//!
//! ```text
//! earliest_exit = enter_time + max(free_travel_time, step)
//! ```
//!
//! Leaving over the downstream node additionally needs
//!
//! - outflow capacity: each link refills a budget of
//!   `capacity_vph / 3600 * step * flow_factor` vehicles per tick (never
//!   above one tick's worth) and releases while the budget is positive, so
//!   fractional capacities carry over as a negative remainder;
//! - storage on the next link: a link never holds more vehicles than
//!   `max(length * lanes * storage_factor / cell_size,
//!   free_travel_time * flow_per_sec, flow_per_step, 1)`.
//!
//! A blocked head blocks everything behind it.  Vehicles that reached the
//! last link of their route leave traffic as soon as they reach its end;
//! that does not use outflow capacity.
//!
//! # Tick order
//!
//! 1. Arrivals on every active link, ascending `LinkId`.
//! 2. Node crossings, ascending `NodeId`; at each node the incoming links
//!    ascending by `LinkId`; per link first vehicles already in traffic,
//!    then the waiting list.

use std::collections::{BTreeSet, VecDeque};

use ms_agent::Holder;
use ms_core::{AgentId, CoreError, LinkId, ModeSet, NodeId, QSimConfig, SimTime, TransportMode};
use ms_events::EventKind;
use ms_network::Network;
use tracing::debug;

use crate::{DepartureHandler, MobsimError, MobsimResult, StepContext, Steppable};

// ── QVehicle / QLink ──────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug)]
struct QVehicle {
    driver: AgentId,
    mode: TransportMode,
    earliest_exit: SimTime,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Lane {
    Queue,
    Waiting,
}

/// Dynamic state of one link.
#[derive(Debug)]
pub struct QLink {
    free_tt: f64,
    flow_cap: f64,
    storage_cap: f64,
    flow_budget: f64,
    refilled_at: Option<u64>,
    queue: VecDeque<QVehicle>,
    waiting: VecDeque<QVehicle>,
    queue_blocked_since: Option<SimTime>,
    wait_blocked_since: Option<SimTime>,
}

impl QLink {
    fn new(network: &Network, link: LinkId, qsim: &QSimConfig) -> Self {
        let i = link.index();
        let flow_per_sec = network.link_capacity_vph[i] / 3_600.0 * qsim.flow_capacity_factor;
        let flow_cap = flow_per_sec * qsim.time_step_secs;
        let free_tt = network.free_travel_time(link);
        let storage_cap = (network.link_length_m[i] * network.link_lanes[i]
            * qsim.storage_capacity_factor
            / qsim.effective_cell_size_m)
            .max(free_tt * flow_per_sec)
            .max(flow_cap)
            .max(1.0);
        Self {
            free_tt,
            flow_cap,
            storage_cap,
            flow_budget: 0.0,
            refilled_at: None,
            queue: VecDeque::new(),
            waiting: VecDeque::new(),
            queue_blocked_since: None,
            wait_blocked_since: None,
        }
    }

    /// Add the outflow capacity of the ticks since the last refill.
    fn refill(&mut self, tick: u64) {
        let elapsed = match self.refilled_at {
            Some(t) if t == tick => return,
            Some(t) => tick.saturating_sub(t) as f64,
            None => 1.0,
        };
        self.flow_budget = (self.flow_budget + self.flow_cap * elapsed).min(self.flow_cap);
        self.refilled_at = Some(tick);
    }

    #[inline]
    fn has_space(&self) -> bool {
        ((self.queue.len() + 1) as f64) <= self.storage_cap
    }

    #[inline]
    fn is_idle(&self) -> bool {
        self.queue.is_empty() && self.waiting.is_empty()
    }

    fn lane(&self, lane: Lane) -> &VecDeque<QVehicle> {
        match lane {
            Lane::Queue => &self.queue,
            Lane::Waiting => &self.waiting,
        }
    }

    fn lane_mut(&mut self, lane: Lane) -> (&mut VecDeque<QVehicle>, &mut Option<SimTime>) {
        match lane {
            Lane::Queue => (&mut self.queue, &mut self.queue_blocked_since),
            Lane::Waiting => (&mut self.waiting, &mut self.wait_blocked_since),
        }
    }

    /// Vehicles on the link (waiting list excluded).
    pub fn occupancy(&self) -> usize {
        self.queue.len()
    }

    /// Vehicles waiting to enter traffic from this link.
    pub fn waiting(&self) -> usize {
        self.waiting.len()
    }

    pub fn storage_capacity(&self) -> f64 {
        self.storage_cap
    }

    /// Outflow capacity in vehicles per tick.
    pub fn flow_capacity(&self) -> f64 {
        self.flow_cap
    }
}

// ── NetworkEngine ─────────────────────────────────────────────────────────────

pub struct NetworkEngine {
    links: Vec<QLink>,
    /// Links with at least one vehicle, queued or waiting.
    active: BTreeSet<LinkId>,
    network_modes: ModeSet,
    stuck_time: f64,
    remove_stuck: bool,
    held: usize,
}

impl NetworkEngine {
    pub fn new(network: &Network, qsim: &QSimConfig) -> Self {
        Self {
            links: network.link_ids().map(|l| QLink::new(network, l, qsim)).collect(),
            active: BTreeSet::new(),
            network_modes: qsim.network_modes.iter().copied().collect(),
            stuck_time: qsim.stuck_time_secs,
            remove_stuck: qsim.remove_stuck_vehicles,
            held: 0,
        }
    }

    pub fn link(&self, link: LinkId) -> Option<&QLink> {
        self.links.get(link.index())
    }

    pub fn occupancy(&self, link: LinkId) -> usize {
        self.link(link).map_or(0, QLink::occupancy)
    }

    pub fn storage_capacity(&self, link: LinkId) -> f64 {
        self.link(link).map_or(0.0, QLink::storage_capacity)
    }

    /// Iterator over `(LinkId, &QLink)` for every link with vehicles.
    pub fn active_links(&self) -> impl Iterator<Item = (LinkId, &QLink)> {
        self.active.iter().map(|&l| (l, &self.links[l.index()]))
    }

    // ── Moves ─────────────────────────────────────────────────────────────

    /// Let vehicles at the head of `l` that finished their route leave traffic.
    fn move_arrivals(&mut self, l: LinkId, ctx: &mut StepContext<'_, '_>) -> MobsimResult<()> {
        loop {
            let link = &mut self.links[l.index()];
            let Some(&head) = link.queue.front() else { break };
            if head.earliest_exit > ctx.now
                || !ctx.agents.get(head.driver)?.wants_to_arrive_on_current_link()
            {
                break;
            }
            link.queue.pop_front();
            link.queue_blocked_since = None;
            self.held -= 1;

            ctx.agents.get_mut(head.driver)?.release(Holder::Network);
            ctx.emit_now(head.driver, EventKind::VehicleLeavesTraffic { link: l, mode: head.mode });
            ctx.release(head.driver);
        }
        Ok(())
    }

    /// Move vehicles of `l` over its downstream node.
    fn move_over_node(&mut self, l: LinkId, ctx: &mut StepContext<'_, '_>) -> MobsimResult<()> {
        self.links[l.index()].refill(ctx.tick);
        while self.try_cross(l, Lane::Queue, ctx)? {}
        while self.try_cross(l, Lane::Waiting, ctx)? {}
        Ok(())
    }

    /// Try to move the head of `lane` on `l` to its next link.  Returns
    /// `true` if the head left the lane (moved on or removed as stuck).
    fn try_cross(
        &mut self,
        l: LinkId,
        lane: Lane,
        ctx: &mut StepContext<'_, '_>,
    ) -> MobsimResult<bool> {
        let link = &self.links[l.index()];
        let Some(&head) = link.lane(lane).front() else { return Ok(false) };
        if lane == Lane::Queue && head.earliest_exit > ctx.now {
            return Ok(false);
        }
        if link.flow_budget <= 0.0 {
            return Ok(false);
        }
        let Some(next) = ctx.agents.get(head.driver)?.choose_next_link() else {
            return Ok(false);
        };
        let next_link = self
            .links
            .get(next.index())
            .ok_or(CoreError::LinkNotFound(next))?;
        if !next_link.has_space() {
            return self.handle_blocked(l, lane, head, ctx);
        }

        let link = &mut self.links[l.index()];
        let (vehicles, blocked_since) = link.lane_mut(lane);
        vehicles.pop_front();
        *blocked_since = None;
        link.flow_budget -= 1.0;

        if lane == Lane::Waiting {
            ctx.emit_now(head.driver, EventKind::VehicleEntersTraffic { link: l, mode: head.mode });
        }
        ctx.emit_now(head.driver, EventKind::LinkLeave { link: l });
        ctx.agents.get_mut(head.driver)?.notify_move_over_node(next);
        ctx.emit_now(head.driver, EventKind::LinkEnter { link: next });

        let next_link = &mut self.links[next.index()];
        let earliest_exit = ctx.now + next_link.free_tt.max(ctx.step_secs);
        next_link.queue.push_back(QVehicle { earliest_exit, ..head });
        debug_assert!(next_link.queue.len() as f64 <= next_link.storage_cap);
        self.active.insert(next);
        Ok(true)
    }

    /// The head of `lane` cannot enter its full next link.  Removes it once it
    /// has waited longer than the stuck time, if stuck removal is enabled.
    fn handle_blocked(
        &mut self,
        l: LinkId,
        lane: Lane,
        head: QVehicle,
        ctx: &mut StepContext<'_, '_>,
    ) -> MobsimResult<bool> {
        let (vehicles, blocked_since) = self.links[l.index()].lane_mut(lane);
        let since = *blocked_since.get_or_insert(ctx.now);
        if !self.remove_stuck || ctx.now - since < self.stuck_time {
            return Ok(false);
        }
        vehicles.pop_front();
        *blocked_since = None;
        self.held -= 1;

        let agent = ctx.agents.get_mut(head.driver)?;
        agent.release(Holder::Network);
        agent.abort();
        debug!(agent = %head.driver, link = %l, "removing stuck vehicle");
        ctx.emit_now(head.driver, EventKind::PersonStuck { link: Some(l), mode: Some(head.mode) });
        Ok(true)
    }
}

impl DepartureHandler for NetworkEngine {
    fn handle_departure(
        &mut self,
        ctx: &mut StepContext<'_, '_>,
        id: AgentId,
        link: LinkId,
    ) -> MobsimResult<bool> {
        let agent = ctx.agents.get(id)?;
        let Some(mode) = agent.mode() else { return Ok(false) };
        if !self.network_modes.contains(mode) || agent.is_same_link_leg() {
            return Ok(false);
        }
        if agent.choose_next_link().is_none() {
            return Err(MobsimError::MissingRoute { agent: id, mode });
        }
        let qlink = self
            .links
            .get_mut(link.index())
            .ok_or(CoreError::LinkNotFound(link))?;
        qlink.waiting.push_back(QVehicle { driver: id, mode, earliest_exit: ctx.now });
        ctx.agents.get_mut(id)?.claim(Holder::Network);
        self.active.insert(link);
        self.held += 1;
        Ok(true)
    }
}

impl Steppable for NetworkEngine {
    fn name(&self) -> &'static str {
        "network"
    }

    fn do_sim_step(&mut self, ctx: &mut StepContext<'_, '_>) -> MobsimResult<()> {
        if self.active.is_empty() {
            return Ok(());
        }
        let network = ctx.network;
        let links: Vec<LinkId> = self.active.iter().copied().collect();
        for &l in &links {
            self.move_arrivals(l, ctx)?;
        }

        let nodes: BTreeSet<NodeId> = links.iter().map(|l| network.link_to[l.index()]).collect();
        for node in nodes {
            for &l in network.in_links(node) {
                if !self.links[l.index()].is_idle() {
                    self.move_over_node(l, ctx)?;
                }
            }
        }

        self.active.retain(|l| !self.links[l.index()].is_idle());
        Ok(())
    }

    fn after_sim(&mut self, ctx: &mut StepContext<'_, '_>) -> MobsimResult<()> {
        debug!(remaining = self.held, "network engine draining");
        for (i, link) in self.links.iter_mut().enumerate() {
            let l = LinkId(i as u32);
            for v in link.queue.drain(..).chain(link.waiting.drain(..)) {
                let agent = ctx.agents.get_mut(v.driver)?;
                agent.release(Holder::Network);
                agent.abort();
                ctx.emit_now(v.driver, EventKind::PersonStuck { link: Some(l), mode: Some(v.mode) });
            }
        }
        self.active.clear();
        self.held = 0;
        Ok(())
    }

    fn held(&self) -> usize {
        self.held
    }
}
