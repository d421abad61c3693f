//! Engine capabilities and the closed set of engines.
//!
//! The loop only needs two things from an engine: that it can be stepped
//! (and drained at the end of the run), and, for engines that move agents,
//! that it can take over a departing agent.  The engines are a fixed enum
//! rather than trait objects; the registry order is the processing order.

use ms_core::{AgentId, LinkId};

use crate::{
    ActivityEngine, MobsimResult, NetworkEngine, StepContext, TeleportationEngine,
};

/// Advanced once per tick, drained once when the run ends.
pub trait Steppable {
    fn name(&self) -> &'static str;

    /// Do this tick's work: release agents that are due, emit events.
    fn do_sim_step(&mut self, ctx: &mut StepContext<'_, '_>) -> MobsimResult<()>;

    /// The run is over: every agent still held is stuck.
    fn after_sim(&mut self, ctx: &mut StepContext<'_, '_>) -> MobsimResult<()>;

    /// Number of agents currently held.
    fn held(&self) -> usize;
}

/// Accepts agents starting a leg.
pub trait DepartureHandler {
    /// Take custody of `agent`, which departs from `link`, and return
    /// `true`; or return `false` to let the next handler try.
    fn handle_departure(
        &mut self,
        ctx: &mut StepContext<'_, '_>,
        agent: AgentId,
        link: LinkId,
    ) -> MobsimResult<bool>;
}

/// The engines known to the mobsim.
pub enum MobsimEngine {
    Activity(ActivityEngine),
    Teleportation(TeleportationEngine),
    Network(NetworkEngine),
}

impl MobsimEngine {
    pub fn as_activity_mut(&mut self) -> Option<&mut ActivityEngine> {
        match self {
            MobsimEngine::Activity(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_network(&self) -> Option<&NetworkEngine> {
        match self {
            MobsimEngine::Network(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_teleportation(&self) -> Option<&TeleportationEngine> {
        match self {
            MobsimEngine::Teleportation(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_activity(&self) -> Option<&ActivityEngine> {
        match self {
            MobsimEngine::Activity(e) => Some(e),
            _ => None,
        }
    }
}

impl Steppable for MobsimEngine {
    fn name(&self) -> &'static str {
        match self {
            MobsimEngine::Activity(e) => e.name(),
            MobsimEngine::Teleportation(e) => e.name(),
            MobsimEngine::Network(e) => e.name(),
        }
    }

    fn do_sim_step(&mut self, ctx: &mut StepContext<'_, '_>) -> MobsimResult<()> {
        match self {
            MobsimEngine::Activity(e) => e.do_sim_step(ctx),
            MobsimEngine::Teleportation(e) => e.do_sim_step(ctx),
            MobsimEngine::Network(e) => e.do_sim_step(ctx),
        }
    }

    fn after_sim(&mut self, ctx: &mut StepContext<'_, '_>) -> MobsimResult<()> {
        match self {
            MobsimEngine::Activity(e) => e.after_sim(ctx),
            MobsimEngine::Teleportation(e) => e.after_sim(ctx),
            MobsimEngine::Network(e) => e.after_sim(ctx),
        }
    }

    fn held(&self) -> usize {
        match self {
            MobsimEngine::Activity(e) => e.held(),
            MobsimEngine::Teleportation(e) => e.held(),
            MobsimEngine::Network(e) => e.held(),
        }
    }
}

impl DepartureHandler for MobsimEngine {
    fn handle_departure(
        &mut self,
        ctx: &mut StepContext<'_, '_>,
        agent: AgentId,
        link: LinkId,
    ) -> MobsimResult<bool> {
        match self {
            MobsimEngine::Activity(_) => Ok(false),
            MobsimEngine::Teleportation(e) => e.handle_departure(ctx, agent, link),
            MobsimEngine::Network(e) => e.handle_departure(ctx, agent, link),
        }
    }
}
