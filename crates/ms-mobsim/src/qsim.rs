//! The `QSim` struct and its tick loop.

use ms_agent::{AgentError, AgentState, AgentStore};
use ms_core::{AgentId, SimClock, SimTime};
use ms_events::{Event, EventKind, EventsManager};
use ms_network::Network;
use tracing::{debug, info, trace, warn};

use crate::{
    ActivityEngine, DepartureHandler, MobsimEngine, MobsimError, MobsimListener, MobsimReport,
    MobsimResult, MobsimView, NetworkEngine, StepContext, Steppable, TeleportationEngine,
};

// ── Core state lent to the engines ────────────────────────────────────────────

/// Everything an engine may touch during its step.  Kept apart from the
/// engine list so both can be borrowed at once.
pub(crate) struct Core<'a> {
    pub(crate) clock: SimClock,
    pub(crate) network: &'a Network,
    pub(crate) agents: AgentStore<'a>,
    buffer: Vec<Event>,
    released: Vec<AgentId>,
}

impl<'a> Core<'a> {
    pub(crate) fn new(clock: SimClock, network: &'a Network, agents: AgentStore<'a>) -> Self {
        Self { clock, network, agents, buffer: Vec::new(), released: Vec::new() }
    }

    fn ctx(&mut self) -> StepContext<'_, 'a> {
        StepContext::new(
            self.clock.now(),
            self.clock.tick().0,
            self.clock.step_secs(),
            self.network,
            &mut self.agents,
            &mut self.buffer,
            &mut self.released,
        )
    }
}

// ── QSim ──────────────────────────────────────────────────────────────────────

/// One mobsim run over a fixed population and network.
///
/// Each tick:
///
/// 1. every engine in registry order (activity, teleportation, network) does
///    its step;
/// 2. after each engine, its events are flushed to the [`EventsManager`] and
///    the agents it released are processed in release order: an agent leaving
///    an activity departs and is offered to the departure handlers in
///    registry order, an agent finishing a leg starts its next activity;
/// 3. the clock advances by one step.
///
/// The loop ends when every agent is done or stuck, or once the clock passes
/// the configured end time.  Agents still held by an engine are then reported
/// stuck.
///
/// Create via [`QSimBuilder`][crate::QSimBuilder].
pub struct QSim<'a> {
    core: Core<'a>,
    engines: Vec<MobsimEngine>,
    events: &'a mut EventsManager,
    end_time: Option<SimTime>,
    stuck: Vec<AgentId>,
    arrived: usize,
    initialized: bool,
    finished: bool,
}

impl<'a> QSim<'a> {
    pub(crate) fn new(
        core: Core<'a>,
        engines: Vec<MobsimEngine>,
        events: &'a mut EventsManager,
        end_time: Option<SimTime>,
    ) -> Self {
        Self {
            core,
            engines,
            events,
            end_time,
            stuck: Vec::new(),
            arrived: 0,
            initialized: false,
            finished: false,
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn now(&self) -> SimTime {
        self.core.clock.now()
    }

    pub fn agents(&self) -> &AgentStore<'a> {
        &self.core.agents
    }

    pub fn engines(&self) -> &[MobsimEngine] {
        &self.engines
    }

    pub fn network_engine(&self) -> Option<&NetworkEngine> {
        self.engines.iter().find_map(MobsimEngine::as_network)
    }

    pub fn teleportation_engine(&self) -> Option<&TeleportationEngine> {
        self.engines.iter().find_map(MobsimEngine::as_teleportation)
    }

    pub fn activity_engine(&self) -> Option<&ActivityEngine> {
        self.engines.iter().find_map(MobsimEngine::as_activity)
    }

    /// Whether the loop would stop before the next tick.
    pub fn is_finished(&self) -> bool {
        self.finished
            || self.core.agents.all_terminal()
            || self.end_time.is_some_and(|end| self.core.clock.now() > end)
    }

    // ── Public API ────────────────────────────────────────────────────────

    /// Run until every agent is done or stuck, or the end time has passed,
    /// then drain the engines.
    pub fn run<L: MobsimListener>(&mut self, listener: &mut L) -> MobsimResult<MobsimReport> {
        self.initialize()?;
        while !self.is_finished() {
            self.step(listener)?;
        }
        self.finish(listener)
    }

    /// Run exactly `n` ticks (ignores the end time and the finished check).
    ///
    /// Useful for tests and incremental stepping; call [`finish`][Self::finish]
    /// afterwards to drain the engines.
    pub fn run_ticks<L: MobsimListener>(&mut self, n: u64, listener: &mut L) -> MobsimResult<()> {
        for _ in 0..n {
            self.step(listener)?;
        }
        Ok(())
    }

    /// Process one tick.
    pub fn step<L: MobsimListener>(&mut self, listener: &mut L) -> MobsimResult<()> {
        self.initialize()?;
        let now = self.core.clock.now();
        listener.on_tick_start(now);

        for i in 0..self.engines.len() {
            {
                let mut ctx = self.core.ctx();
                self.engines[i].do_sim_step(&mut ctx)?;
            }
            self.flush();
            self.process_released()?;
        }

        trace!(
            time = %now,
            held = ?self.engines.iter().map(|e| (e.name(), e.held())).collect::<Vec<_>>(),
            "tick done"
        );
        listener.on_tick_end(now, &MobsimView::new(&self.core.agents, &self.engines));
        self.core.clock.advance();
        Ok(())
    }

    /// Drain every engine, reporting the agents they still hold as stuck,
    /// and build the run report.  Idempotent.
    pub fn finish<L: MobsimListener>(&mut self, listener: &mut L) -> MobsimResult<MobsimReport> {
        if !self.finished {
            {
                let mut ctx = self.core.ctx();
                for engine in &mut self.engines {
                    debug!(engine = engine.name(), held = engine.held(), "after sim");
                    engine.after_sim(&mut ctx)?;
                }
            }
            self.flush();
            self.stuck.sort_unstable();
            self.stuck.dedup();
            self.finished = true;
        }

        let report = MobsimReport {
            end_time: self.core.clock.now(),
            ticks: self.core.clock.tick().0,
            arrived: self.arrived,
            stuck: self.stuck.clone(),
            events: self.events.processed(),
        };
        if !report.stuck.is_empty() {
            warn!(count = report.stuck.len(), ids = ?report.stuck, "agents stuck at end of mobsim");
        }
        info!(
            end_time = %report.end_time,
            ticks = report.ticks,
            arrived = report.arrived,
            stuck = report.stuck.len(),
            events = report.events,
            "mobsim finished"
        );
        listener.on_sim_end(&report);
        Ok(report)
    }

    // ── Agent flow ────────────────────────────────────────────────────────

    /// Hand every agent to its first activity.  Runs once.
    fn initialize(&mut self) -> MobsimResult<()> {
        if self.initialized {
            return Ok(());
        }
        self.initialized = true;
        info!(
            agents = self.core.agents.len(),
            start = %self.core.clock.now(),
            end = ?self.end_time.map(|t| t.to_string()),
            "mobsim starting"
        );

        let starting: Vec<AgentId> = self
            .core
            .agents
            .iter()
            .filter(|a| a.state() == AgentState::Activity)
            .map(|a| a.id())
            .collect();
        {
            let activities = self
                .engines
                .iter_mut()
                .find_map(MobsimEngine::as_activity_mut)
                .ok_or(MobsimError::MissingEngine("activity"))?;
            let mut ctx = self.core.ctx();
            for id in starting {
                activities.handle_activity(&mut ctx, id)?;
            }
        }
        self.flush();
        Ok(())
    }

    /// Process released agents until none are left; handling one agent may
    /// release others only through later engine steps, never recursively.
    fn process_released(&mut self) -> MobsimResult<()> {
        while !self.core.released.is_empty() {
            let released = std::mem::take(&mut self.core.released);
            for id in released {
                match self.core.agents.get(id)?.state() {
                    AgentState::Activity => self.depart(id)?,
                    AgentState::Leg => self.arrive(id)?,
                    AgentState::Abort | AgentState::Done => {}
                }
                self.flush();
            }
        }
        Ok(())
    }

    /// `id` ends its activity and starts the next leg.
    fn depart(&mut self, id: AgentId) -> MobsimResult<()> {
        let mut ctx = self.core.ctx();
        let agent = ctx.agents.get_mut(id)?;
        let link = agent.current_link();
        let kind = agent.current_activity().map(|a| a.kind.clone()).unwrap_or_default();
        let mode = agent.end_activity()?.mode;
        ctx.emit_now(id, EventKind::ActivityEnd { link, activity: kind });
        ctx.emit_now(id, EventKind::PersonDeparture { link, mode });

        for engine in &mut self.engines {
            if engine.handle_departure(&mut ctx, id, link)? {
                return Ok(());
            }
        }
        Err(MobsimError::NoDepartureHandler { agent: id, mode })
    }

    /// `id` finished its leg and starts the next activity.
    fn arrive(&mut self, id: AgentId) -> MobsimResult<()> {
        let mut ctx = self.core.ctx();
        let agent = ctx.agents.get_mut(id)?;
        let mode = agent
            .mode()
            .ok_or(AgentError::NotInLeg { agent: id, state: agent.state() })?;
        let link = agent.current_link();
        let activity = agent.end_leg()?;
        ctx.emit_now(id, EventKind::PersonArrival { link, mode });
        ctx.emit_now(id, EventKind::ActivityStart { link, activity: activity.kind.clone() });

        if ctx.agents.get(id)?.state() == AgentState::Done {
            self.arrived += 1;
            return Ok(());
        }
        let activities = self
            .engines
            .iter_mut()
            .find_map(MobsimEngine::as_activity_mut)
            .ok_or(MobsimError::MissingEngine("activity"))?;
        activities.handle_activity(&mut ctx, id)
    }

    /// Move buffered events to the events manager, noting stuck agents.
    fn flush(&mut self) {
        for event in self.core.buffer.drain(..) {
            if event.is_stuck() {
                self.stuck.push(event.agent);
            }
            self.events.process_event(event);
        }
    }
}
