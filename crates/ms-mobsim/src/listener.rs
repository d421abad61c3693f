//! Mobsim listener trait for progress reporting and data collection.

use ms_agent::AgentStore;
use ms_core::{AgentId, SimTime};

use crate::{ActivityEngine, MobsimEngine, NetworkEngine, TeleportationEngine};

/// Outcome of one mobsim run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MobsimReport {
    /// Clock time when the loop stopped.
    pub end_time: SimTime,
    pub ticks: u64,
    /// Agents that reached their last activity by completing a leg.  An
    /// agent whose plan is a single activity is done without traveling and
    /// is not counted.
    pub arrived: usize,
    /// Agents marked stuck, ascending.
    pub stuck: Vec<AgentId>,
    /// Events processed by the events manager during the run.
    pub events: u64,
}

impl MobsimReport {
    pub fn stuck_count(&self) -> usize {
        self.stuck.len()
    }
}

/// Read-only view of the mobsim state handed to [`MobsimListener::on_tick_end`].
pub struct MobsimView<'v, 'a> {
    pub agents: &'v AgentStore<'a>,
    engines: &'v [MobsimEngine],
}

impl<'v, 'a> MobsimView<'v, 'a> {
    pub(crate) fn new(agents: &'v AgentStore<'a>, engines: &'v [MobsimEngine]) -> Self {
        Self { agents, engines }
    }

    pub fn activity_engine(&self) -> Option<&'v ActivityEngine> {
        self.engines.iter().find_map(MobsimEngine::as_activity)
    }

    pub fn teleportation_engine(&self) -> Option<&'v TeleportationEngine> {
        self.engines.iter().find_map(MobsimEngine::as_teleportation)
    }

    pub fn network_engine(&self) -> Option<&'v NetworkEngine> {
        self.engines.iter().find_map(MobsimEngine::as_network)
    }
}

/// Callbacks invoked by [`QSim::run`][crate::QSim::run] at tick boundaries.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
///
/// # Example: occupancy probe
///
/// ```rust,ignore
/// struct Probe { link: LinkId, max: usize }
///
/// impl MobsimListener for Probe {
///     fn on_tick_end(&mut self, _now: SimTime, view: &MobsimView<'_, '_>) {
///         if let Some(net) = view.network_engine() {
///             self.max = self.max.max(net.occupancy(self.link));
///         }
///     }
/// }
/// ```
pub trait MobsimListener {
    /// Called at the start of each tick, before any engine runs.
    fn on_tick_start(&mut self, _now: SimTime) {}

    /// Called after every engine has been stepped, before the clock advances.
    fn on_tick_end(&mut self, _now: SimTime, _view: &MobsimView<'_, '_>) {}

    /// Called once after the engines have been drained.
    fn on_sim_end(&mut self, _report: &MobsimReport) {}
}

/// A [`MobsimListener`] that does nothing.
pub struct NoopListener;

impl MobsimListener for NoopListener {}
