//! Fluent builder for constructing a [`QSim`].

use ms_agent::AgentStore;
use ms_core::{SimClock, SimConfig, SimTime};
use ms_events::EventsManager;
use ms_network::Network;
use ms_population::Population;
use tracing::debug;

use crate::qsim::Core;
use crate::{
    ActivityEngine, MobsimEngine, MobsimResult, NetworkEngine, QSim, TeleportationEngine,
};

/// Fluent builder for [`QSim`].
///
/// # Required inputs
///
/// - [`SimConfig`]: step, start/end time, network modes, teleported modes
/// - [`Network`]: read-only for the whole run
/// - [`Population`]: every person's selected plan is executed
/// - [`EventsManager`]: receives every event in order
///
/// # Optional inputs (have defaults)
///
/// | Method            | Default                      |
/// |-------------------|------------------------------|
/// | `.start_time(t)`  | `config.qsim.start_time`     |
/// | `.end_time(t)`    | `config.qsim.end_time`       |
///
/// # Example
///
/// ```rust,ignore
/// let mut events = EventsManager::new();
/// let mut qsim = QSimBuilder::new(&config, &network, &population, &mut events)
///     .end_time(Some(SimTime::from_hms(24, 0, 0)))
///     .build()?;
/// let report = qsim.run(&mut NoopListener)?;
/// ```
pub struct QSimBuilder<'a> {
    config: SimConfig,
    network: &'a Network,
    population: &'a Population,
    events: &'a mut EventsManager,
}

impl<'a> QSimBuilder<'a> {
    pub fn new(
        config: &SimConfig,
        network: &'a Network,
        population: &'a Population,
        events: &'a mut EventsManager,
    ) -> Self {
        Self { config: config.clone(), network, population, events }
    }

    pub fn start_time(mut self, start: SimTime) -> Self {
        self.config.qsim.start_time = start;
        self
    }

    /// `None` runs until every agent is done or stuck.
    pub fn end_time(mut self, end: Option<SimTime>) -> Self {
        self.config.qsim.end_time = end;
        self
    }

    /// Validate inputs, build the agents and engines, and return a
    /// ready-to-run [`QSim`].
    pub fn build(self) -> MobsimResult<QSim<'a>> {
        self.config.validate()?;

        // ── Every activity must sit on a link of this network ─────────────
        for person in self.population.persons() {
            for act in person.selected_plan().activities() {
                if let Some(link) = act.link {
                    self.network.check_link(link)?;
                }
            }
        }

        let agents = AgentStore::from_population(self.population)?;
        let qsim = &self.config.qsim;
        let engines = vec![
            MobsimEngine::Activity(ActivityEngine::new()),
            MobsimEngine::Teleportation(TeleportationEngine::new(qsim, &self.config.routing)),
            MobsimEngine::Network(NetworkEngine::new(self.network, qsim)),
        ];
        debug!(
            agents = agents.len(),
            links = self.network.link_count(),
            step = qsim.time_step_secs,
            "qsim built"
        );

        let clock = SimClock::new(qsim.start_time, qsim.time_step_secs);
        Ok(QSim::new(
            Core::new(clock, self.network, agents),
            engines,
            self.events,
            qsim.end_time,
        ))
    }
}
