//! The iteration controller.
//!
//! ```text
//! Init ──run()──▶ Iterating(first) ─▶ … ─▶ Iterating(last) ─▶ Finalizing ─▶ Done
//!
//! per iteration:
//!   prepare-for-sim → events.reset(it) → mobsim → score
//!   → termination.continue_iterations(it + 1) ? replan : finalize
//! ```
//!
//! The population is mutated only between mobsim runs: by prepare-for-sim,
//! by scoring and by replanning.  A mobsim error is fatal; stuck agents are
//! not.

use std::cell::RefCell;
use std::rc::Rc;

use ms_core::{AgentId, SimConfig, SimTime};
use ms_events::{EventHandler, EventsManager};
use ms_mobsim::{MobsimReport, NoopListener, QSimBuilder};
use ms_network::{Dijkstra, Network};
use ms_population::Population;
use ms_router::{PlanRouter, TripRouter};
use tracing::info;

use crate::{
    ControllerError, ControllerResult, LastIteration, ReplanningStats, Scoring, StrategyManager,
    TerminationCriterion, TravelTimeScoring, WorkerPool, apply_scores, prepare_for_sim,
};

// ── State / summaries ─────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ControllerState {
    Init,
    Iterating(u32),
    Finalizing,
    Done,
}

/// What happened in one iteration.
#[derive(Clone, Debug, PartialEq)]
pub struct IterationSummary {
    pub iteration: u32,
    /// Plans routed by prepare-for-sim before the mobsim.
    pub prepared_plans: usize,
    pub mobsim: MobsimReport,
    /// Mean executed score, `None` for an empty population.
    pub mean_score: Option<f64>,
    /// `None` if the run stopped after this iteration.
    pub replanning: Option<ReplanningStats>,
}

impl IterationSummary {
    pub fn stuck(&self) -> &[AgentId] {
        &self.mobsim.stuck
    }

    pub fn arrivals(&self) -> usize {
        self.mobsim.arrived
    }

    pub fn end_time(&self) -> SimTime {
        self.mobsim.end_time
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunSummary {
    pub iterations: Vec<IterationSummary>,
}

impl RunSummary {
    pub fn last(&self) -> Option<&IterationSummary> {
        self.iterations.last()
    }
}

// ── Listener ──────────────────────────────────────────────────────────────────

/// Callbacks invoked by [`Controller::run`].  All default to no-ops.
pub trait ControllerListener {
    fn on_startup(&mut self, _population: &Population) {}

    fn on_iteration_start(&mut self, _iteration: u32) {}

    /// Called after scoring and replanning, with the population as the next
    /// iteration will see it.
    fn on_iteration_end(&mut self, _summary: &IterationSummary, _population: &Population) {}

    fn on_shutdown(&mut self, _summary: &RunSummary) {}
}

pub struct NoopControllerListener;

impl ControllerListener for NoopControllerListener {}

// ── Builder ───────────────────────────────────────────────────────────────────

/// Fluent builder for [`Controller`].
///
/// | Method               | Default                                       |
/// |----------------------|-----------------------------------------------|
/// | `.termination(t)`    | `LastIteration(config.controller.last_iteration)` |
/// | `.scoring(s)`        | `TravelTimeScoring` with `config.scoring`     |
/// | `.event_handler(h)`  | none                                          |
pub struct ControllerBuilder<'a> {
    config: SimConfig,
    network: &'a Network,
    population: Population,
    termination: Option<Box<dyn TerminationCriterion + 'a>>,
    scoring: Option<Rc<RefCell<dyn Scoring>>>,
    handlers: Vec<Box<dyn EventHandler>>,
}

impl<'a> ControllerBuilder<'a> {
    pub fn new(config: SimConfig, network: &'a Network, population: Population) -> Self {
        Self {
            config,
            network,
            population,
            termination: None,
            scoring: None,
            handlers: Vec::new(),
        }
    }

    pub fn termination(mut self, criterion: impl TerminationCriterion + 'a) -> Self {
        self.termination = Some(Box::new(criterion));
        self
    }

    /// Replace the default scoring.  The caller may keep a clone of the
    /// handle to inspect it.
    pub fn scoring<S: Scoring + 'static>(mut self, scoring: Rc<RefCell<S>>) -> Self {
        let scoring: Rc<RefCell<dyn Scoring>> = scoring;
        self.scoring = Some(scoring);
        self
    }

    /// Extra handler for every iteration's event stream.
    pub fn event_handler(mut self, handler: Box<dyn EventHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    pub fn build(self) -> ControllerResult<Controller<'a>> {
        self.config.validate()?;
        let pool = WorkerPool::new(self.config.global.num_threads)?;
        let termination: Box<dyn TerminationCriterion + 'a> = match self.termination {
            Some(t) => t,
            None => Box::new(LastIteration(self.config.controller.last_iteration)),
        };
        let scoring: Rc<RefCell<dyn Scoring>> = match self.scoring {
            Some(s) => s,
            None => Rc::new(RefCell::new(TravelTimeScoring::new(self.config.scoring.clone()))),
        };

        let mut events = EventsManager::new();
        events.add_handler(Box::new(Rc::clone(&scoring)));
        for h in self.handlers {
            events.add_handler(h);
        }

        Ok(Controller {
            config: self.config,
            network: self.network,
            population: self.population,
            events,
            scoring,
            termination,
            pool,
            state: ControllerState::Init,
        })
    }
}

// ── Controller ────────────────────────────────────────────────────────────────

pub struct Controller<'a> {
    config: SimConfig,
    network: &'a Network,
    population: Population,
    events: EventsManager,
    scoring: Rc<RefCell<dyn Scoring>>,
    termination: Box<dyn TerminationCriterion + 'a>,
    pool: WorkerPool,
    state: ControllerState,
}

impl<'a> Controller<'a> {
    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn into_population(self) -> Population {
        self.population
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Run every iteration.  Can be called once.
    pub fn run<L: ControllerListener>(&mut self, listener: &mut L) -> ControllerResult<RunSummary> {
        if self.state != ControllerState::Init {
            return Err(ControllerError::InvalidState {
                expected: ControllerState::Init,
                actual: self.state,
            });
        }

        let dijkstra = Dijkstra::new();
        let trip_router = TripRouter::from_config(&self.config, self.network, &dijkstra)?;
        let plan_router = PlanRouter::new(&trip_router, self.network);
        let strategies = StrategyManager::new(&self.config);
        let start = self.config.qsim.start_time;

        info!(
            agents = self.population.len(),
            links = self.network.link_count(),
            first = self.config.controller.first_iteration,
            last = self.config.controller.last_iteration,
            threads = self.pool.threads(),
            "controller starting"
        );
        listener.on_startup(&self.population);

        let mut summary = RunSummary::default();
        let mut iteration = self.config.controller.first_iteration;
        loop {
            self.state = ControllerState::Iterating(iteration);
            info!(iteration, "iteration starting");
            listener.on_iteration_start(iteration);

            let prepared =
                prepare_for_sim(&mut self.population, self.network, &plan_router, start, &self.pool)?;

            self.events.reset(iteration);
            let mobsim = QSimBuilder::new(&self.config, self.network, &self.population, &mut self.events)
                .build()?
                .run(&mut NoopListener)?;

            let mean_score = apply_scores(
                &mut self.population,
                &*self.scoring.borrow(),
                self.config.scoring.learning_rate,
            );

            let next = iteration + 1;
            let continuing = self.termination.continue_iterations(next);
            let replanning = if continuing {
                Some(strategies.replan(&mut self.population, next, &plan_router, &self.pool)?)
            } else {
                None
            };

            info!(
                iteration,
                arrived = mobsim.arrived,
                stuck = mobsim.stuck.len(),
                mean_score = ?mean_score,
                "iteration done"
            );
            let it = IterationSummary { iteration, prepared_plans: prepared, mobsim, mean_score, replanning };
            listener.on_iteration_end(&it, &self.population);
            summary.iterations.push(it);

            if !continuing {
                break;
            }
            iteration = next;
        }

        self.state = ControllerState::Finalizing;
        info!(iterations = summary.iterations.len(), "controller finalizing");
        listener.on_shutdown(&summary);
        self.state = ControllerState::Done;
        Ok(summary)
    }
}
