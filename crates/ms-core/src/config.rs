//! Run configuration.
//!
//! `SimConfig` enumerates everything that is resolved once at startup: which
//! modes the network engine simulates, which are teleported and how fast,
//! the outer-loop iteration range, the active replanning strategies and the
//! scoring parameters.  Parsing it from a file is the application's job
//! (enable the `serde` feature); [`SimConfig::validate`] should be called on
//! anything that did not come from `Default`.

use crate::{CoreError, CoreResult, SimTime, TransportMode};

// ── Mobsim ────────────────────────────────────────────────────────────────────

/// Parameters of the time-stepped mobsim and its network queue model.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QSimConfig {
    /// Clock value at the first tick of every iteration.
    pub start_time: SimTime,

    /// Hard upper bound on simulated time.  Agents still travelling or
    /// waiting when it is reached are reported stuck.  `None` runs until
    /// every agent has finished.
    pub end_time: Option<SimTime>,

    /// Seconds per tick.
    pub time_step_secs: f64,

    /// Seconds a vehicle may wait at the head of a link before it counts as
    /// stuck.  Only acted upon when `remove_stuck_vehicles` is set.
    pub stuck_time_secs: f64,

    /// Remove vehicles that exceed `stuck_time_secs` (with a stuck event)
    /// instead of letting them wait until `end_time`.
    pub remove_stuck_vehicles: bool,

    /// Scales every link's flow capacity (sample-size correction).
    pub flow_capacity_factor: f64,

    /// Scales every link's storage capacity (sample-size correction).
    pub storage_capacity_factor: f64,

    /// Road length occupied by one vehicle in a jam, in metres.
    pub effective_cell_size_m: f64,

    /// Modes simulated by the network queue engine.
    pub network_modes: Vec<TransportMode>,
}

impl Default for QSimConfig {
    fn default() -> Self {
        Self {
            start_time:              SimTime::ZERO,
            end_time:                Some(SimTime::from_hms(30, 0, 0)),
            time_step_secs:          1.0,
            stuck_time_secs:         10.0,
            remove_stuck_vehicles:   false,
            flow_capacity_factor:    1.0,
            storage_capacity_factor: 1.0,
            effective_cell_size_m:   7.5,
            network_modes:           vec![TransportMode::Car],
        }
    }
}

impl QSimConfig {
    #[inline]
    pub fn is_network_mode(&self, mode: TransportMode) -> bool {
        self.network_modes.contains(&mode)
    }
}

// ── Routing ───────────────────────────────────────────────────────────────────

/// How a teleported mode is routed and simulated.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TeleportedModeParams {
    pub mode: TransportMode,

    /// Beeline speed in m/s.  `None` means the mobsim relies purely on the
    /// router's expected travel time.
    pub speed_mps: Option<f64>,

    /// Router-side multiplier from beeline to travelled distance.
    pub beeline_distance_factor: f64,
}

/// Routing parameters for non-network modes.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoutingConfig {
    pub teleported_modes: Vec<TeleportedModeParams>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        let teleported = |mode, speed| TeleportedModeParams {
            mode,
            speed_mps: Some(speed),
            beeline_distance_factor: 1.3,
        };
        Self {
            teleported_modes: vec![
                teleported(TransportMode::Walk, 3.0 / 3.6),
                teleported(TransportMode::Bike, 15.0 / 3.6),
                teleported(TransportMode::Pt, 30.0 / 3.6),
            ],
        }
    }
}

impl RoutingConfig {
    pub fn teleported(&self, mode: TransportMode) -> Option<&TeleportedModeParams> {
        self.teleported_modes.iter().find(|p| p.mode == mode)
    }
}

// ── Outer loop ────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ControllerConfig {
    pub first_iteration: u32,
    /// Inclusive: the default termination criterion continues while
    /// `iteration <= last_iteration`.
    pub last_iteration: u32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self { first_iteration: 0, last_iteration: 10 }
    }
}

/// The replanning strategies known to the controller.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StrategyKind {
    /// Keep the currently selected plan.
    KeepLastSelected,
    /// Switch to the plan with the highest score.
    BestScore,
    /// Copy the selected plan and recompute every route.
    ReRoute,
    /// Copy the selected plan, change one leg's mode, reroute that trip.
    ChangeSingleLegMode,
}

impl StrategyKind {
    /// Innovative strategies create new plans; selectors only choose among
    /// existing ones.
    pub fn is_innovative(self) -> bool {
        matches!(self, StrategyKind::ReRoute | StrategyKind::ChangeSingleLegMode)
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StrategySettings {
    pub kind: StrategyKind,
    /// Relative selection weight; need not sum to one.
    pub weight: f64,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReplanningConfig {
    pub strategies: Vec<StrategySettings>,

    /// Plans beyond this count are removed, worst score first.
    pub max_plans_per_agent: usize,

    /// From this iteration on, innovative strategies are no longer chosen.
    pub disable_innovation_after: Option<u32>,

    /// Candidate modes for `ChangeSingleLegMode`.
    pub change_mode_modes: Vec<TransportMode>,
}

impl Default for ReplanningConfig {
    fn default() -> Self {
        Self {
            strategies: vec![
                StrategySettings { kind: StrategyKind::BestScore, weight: 0.8 },
                StrategySettings { kind: StrategyKind::ReRoute,   weight: 0.1 },
                StrategySettings { kind: StrategyKind::ChangeSingleLegMode, weight: 0.1 },
            ],
            max_plans_per_agent:      5,
            disable_innovation_after: None,
            change_mode_modes:        vec![TransportMode::Car, TransportMode::Pt],
        }
    }
}

// ── Scoring ───────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScoringConfig {
    /// Utility per hour spent travelling (normally negative).
    pub marginal_utility_of_traveling_per_hour: f64,

    /// Utility for every completed trip.
    pub utility_per_completed_trip: f64,

    /// Utility added once when the agent gets stuck.
    pub stuck_penalty: f64,

    /// Weight of the newest score when blending with the plan's old score.
    pub learning_rate: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            marginal_utility_of_traveling_per_hour: -6.0,
            utility_per_completed_trip:             1.0,
            stuck_penalty:                          -100.0,
            learning_rate:                          1.0,
        }
    }
}

// ── Global ────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GlobalConfig {
    /// Master RNG seed.  The same seed always produces identical results.
    pub seed: u64,

    /// Worker threads for route precomputation and replanning.
    /// `None` uses all logical cores.
    pub num_threads: Option<usize>,
}

// ── SimConfig ─────────────────────────────────────────────────────────────────

/// Top-level run configuration.
#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimConfig {
    pub qsim:       QSimConfig,
    pub routing:    RoutingConfig,
    pub controller: ControllerConfig,
    pub replanning: ReplanningConfig,
    pub scoring:    ScoringConfig,
    pub global:     GlobalConfig,
}

impl SimConfig {
    /// Reject settings the engines cannot run with.
    pub fn validate(&self) -> CoreResult<()> {
        let q = &self.qsim;
        if !(q.time_step_secs > 0.0) {
            return Err(CoreError::Config(format!(
                "time step must be positive, got {}", q.time_step_secs
            )));
        }
        if let Some(end) = q.end_time {
            if end < q.start_time {
                return Err(CoreError::Config(format!(
                    "end time {end} is before start time {}", q.start_time
                )));
            }
        }
        if !(q.flow_capacity_factor > 0.0) || !(q.storage_capacity_factor > 0.0) {
            return Err(CoreError::Config("capacity factors must be positive".into()));
        }
        if !(q.effective_cell_size_m > 0.0) {
            return Err(CoreError::Config("effective cell size must be positive".into()));
        }
        for params in &self.routing.teleported_modes {
            if q.is_network_mode(params.mode) {
                return Err(CoreError::Config(format!(
                    "mode {} is configured both as network mode and as teleported mode",
                    params.mode
                )));
            }
            if params.speed_mps.is_some_and(|s| !(s > 0.0)) {
                return Err(CoreError::Config(format!(
                    "teleported speed for mode {} must be positive", params.mode
                )));
            }
        }
        if self.controller.last_iteration < self.controller.first_iteration {
            return Err(CoreError::Config(format!(
                "last iteration {} is before first iteration {}",
                self.controller.last_iteration, self.controller.first_iteration
            )));
        }
        let r = &self.replanning;
        if r.strategies.is_empty() {
            return Err(CoreError::Config("at least one replanning strategy is required".into()));
        }
        if let Some(bad) = r.strategies.iter().find(|s| !(s.weight > 0.0)) {
            return Err(CoreError::Config(format!(
                "strategy {:?} has non-positive weight {}", bad.kind, bad.weight
            )));
        }
        if r.max_plans_per_agent == 0 {
            return Err(CoreError::Config("max_plans_per_agent must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.scoring.learning_rate) {
            return Err(CoreError::Config("learning rate must be in [0, 1]".into()));
        }
        Ok(())
    }
}
