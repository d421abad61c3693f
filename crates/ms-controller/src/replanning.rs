//! Replanning between mobsim runs.
//!
//! Every agent draws one strategy per iteration, weighted by the configured
//! strategy weights, from its own [`AgentRng`].  Selectors pick among the
//! plans the agent already has; innovators copy the selected plan, change
//! it, and add the copy as the new selected plan.
//!
//! Decisions are computed on the worker pool against the unchanged
//! population and applied afterwards in agent order.  A failed innovation
//! leaves the agent's plans as they were.

use ms_core::{AgentId, AgentRng, SimConfig, SimTime, StrategyKind, StrategySettings, TransportMode};
use ms_population::{Leg, Person, Plan, Population, PopulationResult};
use ms_router::PlanRouter;
use tracing::{info, warn};

use crate::{ControllerResult, WorkerPool};

/// Counts for one replanning pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReplanningStats {
    /// Agents that switched to an existing plan.
    pub selected: usize,
    /// Agents that got a new plan.
    pub innovated: usize,
    /// Innovations that failed and were discarded.
    pub failed: usize,
    /// Plans dropped to respect the per-agent maximum.
    pub removed_plans: usize,
}

enum Decision {
    Keep,
    Select(usize),
    NewPlan(Plan),
    Failed { kind: StrategyKind, reason: String },
}

pub struct StrategyManager {
    strategies: Vec<StrategySettings>,
    max_plans: usize,
    disable_innovation_after: Option<u32>,
    change_mode_modes: Vec<TransportMode>,
    seed: u64,
    start: SimTime,
}

impl StrategyManager {
    pub fn new(config: &SimConfig) -> Self {
        let r = &config.replanning;
        Self {
            strategies: r.strategies.clone(),
            max_plans: r.max_plans_per_agent,
            disable_innovation_after: r.disable_innovation_after,
            change_mode_modes: r.change_mode_modes.clone(),
            seed: config.global.seed,
            start: config.qsim.start_time,
        }
    }

    /// Strategies that may be drawn for `iteration`.
    pub fn available(&self, iteration: u32) -> impl Iterator<Item = &StrategySettings> {
        self.strategies.iter().filter(move |s| {
            !s.kind.is_innovative()
                || self.disable_innovation_after.is_none_or(|last| iteration <= last)
        })
    }

    /// Weighted draw among the strategies available in `iteration`.
    fn draw(&self, iteration: u32, rng: &mut AgentRng) -> Option<StrategyKind> {
        let total: f64 = self.available(iteration).map(|s| s.weight).sum();
        if !(total > 0.0) {
            return None;
        }
        let mut x = rng.random::<f64>() * total;
        let mut last = None;
        for s in self.available(iteration) {
            if x < s.weight {
                return Some(s.kind);
            }
            x -= s.weight;
            last = Some(s.kind);
        }
        last
    }

    /// The strategy `agent` draws in `iteration`.
    pub fn choose(&self, iteration: u32, agent: AgentId) -> Option<StrategyKind> {
        let mut rng = AgentRng::for_iteration(self.seed, iteration, agent);
        self.draw(iteration, &mut rng)
    }

    /// Replan every agent ahead of `iteration`.
    pub fn replan(
        &self,
        population: &mut Population,
        iteration: u32,
        router: &PlanRouter<'_, '_>,
        pool: &WorkerPool,
    ) -> ControllerResult<ReplanningStats> {
        let decisions = pool.map(population.persons(), |i, person: &Person| {
            self.decide(iteration, AgentId(i as u32), person, router)
        });

        let mut stats = ReplanningStats::default();
        for (person, decision) in population.persons_mut().iter_mut().zip(decisions) {
            match decision {
                Decision::Keep => {}
                Decision::Select(index) => {
                    if index != person.selected_index() {
                        person.select(index)?;
                        stats.selected += 1;
                    }
                }
                Decision::NewPlan(plan) => {
                    person.add_and_select(plan);
                    stats.innovated += 1;
                    stats.removed_plans += trim_plans(person, self.max_plans)?;
                }
                Decision::Failed { kind, reason } => {
                    warn!(
                        person = %person.external_id,
                        strategy = ?kind,
                        %reason,
                        "replanning failed; keeping previous plan"
                    );
                    stats.failed += 1;
                }
            }
        }
        info!(
            iteration,
            selected = stats.selected,
            innovated = stats.innovated,
            failed = stats.failed,
            removed = stats.removed_plans,
            "replanning done"
        );
        Ok(stats)
    }

    fn decide(
        &self,
        iteration: u32,
        agent: AgentId,
        person: &Person,
        router: &PlanRouter<'_, '_>,
    ) -> Decision {
        let mut rng = AgentRng::for_iteration(self.seed, iteration, agent);
        let Some(kind) = self.draw(iteration, &mut rng) else { return Decision::Keep };
        let innovated = match kind {
            StrategyKind::KeepLastSelected => return Decision::Keep,
            StrategyKind::BestScore => return Decision::Select(person.best_plan_index()),
            StrategyKind::ReRoute => router
                .route_plan(person.selected_plan(), person, self.start)
                .map_err(|e| e.to_string()),
            StrategyKind::ChangeSingleLegMode => self.change_single_leg_mode(person, router, &mut rng),
        };
        match innovated {
            Ok(plan) => Decision::NewPlan(plan),
            Err(reason) => Decision::Failed { kind, reason },
        }
    }

    /// Copy of the selected plan with one random leg switched to another
    /// configured mode, rerouted.
    fn change_single_leg_mode(
        &self,
        person: &Person,
        router: &PlanRouter<'_, '_>,
        rng: &mut AgentRng,
    ) -> Result<Plan, String> {
        let plan = person.selected_plan();
        let legs: Vec<usize> = plan
            .elements
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.as_leg().map(|_| i))
            .collect();
        let &index = rng.choose(&legs).ok_or("plan has no legs")?;
        let current = plan.leg_at(index).map(|l| l.mode);
        let options: Vec<TransportMode> = self
            .change_mode_modes
            .iter()
            .copied()
            .filter(|&m| Some(m) != current)
            .collect();
        let &mode = rng.choose(&options).ok_or("no alternative mode configured")?;

        let mut changed = plan.clone();
        if let Some(leg) = changed.leg_at_mut(index) {
            *leg = Leg::new(mode);
        }
        router
            .route_plan(&changed, person, self.start)
            .map_err(|e| e.to_string())
    }
}

/// Drop plans worst-first until `person` has at most `max` plans.  The
/// selected plan is never dropped.  Returns the number removed.
pub fn trim_plans(person: &mut Person, max: usize) -> PopulationResult<usize> {
    let mut removed = 0;
    while person.plans().len() > max {
        let selected = person.selected_index();
        let worst = person
            .plans()
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != selected)
            .min_by(|(_, a), (_, b)| {
                let key = |p: &Plan| p.score.unwrap_or(f64::NEG_INFINITY);
                key(a).total_cmp(&key(b))
            })
            .map(|(i, _)| i);
        let Some(worst) = worst else { break };
        person.remove_plan(worst)?;
        removed += 1;
    }
    Ok(removed)
}
