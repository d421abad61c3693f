//! Scoring of executed plans from the event stream.
//!
//! A [`Scoring`] implementation is registered as an event handler for the
//! whole run.  After each mobsim it reports one executed score per agent;
//! the controller blends that into the selected plan's score:
//!
//! ```text
//! score = learning_rate * executed + (1 - learning_rate) * previous
//! ```
//!
//! A plan scored for the first time takes the executed score as is.

use ms_core::{AgentId, ScoringConfig, SimTime};
use ms_events::{Event, EventHandler, EventKind};
use ms_population::Population;

/// Event handler that can score what each agent did in the last mobsim.
pub trait Scoring: EventHandler {
    /// Executed score of `agent` in the iteration that just ended.
    fn score(&self, agent: AgentId) -> f64;
}

#[derive(Clone, Debug, Default)]
struct Tally {
    departed_at: Option<SimTime>,
    travel_secs: f64,
    trips: u32,
    stuck: bool,
}

/// Negative utility per hour travelled, a bonus per completed trip and a
/// penalty for getting stuck.
pub struct TravelTimeScoring {
    params: ScoringConfig,
    tallies: Vec<Tally>,
}

impl TravelTimeScoring {
    pub fn new(params: ScoringConfig) -> Self {
        Self { params, tallies: Vec::new() }
    }

    fn tally(&mut self, agent: AgentId) -> &mut Tally {
        let i = agent.index();
        if i >= self.tallies.len() {
            self.tallies.resize(i + 1, Tally::default());
        }
        &mut self.tallies[i]
    }
}

impl EventHandler for TravelTimeScoring {
    fn handle_event(&mut self, event: &Event) {
        match event.kind {
            EventKind::PersonDeparture { .. } => {
                self.tally(event.agent).departed_at = Some(event.time);
            }
            EventKind::PersonArrival { .. } => {
                let t = self.tally(event.agent);
                if let Some(dep) = t.departed_at.take() {
                    t.travel_secs += event.time - dep;
                }
                t.trips += 1;
            }
            EventKind::PersonStuck { .. } => {
                let t = self.tally(event.agent);
                if let Some(dep) = t.departed_at.take() {
                    t.travel_secs += event.time - dep;
                }
                t.stuck = true;
            }
            _ => {}
        }
    }

    fn reset(&mut self, _iteration: u32) {
        self.tallies.clear();
    }
}

impl Scoring for TravelTimeScoring {
    fn score(&self, agent: AgentId) -> f64 {
        let Some(t) = self.tallies.get(agent.index()) else { return 0.0 };
        let p = &self.params;
        let mut score = t.travel_secs / 3_600.0 * p.marginal_utility_of_traveling_per_hour
            + f64::from(t.trips) * p.utility_per_completed_trip;
        if t.stuck {
            score += p.stuck_penalty;
        }
        score
    }
}

/// Blend every agent's executed score into its selected plan.  Returns the
/// mean executed score, `None` for an empty population.
pub fn apply_scores(population: &mut Population, scoring: &dyn Scoring, learning_rate: f64) -> Option<f64> {
    let mut total = 0.0;
    for (i, person) in population.persons_mut().iter_mut().enumerate() {
        let executed = scoring.score(AgentId(i as u32));
        total += executed;
        let plan = person.selected_plan_mut();
        plan.score = Some(match plan.score {
            Some(old) => learning_rate * executed + (1.0 - learning_rate) * old,
            None => executed,
        });
    }
    let n = population.len();
    (n > 0).then(|| total / n as f64)
}
