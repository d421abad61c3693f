//! `Person`: an external id and a memory of plans, one of them selected.

use crate::{Plan, PopulationError, PopulationResult};

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Person {
    /// Id from the scenario data.  Agent ids are assigned in ascending
    /// order of this string.
    pub external_id: String,
    plans: Vec<Plan>,
    selected: usize,
}

impl Person {
    /// A person with a single, selected plan.
    pub fn new(external_id: impl Into<String>, plan: Plan) -> Self {
        Self { external_id: external_id.into(), plans: vec![plan], selected: 0 }
    }

    pub fn plans(&self) -> &[Plan] {
        &self.plans
    }

    pub fn plans_mut(&mut self) -> &mut [Plan] {
        &mut self.plans
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected_plan(&self) -> &Plan {
        &self.plans[self.selected]
    }

    pub fn selected_plan_mut(&mut self) -> &mut Plan {
        &mut self.plans[self.selected]
    }

    /// Select plan `index`.
    pub fn select(&mut self, index: usize) -> PopulationResult<()> {
        if index >= self.plans.len() {
            return Err(PopulationError::PlanIndex { person: self.external_id.clone(), index });
        }
        self.selected = index;
        Ok(())
    }

    /// Add `plan`, select it and return its index.
    pub fn add_and_select(&mut self, plan: Plan) -> usize {
        self.plans.push(plan);
        self.selected = self.plans.len() - 1;
        self.selected
    }

    /// Remove plan `index`.  The last remaining plan cannot be removed.
    /// If the selected plan is removed, the best-scored remaining plan is
    /// selected.
    pub fn remove_plan(&mut self, index: usize) -> PopulationResult<Plan> {
        if index >= self.plans.len() || self.plans.len() == 1 {
            return Err(PopulationError::PlanIndex { person: self.external_id.clone(), index });
        }
        let removed = self.plans.remove(index);
        if index == self.selected {
            self.selected = self.best_plan_index();
        } else if index < self.selected {
            self.selected -= 1;
        }
        Ok(removed)
    }

    /// Index of the highest-scored plan; unscored plans rank lowest and ties
    /// go to the earlier plan.
    pub fn best_plan_index(&self) -> usize {
        rank_plans(&self.plans).last().copied().unwrap_or(0)
    }

    /// Index of the lowest-scored plan; unscored plans rank lowest and ties
    /// go to the later plan.
    pub fn worst_plan_index(&self) -> usize {
        rank_plans(&self.plans).first().copied().unwrap_or(0)
    }
}

/// Plan indices sorted worst to best.
fn rank_plans(plans: &[Plan]) -> Vec<usize> {
    let key = |i: usize| plans[i].score.unwrap_or(f64::NEG_INFINITY);
    let mut idx: Vec<usize> = (0..plans.len()).collect();
    // Ascending by score; among equals the earlier plan is "better", so it
    // sorts later.
    idx.sort_by(|&a, &b| key(a).total_cmp(&key(b)).then(b.cmp(&a)));
    idx
}
