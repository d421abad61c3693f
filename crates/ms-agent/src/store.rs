//! `AgentStore`: one `MobsimAgent` per person, indexed by `AgentId`.

use ms_core::AgentId;
use ms_population::Population;

use crate::{AgentError, AgentResult, AgentState, MobsimAgent};

pub struct AgentStore<'p> {
    agents: Vec<MobsimAgent<'p>>,
}

impl<'p> AgentStore<'p> {
    /// One agent per person, executing the person's selected plan.
    pub fn from_population(population: &'p Population) -> AgentResult<Self> {
        let agents = population
            .iter()
            .map(|(id, person)| MobsimAgent::new(id, person.selected_plan()))
            .collect::<AgentResult<Vec<_>>>()?;
        Ok(Self { agents })
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    #[inline]
    pub fn get(&self, id: AgentId) -> AgentResult<&MobsimAgent<'p>> {
        self.agents.get(id.index()).ok_or(AgentError::NotFound(id))
    }

    #[inline]
    pub fn get_mut(&mut self, id: AgentId) -> AgentResult<&mut MobsimAgent<'p>> {
        self.agents.get_mut(id.index()).ok_or(AgentError::NotFound(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &MobsimAgent<'p>> {
        self.agents.iter()
    }

    pub fn count_in(&self, state: AgentState) -> usize {
        self.agents.iter().filter(|a| a.state() == state).count()
    }

    /// `true` when no agent can move any more.
    pub fn all_terminal(&self) -> bool {
        self.agents.iter().all(|a| a.state().is_terminal())
    }
}
