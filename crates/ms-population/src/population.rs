//! `Population` and its builder.
//!
//! # Agent ids
//!
//! The builder sorts persons by external id and assigns `AgentId`s densely
//! in that order.  Every per-agent array in the mobsim and controller is
//! indexed by these ids, and comparing two ids is equivalent to comparing
//! the external ids.

use ms_core::AgentId;

use crate::{Person, PopulationError, PopulationResult};

/// All persons of a scenario, indexed by `AgentId`.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Population {
    persons: Vec<Person>,
}

impl Population {
    pub fn len(&self) -> usize {
        self.persons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.persons.is_empty()
    }

    pub fn get(&self, id: AgentId) -> PopulationResult<&Person> {
        self.persons.get(id.index()).ok_or(PopulationError::AgentNotFound(id))
    }

    pub fn get_mut(&mut self, id: AgentId) -> PopulationResult<&mut Person> {
        self.persons.get_mut(id.index()).ok_or(PopulationError::AgentNotFound(id))
    }

    /// `AgentId` of the person with the given external id.
    pub fn id_of(&self, external_id: &str) -> Option<AgentId> {
        self.persons
            .binary_search_by(|p| p.external_id.as_str().cmp(external_id))
            .ok()
            .map(|i| AgentId(i as u32))
    }

    pub fn ids(&self) -> impl Iterator<Item = AgentId> {
        (0..self.persons.len()).map(|i| AgentId(i as u32))
    }

    /// `(AgentId, &Person)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (AgentId, &Person)> {
        self.persons.iter().enumerate().map(|(i, p)| (AgentId(i as u32), p))
    }

    /// Persons in id order; position `i` belongs to `AgentId(i)`.
    pub fn persons(&self) -> &[Person] {
        &self.persons
    }

    /// Mutable persons in id order, for replanning between mobsim runs.
    pub fn persons_mut(&mut self) -> &mut [Person] {
        &mut self.persons
    }
}

/// Collect persons, then [`build`](Self::build) a [`Population`].
#[derive(Default)]
pub struct PopulationBuilder {
    persons: Vec<Person>,
}

impl PopulationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_person(&mut self, person: Person) -> &mut Self {
        self.persons.push(person);
        self
    }

    /// Sort by external id, assign agent ids, validate every plan.
    ///
    /// Fails on duplicate external ids, on persons without plans and on
    /// plans that do not alternate activities and legs.
    pub fn build(self) -> PopulationResult<Population> {
        let mut persons = self.persons;
        persons.sort_by(|a, b| a.external_id.cmp(&b.external_id));
        if let Some(w) = persons.windows(2).find(|w| w[0].external_id == w[1].external_id) {
            return Err(PopulationError::DuplicatePerson(w[0].external_id.clone()));
        }
        for person in &persons {
            for plan in person.plans() {
                plan.validate().map_err(|e| PopulationError::InvalidPerson {
                    person: person.external_id.clone(),
                    reason: e.to_string(),
                })?;
            }
        }
        Ok(Population { persons })
    }
}
