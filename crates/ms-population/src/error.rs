//! Population error type.

use thiserror::Error;

use ms_core::AgentId;

#[derive(Debug, Error)]
pub enum PopulationError {
    #[error("agent {0} not found in population")]
    AgentNotFound(AgentId),

    #[error("duplicate person id {0:?}")]
    DuplicatePerson(String),

    #[error("person {person:?}: {reason}")]
    InvalidPerson { person: String, reason: String },

    #[error("invalid plan: {0}")]
    InvalidPlan(String),

    #[error("person {person:?} has no plan at index {index}")]
    PlanIndex { person: String, index: usize },
}

pub type PopulationResult<T> = Result<T, PopulationError>;
