//! Agent error type.

use thiserror::Error;

use ms_core::AgentId;

use crate::AgentState;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("agent {0} not found")]
    NotFound(AgentId),

    #[error("agent {agent} has an invalid plan: {reason}")]
    InvalidPlan { agent: AgentId, reason: String },

    #[error("agent {agent}: activity at plan element {index} has no link")]
    UnlocatedActivity { agent: AgentId, index: usize },

    #[error("agent {agent} cannot end an activity in state {state:?}")]
    NotInActivity { agent: AgentId, state: AgentState },

    #[error("agent {agent} cannot end a leg in state {state:?}")]
    NotInLeg { agent: AgentId, state: AgentState },
}

pub type AgentResult<T> = Result<T, AgentError>;
