use ms_agent::AgentError;
use ms_core::{AgentId, CoreError, TransportMode};
use ms_network::NetworkError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MobsimError {
    #[error("no departure handler accepts agent {agent} with mode {mode}")]
    NoDepartureHandler { agent: AgentId, mode: TransportMode },

    #[error("agent {agent}: teleported {mode} leg has no expected travel time")]
    UndefinedTravelTime { agent: AgentId, mode: TransportMode },

    #[error("agent {agent}: {mode} leg has no network route")]
    MissingRoute { agent: AgentId, mode: TransportMode },

    #[error("no {0} engine registered")]
    MissingEngine(&'static str),

    #[error("agent error: {0}")]
    Agent(#[from] AgentError),

    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    #[error("configuration error: {0}")]
    Core(#[from] CoreError),
}

pub type MobsimResult<T> = Result<T, MobsimError>;
