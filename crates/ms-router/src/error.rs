//! Routing error type.

use thiserror::Error;

use ms_core::TransportMode;
use ms_network::NetworkError;
use ms_population::PopulationError;

#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("no routing module bound for mode {0}")]
    NoModuleForMode(TransportMode),

    #[error("teleported mode {0} has no speed configured")]
    MissingSpeed(TransportMode),

    #[error("plan element {index} has no usable location")]
    UnlocatedActivity { index: usize },

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error(transparent)]
    Population(#[from] PopulationError),
}

pub type RoutingResult<T> = Result<T, RoutingError>;
