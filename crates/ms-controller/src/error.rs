use ms_core::CoreError;
use ms_mobsim::MobsimError;
use ms_network::NetworkError;
use ms_population::PopulationError;
use ms_router::RoutingError;
use thiserror::Error;

use crate::ControllerState;

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("configuration error: {0}")]
    Core(#[from] CoreError),

    #[error("prepare-for-sim failed for person {person}: {source}")]
    Prepare {
        person: String,
        #[source]
        source: RoutingError,
    },

    #[error("routing error: {0}")]
    Routing(#[from] RoutingError),

    #[error("mobsim error: {0}")]
    Mobsim(#[from] MobsimError),

    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    #[error("population error: {0}")]
    Population(#[from] PopulationError),

    #[error("worker pool: {0}")]
    ThreadPool(String),

    #[error("controller is {actual:?}, expected {expected:?}")]
    InvalidState {
        expected: ControllerState,
        actual: ControllerState,
    },
}

pub type ControllerResult<T> = Result<T, ControllerError>;
