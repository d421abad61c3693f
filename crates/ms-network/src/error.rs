//! Network error type.

use thiserror::Error;

use ms_core::{CoreError, LinkId, NodeId, TransportMode};

/// Errors produced by `ms-network`.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("no {mode} path from {from} to {to}")]
    NoPath { from: NodeId, to: NodeId, mode: TransportMode },

    #[error("node {0} not found in network")]
    NodeNotFound(NodeId),

    #[error("link {0} not found in network")]
    LinkNotFound(LinkId),

    #[error("invalid link {link}: {reason}")]
    InvalidLink { link: LinkId, reason: String },

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type NetworkResult<T> = Result<T, NetworkError>;
