//! `ms-core`: foundational types for the `rust_mobsim` framework.
//!
//! Every other `ms-*` crate depends on this one.  It has no `ms-*`
//! dependencies and few external ones (`rand`, `thiserror`, optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`ids`]         | `AgentId`, `NodeId`, `LinkId`                         |
//! | [`time`]        | `SimTime`, `Tick`, `SimClock`                         |
//! | [`geo`]         | `Coord`, beeline distance                             |
//! | [`transport`]   | `TransportMode`, `ModeSet`                            |
//! | [`rng`]         | `AgentRng` (per agent, per iteration)                 |
//! | [`config`]      | `SimConfig` and its sections                          |
//! | [`error`]       | `CoreError`, `CoreResult`                             |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod config;
pub mod error;
pub mod geo;
pub mod ids;
pub mod rng;
pub mod time;
pub mod transport;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{
    ControllerConfig, GlobalConfig, QSimConfig, ReplanningConfig, RoutingConfig, ScoringConfig,
    SimConfig, StrategyKind, StrategySettings, TeleportedModeParams,
};
pub use error::{CoreError, CoreResult};
pub use geo::Coord;
pub use ids::{AgentId, LinkId, NodeId};
pub use rng::AgentRng;
pub use time::{SimClock, SimTime, Tick};
pub use transport::{ModeSet, TransportMode};
