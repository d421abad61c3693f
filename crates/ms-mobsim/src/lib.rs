//! `ms-mobsim`: the fixed-step mobility simulation.
//!
//! # Tick loop
//!
//! ```text
//! for each tick until all agents are done or stuck, or now > end_time:
//!   for engine in [activity, teleportation, network]:
//!     engine.do_sim_step(ctx)        // releases agents, emits events
//!     flush events to EventsManager
//!     for each released agent, in release order:
//!       activity over → ActivityEnd, PersonDeparture, first accepting
//!                       departure handler takes custody
//!       leg over      → PersonArrival, ActivityStart, ActivityEngine
//!   clock.advance()
//! after the loop: every engine drains, held agents become PersonStuck
//! ```
//!
//! | Module            | Contents                                             |
//! |-------------------|------------------------------------------------------|
//! | [`context`]       | `StepContext`, `EventEmitter`                        |
//! | [`engine`]        | `Steppable`, `DepartureHandler`, `MobsimEngine`      |
//! | [`activity`]      | `ActivityEngine`: wake queue by activity end         |
//! | [`teleportation`] | `TeleportationEngine`: arrival-time priority queue   |
//! | [`network`]       | `NetworkEngine`: link queues, flow and storage caps  |
//! | [`qsim`]          | `QSim`: the tick loop                                |
//! | [`builder`]       | `QSimBuilder`                                        |
//! | [`listener`]      | `MobsimListener`, `MobsimView`, `MobsimReport`       |
//! | [`error`]         | `MobsimError`, `MobsimResult<T>`                     |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use ms_events::EventsManager;
//! use ms_mobsim::{NoopListener, QSimBuilder};
//!
//! let mut events = EventsManager::new();
//! let mut qsim = QSimBuilder::new(&config, &network, &population, &mut events).build()?;
//! let report = qsim.run(&mut NoopListener)?;
//! println!("{} arrived, {} stuck", report.arrived, report.stuck.len());
//! ```

pub mod activity;
pub mod builder;
pub mod context;
pub mod engine;
pub mod error;
pub mod listener;
pub mod network;
pub mod qsim;
pub mod teleportation;

#[cfg(test)]
mod tests;

pub use activity::ActivityEngine;
pub use builder::QSimBuilder;
pub use context::{EventEmitter, StepContext};
pub use engine::{DepartureHandler, MobsimEngine, Steppable};
pub use error::{MobsimError, MobsimResult};
pub use listener::{MobsimListener, MobsimReport, MobsimView, NoopListener};
pub use network::{NetworkEngine, QLink};
pub use qsim::QSim;
pub use teleportation::TeleportationEngine;
