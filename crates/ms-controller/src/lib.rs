//! `ms-controller`: the outer iteration loop.
//!
//! | Module          | Contents                                                   |
//! |-----------------|------------------------------------------------------------|
//! | [`controller`]  | `Controller`, `ControllerBuilder`, state, summaries, listener |
//! | [`prepare`]     | `prepare_for_sim`: link assignment and initial routing     |
//! | [`scoring`]     | `Scoring` trait, `TravelTimeScoring`, `apply_scores`       |
//! | [`replanning`]  | `StrategyManager`, `trim_plans`                            |
//! | [`termination`] | `TerminationCriterion`, `LastIteration`                    |
//! | [`pool`]        | `WorkerPool` for per-agent precomputation                  |
//! | [`logging`]     | `init_tracing`, `LogFormat`                                |
//! | [`error`]       | `ControllerError`, `ControllerResult<T>`                   |
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                    |
//! |------------|-----------------------------------------------------------|
//! | `parallel` | Prepare-for-sim and replanning decisions on a Rayon pool. |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use ms_controller::{ControllerBuilder, NoopControllerListener, init_tracing, LogFormat};
//!
//! init_tracing(LogFormat::Pretty);
//! let mut controller = ControllerBuilder::new(config, &network, population).build()?;
//! let summary = controller.run(&mut NoopControllerListener)?;
//! ```

pub mod controller;
pub mod error;
pub mod logging;
pub mod pool;
pub mod prepare;
pub mod replanning;
pub mod scoring;
pub mod termination;


pub use controller::{
    Controller, ControllerBuilder, ControllerListener, ControllerState, IterationSummary,
    NoopControllerListener, RunSummary,
};
pub use error::{ControllerError, ControllerResult};
pub use logging::{LogFormat, init_tracing};
pub use pool::WorkerPool;
pub use prepare::prepare_for_sim;
pub use replanning::{ReplanningStats, StrategyManager, trim_plans};
pub use scoring::{Scoring, TravelTimeScoring, apply_scores};
pub use termination::{LastIteration, TerminationCriterion};
