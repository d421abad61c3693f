//! `ms-agent`: plan execution state for the mobsim.
//!
//! | Module      | Contents                                                  |
//! |-------------|-----------------------------------------------------------|
//! | [`agent`]   | `MobsimAgent`, `AgentState`, `Holder`                     |
//! | [`store`]   | `AgentStore` built from a `Population`                    |
//! | [`error`]   | `AgentError`, `AgentResult<T>`                            |

pub mod agent;
pub mod error;
pub mod store;


pub use agent::{AgentState, Holder, MobsimAgent};
pub use error::{AgentError, AgentResult};
pub use store::AgentStore;
