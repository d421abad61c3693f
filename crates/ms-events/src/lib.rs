//! `ms-events`: the simulation's output stream.
//!
//! | Module        | Contents                                                 |
//! |---------------|----------------------------------------------------------|
//! | [`event`]     | `Event`, `EventKind`                                     |
//! | [`handler`]   | `EventHandler` trait, `EventRecorder`                    |
//! | [`manager`]   | `EventsManager`: ordered dispatch, per-iteration reset   |

pub mod event;
pub mod handler;
pub mod manager;

#[cfg(test)]
mod tests;

pub use event::{Event, EventKind};
pub use handler::{EventHandler, EventRecorder};
pub use manager::EventsManager;
