//! `ms-population`: what agents intend to do.
//!
//! | Module          | Contents                                                 |
//! |-----------------|----------------------------------------------------------|
//! | [`plan`]        | `Activity`, `Leg`, `Route`, `PlanElement`, `Plan`, `Trip`|
//! | [`person`]      | `Person` with plan memory and selection                  |
//! | [`population`]  | `Population`, `PopulationBuilder` (assigns `AgentId`s)   |
//! | [`facility`]    | `Facility`: resolved trip end point                      |
//! | [`error`]       | `PopulationError`, `PopulationResult<T>`                 |

pub mod error;
pub mod facility;
pub mod person;
pub mod plan;
pub mod population;


pub use error::{PopulationError, PopulationResult};
pub use facility::Facility;
pub use person::Person;
pub use plan::{
    Activity, GenericRoute, Leg, NetworkRoute, Plan, PlanElement, Route, Trip,
};
pub use population::{Population, PopulationBuilder};
