//! `ms-router`: turns trips into routed legs.
//!
//! # Crate layout
//!
//! | Module           | Contents                                                   |
//! |------------------|------------------------------------------------------------|
//! | [`module`]       | `RoutingModule` trait, network and teleportation modules   |
//! | [`trip_router`]  | `TripRouter`: one module per `TransportMode`               |
//! | [`plan_router`]  | `PlanRouter`, link assignment, facility resolution         |
//! | [`error`]        | `RoutingError`, `RoutingResult<T>`                         |
//!
//! Routers only read the network.  They are shared by reference across the
//! worker threads that prepare and replan plans.

pub mod error;
pub mod module;
pub mod plan_router;
pub mod trip_router;


pub use error::{RoutingError, RoutingResult};
pub use module::{NetworkRoutingModule, RoutingModule, TeleportationRoutingModule};
pub use ms_population::Facility;
pub use plan_router::{PlanRouter, activity_end, assign_links, facility_of};
pub use trip_router::TripRouter;
