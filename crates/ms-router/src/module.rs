//! The `RoutingModule` trait and the two built-in modules.
//!
//! A routing module turns one trip (from a facility to a facility at a
//! departure time) into the plan elements that travel it.  Both built-in
//! modules produce exactly one `Leg` with its expected travel time set,
//! which is what the mobsim relies on for teleported legs.

use ms_core::{SimTime, TransportMode};
use ms_network::{Network, PathFinder};
use ms_population::{
    Facility, GenericRoute, Leg, NetworkRoute, Person, PlanElement, Route,
};

use crate::RoutingResult;

// ── Trait ─────────────────────────────────────────────────────────────────────

/// Routes one trip for one mode.
///
/// `Send + Sync` so one instance can serve all worker threads of a parallel
/// routing phase.
pub trait RoutingModule: Send + Sync {
    fn calc_route(
        &self,
        from: &Facility,
        to: &Facility,
        departure: SimTime,
        person: &Person,
    ) -> RoutingResult<Vec<PlanElement>>;
}

// ── NetworkRoutingModule ──────────────────────────────────────────────────────

/// Routes a network mode over the links that allow it.
///
/// The route starts at the end of `from.link` and finishes at the end of
/// `to.link`.  Its expected travel time covers the intermediate links and
/// the end link at free speed; the start link is already behind the
/// vehicle when it enters traffic.
pub struct NetworkRoutingModule<'a> {
    mode: TransportMode,
    network: &'a Network,
    path_finder: &'a dyn PathFinder,
}

impl<'a> NetworkRoutingModule<'a> {
    pub fn new(mode: TransportMode, network: &'a Network, path_finder: &'a dyn PathFinder) -> Self {
        Self { mode, network, path_finder }
    }
}

impl RoutingModule for NetworkRoutingModule<'_> {
    fn calc_route(
        &self,
        from: &Facility,
        to: &Facility,
        departure: SimTime,
        _person: &Person,
    ) -> RoutingResult<Vec<PlanElement>> {
        let net = self.network;
        net.check_link(from.link)?;
        net.check_link(to.link)?;

        let route = if from.link == to.link {
            NetworkRoute {
                start_link: from.link,
                links: Vec::new(),
                end_link: to.link,
                distance_m: 0.0,
                travel_time_secs: 0.0,
            }
        } else {
            let path = self.path_finder.find_path(
                net,
                net.link_to[from.link.index()],
                net.link_from[to.link.index()],
                self.mode,
                departure,
            )?;
            NetworkRoute {
                start_link: from.link,
                end_link: to.link,
                distance_m: path.distance_m + net.link_length_m[to.link.index()],
                travel_time_secs: path.travel_time_secs + net.free_travel_time(to.link),
                links: path.links,
            }
        };

        let leg = Leg {
            mode: self.mode,
            departure_time: Some(departure),
            travel_time: Some(route.travel_time_secs),
            route: Some(Route::Network(route)),
        };
        Ok(vec![PlanElement::Leg(leg)])
    }
}

// ── TeleportationRoutingModule ────────────────────────────────────────────────

/// Beeline router: distance is the straight line between the facilities
/// times a detour factor, travel time is that distance over a fixed speed.
pub struct TeleportationRoutingModule {
    mode: TransportMode,
    speed_mps: f64,
    beeline_distance_factor: f64,
}

impl TeleportationRoutingModule {
    pub fn new(mode: TransportMode, speed_mps: f64, beeline_distance_factor: f64) -> Self {
        debug_assert!(speed_mps > 0.0, "teleportation speed must be positive");
        Self { mode, speed_mps, beeline_distance_factor }
    }
}

impl RoutingModule for TeleportationRoutingModule {
    fn calc_route(
        &self,
        from: &Facility,
        to: &Facility,
        departure: SimTime,
        _person: &Person,
    ) -> RoutingResult<Vec<PlanElement>> {
        let distance_m = from.coord.distance(to.coord) * self.beeline_distance_factor;
        let travel_time = distance_m / self.speed_mps;
        let leg = Leg {
            mode: self.mode,
            departure_time: Some(departure),
            travel_time: Some(travel_time),
            route: Some(Route::Generic(GenericRoute {
                start_link: from.link,
                end_link: to.link,
                distance_m,
                travel_time_secs: Some(travel_time),
            })),
        };
        Ok(vec![PlanElement::Leg(leg)])
    }
}
