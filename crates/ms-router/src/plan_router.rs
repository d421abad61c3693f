//! Route whole plans.
//!
//! Departure times are propagated through the plan: an activity ends at its
//! `end_time` if it has one, otherwise after `max_duration`; each leg departs
//! when the preceding activity ends and takes its routed travel time.

use ms_core::{Coord, SimTime};
use ms_network::Network;
use ms_population::{Activity, Person, Plan, PlanElement, Trip};
use tracing::trace;

use crate::{Facility, RoutingError, RoutingResult, TripRouter};

/// Give every activity of `plan` a link, snapping coordinate-only activities
/// to the nearest link.
pub fn assign_links(plan: &mut Plan, network: &Network) -> RoutingResult<()> {
    for (index, el) in plan.elements.iter_mut().enumerate() {
        let PlanElement::Activity(act) = el else { continue };
        if act.link.is_some() {
            continue;
        }
        let coord = act.coord.ok_or(RoutingError::UnlocatedActivity { index })?;
        act.link = Some(network.nearest_link(coord).ok_or(RoutingError::UnlocatedActivity { index })?);
    }
    Ok(())
}

/// Where a trip starts or ends.  The coordinate falls back to the
/// downstream node of the activity's link.
pub fn facility_of(activity: &Activity, network: &Network, index: usize) -> RoutingResult<Facility> {
    let link = activity.link.ok_or(RoutingError::UnlocatedActivity { index })?;
    network.check_link(link)?;
    let coord: Coord = activity.coord.unwrap_or_else(|| network.link_to_coord(link));
    Ok(Facility::new(link, coord))
}

/// Time at which `activity` ends when the agent arrives at `now`.
/// `None` for an activity that never ends.
pub fn activity_end(activity: &Activity, now: SimTime) -> Option<SimTime> {
    activity
        .end_time
        .or_else(|| activity.max_duration.map(|d| now + d))
}

/// Routes every trip of a plan through a [`TripRouter`].
pub struct PlanRouter<'r, 'a> {
    trip_router: &'r TripRouter<'a>,
    network: &'a Network,
}

impl<'r, 'a> PlanRouter<'r, 'a> {
    pub fn new(trip_router: &'r TripRouter<'a>, network: &'a Network) -> Self {
        Self { trip_router, network }
    }

    /// A copy of `plan` with every trip routed.  The input is not modified,
    /// so on error the caller still has the previous plan.
    pub fn route_plan(&self, plan: &Plan, person: &Person, start: SimTime) -> RoutingResult<Plan> {
        let mut routed = plan.clone();
        routed.score = None;
        assign_links(&mut routed, self.network)?;

        let trips: Vec<Trip> = routed.trips().collect();
        let mut now = start;
        // A module may return several elements for one leg; later trips move
        // back by the difference.
        let mut shift = 0usize;
        for trip in &trips {
            let trip = Trip {
                origin: trip.origin + shift,
                leg: trip.leg + shift,
                destination: trip.destination + shift,
            };
            let origin = routed
                .activity_at(trip.origin)
                .ok_or(RoutingError::UnlocatedActivity { index: trip.origin })?;
            now = activity_end(origin, now).unwrap_or(now);
            let elements = self.route_trip(&routed, trip, person, now)?;
            now = now + travel_time_of(&elements);
            shift += elements.len().saturating_sub(1);
            routed.replace_trip(trip, elements)?;
        }
        trace!(person = %person.external_id, trips = trips.len(), "plan routed");
        Ok(routed)
    }

    /// Elements for one trip of `plan` departing at `departure`, using the
    /// mode of the trip's current leg.
    pub fn route_trip(
        &self,
        plan: &Plan,
        trip: Trip,
        person: &Person,
        departure: SimTime,
    ) -> RoutingResult<Vec<PlanElement>> {
        let leg = plan
            .leg_at(trip.leg)
            .ok_or(RoutingError::UnlocatedActivity { index: trip.leg })?;
        let from = plan
            .activity_at(trip.origin)
            .ok_or(RoutingError::UnlocatedActivity { index: trip.origin })?;
        let to = plan
            .activity_at(trip.destination)
            .ok_or(RoutingError::UnlocatedActivity { index: trip.destination })?;
        let from = facility_of(from, self.network, trip.origin)?;
        let to = facility_of(to, self.network, trip.destination)?;
        self.trip_router.calc_route(leg.mode, &from, &to, departure, person)
    }
}

fn travel_time_of(elements: &[PlanElement]) -> f64 {
    elements
        .iter()
        .filter_map(PlanElement::as_leg)
        .filter_map(|l| l.expected_travel_time())
        .sum()
}
