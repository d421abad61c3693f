//! Plan elements: `Activity`, `Leg`, `Route` and the `Plan` that orders them.
//!
//! # Shape
//!
//! A valid plan alternates strictly between activities and legs and starts
//! and ends with an activity:
//!
//! ```text
//! Act  Leg  Act  Leg  Act ...  Act
//! ```
//!
//! Every leg together with its surrounding activities is one *trip*.  The
//! mobsim reads plans without modifying them; only replanning, between
//! mobsim runs, changes them.

use ms_core::{Coord, LinkId, SimTime, TransportMode};

use crate::{PopulationError, PopulationResult};

// ── Activity ──────────────────────────────────────────────────────────────────

/// Something an agent does at one location.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Activity {
    /// Application-defined type, e.g. `"home"` or `"work"`.
    pub kind: String,

    /// Link the activity takes place on.  Filled in from `coord` before the
    /// first mobsim run if missing.
    pub link: Option<LinkId>,

    /// Location in network coordinates.
    pub coord: Option<Coord>,

    /// Absolute end time.  Takes precedence over `max_duration`.
    pub end_time: Option<SimTime>,

    /// Duration in seconds, counted from the agent's arrival.
    pub max_duration: Option<f64>,
}

impl Activity {
    /// An activity on `link` with no timing yet.
    pub fn on_link(kind: impl Into<String>, link: LinkId) -> Self {
        Self { kind: kind.into(), link: Some(link), coord: None, end_time: None, max_duration: None }
    }

    /// An activity at `coord`; its link is resolved later.
    pub fn at_coord(kind: impl Into<String>, coord: Coord) -> Self {
        Self { kind: kind.into(), link: None, coord: Some(coord), end_time: None, max_duration: None }
    }

    pub fn ending_at(mut self, end: SimTime) -> Self {
        self.end_time = Some(end);
        self
    }

    pub fn lasting(mut self, secs: f64) -> Self {
        self.max_duration = Some(secs);
        self
    }
}

// ── Route ─────────────────────────────────────────────────────────────────────

/// Route over network links.
///
/// `links` holds only the links *between* the start and the end link; both
/// of those are stored separately.  A route with `start_link == end_link`
/// and no intermediate links is a same-link trip.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NetworkRoute {
    pub start_link: LinkId,
    pub links: Vec<LinkId>,
    pub end_link: LinkId,
    /// Metres, intermediate links plus the end link.
    pub distance_m: f64,
    /// Expected travel time in seconds.
    pub travel_time_secs: f64,
}

impl NetworkRoute {
    /// `true` if the trip starts and ends on the same link.
    pub fn is_same_link(&self) -> bool {
        self.start_link == self.end_link && self.links.is_empty()
    }
}

/// Route that is only described by its end points, used for teleported legs.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GenericRoute {
    pub start_link: LinkId,
    pub end_link: LinkId,
    pub distance_m: f64,
    pub travel_time_secs: Option<f64>,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Route {
    Network(NetworkRoute),
    Generic(GenericRoute),
}

impl Route {
    pub fn start_link(&self) -> LinkId {
        match self {
            Route::Network(r) => r.start_link,
            Route::Generic(r) => r.start_link,
        }
    }

    pub fn end_link(&self) -> LinkId {
        match self {
            Route::Network(r) => r.end_link,
            Route::Generic(r) => r.end_link,
        }
    }

    pub fn distance_m(&self) -> f64 {
        match self {
            Route::Network(r) => r.distance_m,
            Route::Generic(r) => r.distance_m,
        }
    }

    pub fn travel_time_secs(&self) -> Option<f64> {
        match self {
            Route::Network(r) => Some(r.travel_time_secs),
            Route::Generic(r) => r.travel_time_secs,
        }
    }

    pub fn as_network(&self) -> Option<&NetworkRoute> {
        match self {
            Route::Network(r) => Some(r),
            Route::Generic(_) => None,
        }
    }
}

// ── Leg ───────────────────────────────────────────────────────────────────────

/// Movement between two activities with a single mode.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Leg {
    pub mode: TransportMode,
    /// Planned departure, set by the router.
    pub departure_time: Option<SimTime>,
    /// Expected travel time in seconds, set by the router.
    pub travel_time: Option<f64>,
    pub route: Option<Route>,
}

impl Leg {
    /// A leg with no route yet.
    pub fn new(mode: TransportMode) -> Self {
        Self { mode, departure_time: None, travel_time: None, route: None }
    }

    /// Expected travel time: the leg's own value, else the route's.
    pub fn expected_travel_time(&self) -> Option<f64> {
        self.travel_time
            .or_else(|| self.route.as_ref().and_then(Route::travel_time_secs))
    }
}

// ── PlanElement / Plan ────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PlanElement {
    Activity(Activity),
    Leg(Leg),
}

impl PlanElement {
    pub fn as_activity(&self) -> Option<&Activity> {
        match self {
            PlanElement::Activity(a) => Some(a),
            PlanElement::Leg(_) => None,
        }
    }

    pub fn as_leg(&self) -> Option<&Leg> {
        match self {
            PlanElement::Leg(l) => Some(l),
            PlanElement::Activity(_) => None,
        }
    }

    pub fn as_leg_mut(&mut self) -> Option<&mut Leg> {
        match self {
            PlanElement::Leg(l) => Some(l),
            PlanElement::Activity(_) => None,
        }
    }
}

/// Element indices of one trip: `origin` activity, `leg`, `destination`
/// activity.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Trip {
    pub origin: usize,
    pub leg: usize,
    pub destination: usize,
}

/// One day's schedule for one person plus its last known score.
#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Plan {
    pub elements: Vec<PlanElement>,
    /// `None` until the plan has been executed and scored.
    pub score: Option<f64>,
}

impl Plan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an activity (builder style).
    pub fn activity(mut self, act: Activity) -> Self {
        self.elements.push(PlanElement::Activity(act));
        self
    }

    /// Append a leg (builder style).
    pub fn leg(mut self, leg: Leg) -> Self {
        self.elements.push(PlanElement::Leg(leg));
        self
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Check the `Act (Leg Act)*` shape.
    pub fn validate(&self) -> PopulationResult<()> {
        if self.elements.is_empty() {
            return Err(PopulationError::InvalidPlan("plan has no elements".into()));
        }
        for (i, el) in self.elements.iter().enumerate() {
            let expect_activity = i % 2 == 0;
            let is_activity = matches!(el, PlanElement::Activity(_));
            if expect_activity != is_activity {
                return Err(PopulationError::InvalidPlan(format!(
                    "element {i} should be {}",
                    if expect_activity { "an activity" } else { "a leg" }
                )));
            }
        }
        if self.elements.len() % 2 == 0 {
            return Err(PopulationError::InvalidPlan("plan must end with an activity".into()));
        }
        Ok(())
    }

    /// Trips in plan order.  Assumes a validated plan.
    pub fn trips(&self) -> impl Iterator<Item = Trip> + '_ {
        self.elements
            .iter()
            .enumerate()
            .filter(|(_, el)| matches!(el, PlanElement::Leg(_)))
            .map(|(i, _)| Trip { origin: i - 1, leg: i, destination: i + 1 })
    }

    pub fn activities(&self) -> impl Iterator<Item = &Activity> {
        self.elements.iter().filter_map(PlanElement::as_activity)
    }

    pub fn legs(&self) -> impl Iterator<Item = &Leg> {
        self.elements.iter().filter_map(PlanElement::as_leg)
    }

    pub fn activity_at(&self, index: usize) -> Option<&Activity> {
        self.elements.get(index).and_then(PlanElement::as_activity)
    }

    pub fn leg_at(&self, index: usize) -> Option<&Leg> {
        self.elements.get(index).and_then(PlanElement::as_leg)
    }

    pub fn leg_at_mut(&mut self, index: usize) -> Option<&mut Leg> {
        self.elements.get_mut(index).and_then(PlanElement::as_leg_mut)
    }

    /// Replace the leg at `trip.leg` with the elements a router produced for
    /// that trip.  Returns an error if `trip` does not address a leg.
    pub fn replace_trip(&mut self, trip: Trip, elements: Vec<PlanElement>) -> PopulationResult<()> {
        if self.leg_at(trip.leg).is_none() {
            return Err(PopulationError::InvalidPlan(format!("element {} is not a leg", trip.leg)));
        }
        self.elements.splice(trip.leg..=trip.leg, elements);
        Ok(())
    }
}
