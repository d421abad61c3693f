//! The event record and its kinds.
//!
//! Events are immutable once emitted.  Within one mobsim run their times
//! never decrease; events with the same time keep the order in which the
//! engines emitted them.

use std::fmt;

use ms_core::{AgentId, LinkId, SimTime, TransportMode};

/// What happened.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventKind {
    /// The agent finished an activity and is about to depart.
    ActivityEnd { link: LinkId, activity: String },
    /// The agent starts a leg.
    PersonDeparture { link: LinkId, mode: TransportMode },
    /// The agent's vehicle left the waiting list and joined traffic.
    VehicleEntersTraffic { link: LinkId, mode: TransportMode },
    /// The vehicle left `link` over its downstream node.
    LinkLeave { link: LinkId },
    /// The vehicle entered `link`.
    LinkEnter { link: LinkId },
    /// The vehicle reached the end of its route.
    VehicleLeavesTraffic { link: LinkId, mode: TransportMode },
    /// A teleported leg completed.
    TeleportationArrival { mode: TransportMode, distance_m: f64 },
    /// The agent completed a leg.
    PersonArrival { link: LinkId, mode: TransportMode },
    /// The agent starts an activity.
    ActivityStart { link: LinkId, activity: String },
    /// The agent could not finish its current leg or activity.  Terminal.
    PersonStuck { link: Option<LinkId>, mode: Option<TransportMode> },
}

impl EventKind {
    /// Short type tag, stable across releases.
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::ActivityEnd { .. }          => "actend",
            EventKind::PersonDeparture { .. }      => "departure",
            EventKind::VehicleEntersTraffic { .. } => "vehicle enters traffic",
            EventKind::LinkLeave { .. }            => "left link",
            EventKind::LinkEnter { .. }            => "entered link",
            EventKind::VehicleLeavesTraffic { .. } => "vehicle leaves traffic",
            EventKind::TeleportationArrival { .. } => "travelled",
            EventKind::PersonArrival { .. }        => "arrival",
            EventKind::ActivityStart { .. }        => "actstart",
            EventKind::PersonStuck { .. }          => "stuckAndAbort",
        }
    }
}

/// One timestamped occurrence concerning one agent.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Event {
    pub time: SimTime,
    pub agent: AgentId,
    pub kind: EventKind,
}

impl Event {
    pub fn new(time: SimTime, agent: AgentId, kind: EventKind) -> Self {
        Self { time, agent, kind }
    }

    /// The link the event happened on, if it has one.
    pub fn link(&self) -> Option<LinkId> {
        match &self.kind {
            EventKind::ActivityEnd { link, .. }
            | EventKind::PersonDeparture { link, .. }
            | EventKind::VehicleEntersTraffic { link, .. }
            | EventKind::LinkLeave { link }
            | EventKind::LinkEnter { link }
            | EventKind::VehicleLeavesTraffic { link, .. }
            | EventKind::PersonArrival { link, .. }
            | EventKind::ActivityStart { link, .. } => Some(*link),
            EventKind::PersonStuck { link, .. } => *link,
            EventKind::TeleportationArrival { .. } => None,
        }
    }

    pub fn is_stuck(&self) -> bool {
        matches!(self.kind, EventKind::PersonStuck { .. })
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.time.secs(), self.agent, self.kind.name())?;
        if let Some(link) = self.link() {
            write!(f, " {link}")?;
        }
        Ok(())
    }
}
