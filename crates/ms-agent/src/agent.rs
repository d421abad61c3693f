//! The per-agent state machine driven by the mobsim.
//!
//! # States
//!
//! ```text
//!             end_activity              end_leg
//!   Activity ─────────────▶ Leg ─────────────────▶ Activity ... ─▶ Done
//!       │                    │
//!       └──────── abort ─────┴──────────────────────────────────▶ Abort
//! ```
//!
//! `Done` and `Abort` are terminal.  The agent reads its plan but never
//! changes it; the plan is borrowed for the whole mobsim run.
//!
//! # Custody
//!
//! At most one engine holds an agent at any time.  Engines [`claim`] an agent
//! when it is handed to them and [`release`] it when they hand it back to
//! the mobsim loop; claiming an agent that is already held is a scheduler
//! defect and panics.
//!
//! [`claim`]: MobsimAgent::claim
//! [`release`]: MobsimAgent::release

use ms_core::{AgentId, LinkId, SimTime, TransportMode};
use ms_population::{Activity, Leg, Plan, PlanElement, Route};

use crate::{AgentError, AgentResult};

// ── State & Holder ────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AgentState {
    /// Performing the activity at `cursor`.
    Activity,
    /// Travelling the leg at `cursor`.
    Leg,
    /// Stuck; will not move again this run.
    Abort,
    /// Reached its last activity.
    Done,
}

impl AgentState {
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, AgentState::Abort | AgentState::Done)
    }
}

/// The engine currently responsible for an agent.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Holder {
    Activity,
    Teleportation,
    Network,
}

// ── MobsimAgent ───────────────────────────────────────────────────────────────

/// Execution state of one agent's selected plan.
#[derive(Clone, Debug)]
pub struct MobsimAgent<'p> {
    id: AgentId,
    plan: &'p Plan,
    cursor: usize,
    state: AgentState,
    current_link: LinkId,
    /// Progress along a network route: `0..links.len()` are the next
    /// intermediate link, `links.len()` means the end link is next,
    /// `links.len() + 1` means the vehicle is on the end link.
    route_cursor: usize,
    holder: Option<Holder>,
}

impl<'p> MobsimAgent<'p> {
    /// Agent `id` at the start of `plan`.
    ///
    /// Fails if the plan is malformed or an activity has no link.
    pub fn new(id: AgentId, plan: &'p Plan) -> AgentResult<Self> {
        plan.validate().map_err(|e| AgentError::InvalidPlan { agent: id, reason: e.to_string() })?;
        for (index, el) in plan.elements.iter().enumerate() {
            if let PlanElement::Activity(a) = el {
                if a.link.is_none() {
                    return Err(AgentError::UnlocatedActivity { agent: id, index });
                }
            }
        }
        let current_link = plan
            .activity_at(0)
            .and_then(|a| a.link)
            .ok_or(AgentError::UnlocatedActivity { agent: id, index: 0 })?;
        // A plan with a single activity has nothing left to do.
        let state = if plan.len() == 1 { AgentState::Done } else { AgentState::Activity };
        Ok(Self {
            id,
            plan,
            cursor: 0,
            state,
            current_link,
            route_cursor: 0,
            holder: None,
        })
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    #[inline]
    pub fn id(&self) -> AgentId {
        self.id
    }

    #[inline]
    pub fn state(&self) -> AgentState {
        self.state
    }

    #[inline]
    pub fn current_link(&self) -> LinkId {
        self.current_link
    }

    #[inline]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[inline]
    pub fn holder(&self) -> Option<Holder> {
        self.holder
    }

    pub fn plan(&self) -> &'p Plan {
        self.plan
    }

    pub fn current_activity(&self) -> Option<&'p Activity> {
        self.plan.activity_at(self.cursor)
    }

    pub fn current_leg(&self) -> Option<&'p Leg> {
        match self.state {
            AgentState::Leg => self.plan.leg_at(self.cursor),
            _ => None,
        }
    }

    /// Mode of the current leg.
    pub fn mode(&self) -> Option<TransportMode> {
        self.current_leg().map(|l| l.mode)
    }

    pub fn is_last_activity(&self) -> bool {
        self.cursor + 1 == self.plan.elements.len()
    }

    // ── Activity side ─────────────────────────────────────────────────────

    /// When the current activity ends, given the agent started it at `now`.
    ///
    /// `None` for the last activity and for activities with neither an end
    /// time nor a duration; such an agent stays until the run ends.  An end
    /// time already in the past yields `now`.
    pub fn activity_end_time(&self, now: SimTime) -> Option<SimTime> {
        if self.state != AgentState::Activity || self.is_last_activity() {
            return None;
        }
        let act = self.current_activity()?;
        let end = act.end_time.or_else(|| act.max_duration.map(|d| now + d))?;
        Some(end.max(now))
    }

    /// Leave the current activity and start the following leg.
    pub fn end_activity(&mut self) -> AgentResult<&'p Leg> {
        if self.state != AgentState::Activity || self.is_last_activity() {
            return Err(AgentError::NotInActivity { agent: self.id, state: self.state });
        }
        self.cursor += 1;
        self.state = AgentState::Leg;
        self.route_cursor = 0;
        self.plan
            .leg_at(self.cursor)
            .ok_or(AgentError::InvalidPlan { agent: self.id, reason: "leg expected".into() })
    }

    // ── Leg side ──────────────────────────────────────────────────────────

    /// Expected travel time of the current leg, as computed by the router.
    pub fn expected_travel_time(&self) -> Option<f64> {
        self.current_leg().and_then(Leg::expected_travel_time)
    }

    /// Route distance of the current leg in metres, 0 without a route.
    pub fn expected_distance(&self) -> f64 {
        self.current_leg()
            .and_then(|l| l.route.as_ref())
            .map(Route::distance_m)
            .unwrap_or(0.0)
    }

    /// Activity before the current leg.
    pub fn origin_activity(&self) -> Option<&'p Activity> {
        self.cursor.checked_sub(1).and_then(|i| self.plan.activity_at(i))
    }

    /// Activity after the current leg.
    pub fn destination_activity(&self) -> Option<&'p Activity> {
        self.plan.activity_at(self.cursor + 1)
    }

    /// Link of the activity after the current leg.
    pub fn destination_link(&self) -> Option<LinkId> {
        self.destination_activity().and_then(|a| a.link)
    }

    /// Whether the current leg is a network route that starts and ends on
    /// the same link.
    pub fn is_same_link_leg(&self) -> bool {
        match self.current_leg().and_then(|l| l.route.as_ref()) {
            Some(Route::Network(r)) => r.is_same_link(),
            Some(Route::Generic(r)) => r.start_link == r.end_link,
            None => self.destination_link() == Some(self.current_link),
        }
    }

    /// A teleported leg put the agent on `link`.
    pub fn notify_arrival_on_link_by_non_network_mode(&mut self, link: LinkId) {
        self.current_link = link;
    }

    /// Next link a vehicle should enter, or `None` once it is on the end
    /// link of its route (or the leg has no network route).
    pub fn choose_next_link(&self) -> Option<LinkId> {
        let route = self.current_leg()?.route.as_ref()?.as_network()?;
        let n = route.links.len();
        match self.route_cursor {
            i if i < n => Some(route.links[i]),
            i if i == n => Some(route.end_link),
            _ => None,
        }
    }

    /// The vehicle crossed a node onto `link`.
    pub fn notify_move_over_node(&mut self, link: LinkId) {
        self.route_cursor += 1;
        self.current_link = link;
    }

    /// `true` once the vehicle has entered the end link of its route.
    pub fn wants_to_arrive_on_current_link(&self) -> bool {
        self.choose_next_link().is_none()
    }

    /// Finish the current leg and start the following activity.  Moves to
    /// `Done` if that activity is the last one.
    pub fn end_leg(&mut self) -> AgentResult<&'p Activity> {
        if self.state != AgentState::Leg {
            return Err(AgentError::NotInLeg { agent: self.id, state: self.state });
        }
        self.cursor += 1;
        let act = self
            .plan
            .activity_at(self.cursor)
            .ok_or(AgentError::InvalidPlan { agent: self.id, reason: "activity expected".into() })?;
        if let Some(link) = act.link {
            self.current_link = link;
        }
        self.state = if self.is_last_activity() { AgentState::Done } else { AgentState::Activity };
        Ok(act)
    }

    /// Mark the agent stuck.
    pub fn abort(&mut self) {
        self.state = AgentState::Abort;
    }

    // ── Custody ───────────────────────────────────────────────────────────

    /// Hand the agent to `holder`.
    ///
    /// # Panics
    ///
    /// Panics if another engine already holds the agent.
    pub fn claim(&mut self, holder: Holder) {
        assert!(
            self.holder.is_none(),
            "{} claimed by {holder:?} while held by {:?}",
            self.id,
            self.holder,
        );
        self.holder = Some(holder);
    }

    /// `holder` gives the agent back.
    ///
    /// # Panics
    ///
    /// Panics if `holder` does not hold the agent.
    pub fn release(&mut self, holder: Holder) {
        assert_eq!(self.holder, Some(holder), "{} released by a non-holder", self.id);
        self.holder = None;
    }
}
