//! `ActivityEngine`: holds agents while they perform activities.
//!
//! A sparse wake queue keyed by activity end time.  Each tick the engine
//! releases every agent whose end time is not after `now`, earliest first,
//! in insertion order among equal times.

use std::collections::BTreeMap;

use ms_agent::Holder;
use ms_core::{AgentId, SimTime};
use ms_events::EventKind;
use tracing::debug;

use crate::{MobsimResult, StepContext, Steppable};

#[derive(Default)]
pub struct ActivityEngine {
    wake: BTreeMap<SimTime, Vec<AgentId>>,
    total: usize,
}

impl ActivityEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// `agent` has just started its current activity at `ctx.now`.
    ///
    /// Schedules its departure.  An activity that is not the last one but
    /// has neither an end time nor a duration can never be left, so the
    /// agent is aborted right away.
    pub fn handle_activity(&mut self, ctx: &mut StepContext<'_, '_>, id: AgentId) -> MobsimResult<()> {
        let now = ctx.now;
        let agent = ctx.agents.get_mut(id)?;
        if agent.state().is_terminal() {
            return Ok(());
        }
        match agent.activity_end_time(now) {
            Some(end) => {
                agent.claim(Holder::Activity);
                self.wake.entry(end).or_default().push(id);
                self.total += 1;
            }
            None => {
                let link = agent.current_link();
                agent.abort();
                ctx.emit_now(id, EventKind::PersonStuck { link: Some(link), mode: None });
            }
        }
        Ok(())
    }

    /// Earliest scheduled activity end, if any.
    pub fn next_wake(&self) -> Option<SimTime> {
        self.wake.keys().next().copied()
    }
}

impl Steppable for ActivityEngine {
    fn name(&self) -> &'static str {
        "activity"
    }

    fn do_sim_step(&mut self, ctx: &mut StepContext<'_, '_>) -> MobsimResult<()> {
        while let Some(entry) = self.wake.first_entry() {
            if *entry.key() > ctx.now {
                break;
            }
            let due = entry.remove();
            self.total -= due.len();
            for id in due {
                ctx.agents.get_mut(id)?.release(Holder::Activity);
                ctx.release(id);
            }
        }
        Ok(())
    }

    fn after_sim(&mut self, ctx: &mut StepContext<'_, '_>) -> MobsimResult<()> {
        debug!(remaining = self.total, "activity engine draining");
        for (_, ids) in std::mem::take(&mut self.wake) {
            for id in ids {
                let agent = ctx.agents.get_mut(id)?;
                agent.release(Holder::Activity);
                agent.abort();
                let link = agent.current_link();
                ctx.emit_now(id, EventKind::PersonStuck { link: Some(link), mode: None });
            }
        }
        self.total = 0;
        Ok(())
    }

    fn held(&self) -> usize {
        self.total
    }
}
