//! Prepare-for-sim: make every plan executable before a mobsim run.
//!
//! 1. Activities without a link are snapped to the nearest link.
//! 2. Plans with an unrouted leg are routed on the worker pool.  Workers
//!    only read the population; routed plans are written back afterwards in
//!    person order.
//!
//! Any failure is fatal: an activity that cannot be located or a trip that
//! cannot be routed means the scenario does not fit the network.

use ms_core::SimTime;
use ms_network::Network;
use ms_population::{Person, Plan, Population};
use ms_router::{PlanRouter, RoutingResult, assign_links};
use tracing::{debug, info};

use crate::{ControllerError, ControllerResult, WorkerPool};

fn needs_routing(plan: &Plan) -> bool {
    plan.legs().any(|l| l.route.is_none())
}

/// Returns the number of plans that were routed.
pub fn prepare_for_sim(
    population: &mut Population,
    network: &Network,
    router: &PlanRouter<'_, '_>,
    start: SimTime,
    pool: &WorkerPool,
) -> ControllerResult<usize> {
    // ── Locate activities ────────────────────────────────────────────────
    for person in population.persons_mut() {
        let located = person
            .plans_mut()
            .iter_mut()
            .try_for_each(|plan| assign_links(plan, network));
        located.map_err(|source| ControllerError::Prepare {
            person: person.external_id.clone(),
            source,
        })?;
    }

    // ── Route in parallel ────────────────────────────────────────────────
    let routed: Vec<Vec<(usize, RoutingResult<Plan>)>> =
        pool.map(population.persons(), |_, person: &Person| {
            person
                .plans()
                .iter()
                .enumerate()
                .filter(|(_, plan)| needs_routing(plan))
                .map(|(i, plan)| {
                    let result = router.route_plan(plan, person, start).map(|mut p| {
                        p.score = plan.score;
                        p
                    });
                    (i, result)
                })
                .collect()
        });

    // ── Apply in person order ────────────────────────────────────────────
    let mut count = 0;
    for (person, plans) in population.persons_mut().iter_mut().zip(routed) {
        for (i, result) in plans {
            let plan = result.map_err(|source| ControllerError::Prepare {
                person: person.external_id.clone(),
                source,
            })?;
            person.plans_mut()[i] = plan;
            count += 1;
        }
    }

    if count > 0 {
        info!(plans = count, threads = pool.threads(), "prepare-for-sim routed plans");
    } else {
        debug!("prepare-for-sim: every plan already routed");
    }
    Ok(count)
}
