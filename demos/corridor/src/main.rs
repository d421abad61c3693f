//! corridor: morning and evening commute over a bottlenecked corridor.
//!
//! Commuters live in the suburb and work downtown.  Car routes follow free
//! speed, so every car crosses the one-lane bridge and the morning peak
//! queues behind it.  Over the iterations agents switch legs to transit and
//! fall back to their best-scored plans.
//!
//! Log verbosity follows `MSIM_LOG`, then `RUST_LOG`.  Set `MSIM_LOG_JSON=1`
//! for JSON log lines.

mod network;

use std::time::Instant;

use anyhow::Result;
use ms_controller::{
    ControllerBuilder, ControllerListener, IterationSummary, LogFormat, RunSummary, init_tracing,
};
use ms_core::{Coord, SimConfig, SimTime, TransportMode};
use ms_population::{Activity, Leg, Person, Plan, Population, PopulationBuilder};
use tracing::info;

use network::{DOWNTOWN, SUBURB, build_network};

// ── Constants ─────────────────────────────────────────────────────────────────

const AGENT_COUNT:           usize = 600;
const SEED:                  u64   = 42;
const LAST_ITERATION:        u32   = 10;
const DEPARTURE_SPREAD_SECS: f64   = 3_600.0; // departures spread from 07:00
const WORK_HOURS:            f64   = 9.0;

// ── Population ────────────────────────────────────────────────────────────────

/// home → car → work → car → home, with homes and workplaces scattered
/// around the two ends of the corridor.
fn build_population() -> Result<Population> {
    let mut b = PopulationBuilder::new();
    for i in 0..AGENT_COUNT {
        let frac = i as f64 / AGENT_COUNT as f64;
        let jitter = (i % 7) as f64 * 40.0;
        let home = Coord::new(SUBURB.x - jitter, SUBURB.y + jitter);
        let work = Coord::new(DOWNTOWN.x + jitter, DOWNTOWN.y - jitter);
        let leave = SimTime::from_hms(7, 0, 0).secs() + frac * DEPARTURE_SPREAD_SECS;

        let plan = Plan::new()
            .activity(Activity::at_coord("home", home).ending_at(SimTime(leave)))
            .leg(Leg::new(TransportMode::Car))
            .activity(Activity::at_coord("work", work).lasting(WORK_HOURS * 3_600.0))
            .leg(Leg::new(TransportMode::Car))
            .activity(Activity::at_coord("home", home));
        b.add_person(Person::new(format!("commuter_{i}"), plan));
    }
    Ok(b.build()?)
}

// ── Progress table ────────────────────────────────────────────────────────────

struct ProgressTable;

impl ControllerListener for ProgressTable {
    fn on_startup(&mut self, population: &Population) {
        println!("Population: {} agents", population.len());
        println!();
        println!(
            "{:<5} {:>8} {:>6} {:>10} {:>9} {:>9} {:>7}",
            "Iter", "Arrived", "Stuck", "MeanScore", "Selected", "Innovated", "Failed"
        );
        println!("{}", "-".repeat(60));
    }

    fn on_iteration_end(&mut self, summary: &IterationSummary, _population: &Population) {
        let replanning = summary.replanning.clone().unwrap_or_default();
        println!(
            "{:<5} {:>8} {:>6} {:>10.3} {:>9} {:>9} {:>7}",
            summary.iteration,
            summary.arrivals(),
            summary.stuck().len(),
            summary.mean_score.unwrap_or(f64::NAN),
            replanning.selected,
            replanning.innovated,
            replanning.failed,
        );
    }

    fn on_shutdown(&mut self, summary: &RunSummary) {
        println!();
        println!("{} iterations complete", summary.iterations.len());
    }
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let json = std::env::var("MSIM_LOG_JSON").is_ok_and(|v| v == "1");
    init_tracing(if json { LogFormat::Json } else { LogFormat::Pretty });

    println!("=== corridor: suburb to downtown commute ===");
    println!("Agents: {AGENT_COUNT}  |  Iterations: 0..={LAST_ITERATION}  |  Seed: {SEED}");
    println!();

    let network = build_network()?;
    println!("Road network: {} nodes, {} links", network.node_count(), network.link_count());
    let population = build_population()?;

    let mut config = SimConfig::default();
    config.controller.last_iteration = LAST_ITERATION;
    config.global.seed = SEED;
    config.qsim.end_time = Some(SimTime::from_hms(24, 0, 0));
    config.replanning.disable_innovation_after = Some(LAST_ITERATION * 8 / 10);
    config.validate()?;

    let mut controller = ControllerBuilder::new(config, &network, population).build()?;
    let t0 = Instant::now();
    let summary = controller.run(&mut ProgressTable)?;
    let elapsed = t0.elapsed();
    info!(secs = elapsed.as_secs_f64(), "run complete");

    println!("Finished in {:.3} s", elapsed.as_secs_f64());
    if let Some(last) = summary.last() {
        println!("Last mobsim ended at {} after {} ticks", last.end_time(), last.mobsim.ticks);
    }

    // Final mode share of the selected plans.
    let mut car = 0;
    let mut other = 0;
    for person in controller.population().persons() {
        for leg in person.selected_plan().legs() {
            if leg.mode == TransportMode::Car { car += 1 } else { other += 1 }
        }
    }
    println!("Selected legs: {car} car, {other} other");

    Ok(())
}
