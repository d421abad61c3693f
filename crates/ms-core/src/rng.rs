//! Deterministic per-agent RNG.
//!
//! # Determinism strategy
//!
//! Replanning draws random numbers per agent, possibly on several worker
//! threads.  Each agent gets its own `SmallRng` seeded by:
//!
//!   seed = global_seed XOR (agent_id * MIXING_CONSTANT) XOR (iteration * MIXING_CONSTANT²)
//!
//! The mixing constant is the 64-bit fractional part of the golden ratio,
//! which spreads consecutive ids uniformly across the seed space.  This means:
//!
//! - Agents never share RNG state (no contention, no ordering dependency).
//! - The draws an agent sees in iteration `i` do not depend on how work was
//!   split between threads, so parallel and sequential replanning agree.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::AgentId;

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Per-agent deterministic RNG.
///
/// Created on demand for one agent and one iteration; never shared across
/// threads.
pub struct AgentRng(SmallRng);

impl AgentRng {
    /// Seed deterministically from the run's global seed and an agent ID.
    pub fn new(global_seed: u64, agent: AgentId) -> Self {
        let seed = global_seed ^ u64::from(agent.0).wrapping_mul(MIXING_CONSTANT);
        AgentRng(SmallRng::seed_from_u64(seed))
    }

    /// Seed for one agent in one iteration of the outer loop.
    pub fn for_iteration(global_seed: u64, iteration: u32, agent: AgentId) -> Self {
        let salt = u64::from(iteration)
            .wrapping_add(1)
            .wrapping_mul(MIXING_CONSTANT)
            .wrapping_mul(MIXING_CONSTANT);
        Self::new(global_seed ^ salt, agent)
    }

    /// Sample a uniformly distributed value of any `Standard`-distributed type.
    #[inline]
    pub fn random<T>(&mut self) -> T
    where
        rand::distributions::Standard: rand::distributions::Distribution<T>,
    {
        self.0.r#gen()
    }

    /// Choose a random element from a slice.
    /// Returns `None` if the slice is empty.
    #[inline]
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        use rand::seq::SliceRandom;
        slice.choose(&mut self.0)
    }
}
