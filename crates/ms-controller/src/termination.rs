//! When the outer loop stops.

/// Decides whether iteration `iteration` should run.
///
/// Called after every iteration with the number of the next one.
pub trait TerminationCriterion {
    fn continue_iterations(&mut self, iteration: u32) -> bool;
}

impl<F: FnMut(u32) -> bool> TerminationCriterion for F {
    fn continue_iterations(&mut self, iteration: u32) -> bool {
        self(iteration)
    }
}

/// Runs up to and including `last`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LastIteration(pub u32);

impl TerminationCriterion for LastIteration {
    fn continue_iterations(&mut self, iteration: u32) -> bool {
        iteration <= self.0
    }
}
