use hivsim_core::Compartments;

/// The coordinate system a [`Solution`] was integrated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    /// `S, U, D, T, V, W` integrated as logarithms.
    Log,

    /// Every compartment integrated as a population count, after the
    /// log-domain solve diverged.
    Natural,
}

/// A solved trajectory.
///
/// The contents do not depend on [`Domain`]; it is recorded for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// Calendar times of each state.
    pub times: Vec<f64>,

    /// The population at each of `times`.
    pub trajectory: Vec<Compartments>,

    /// Which path produced the trajectory.
    pub domain: Domain,
}

impl Solution {
    /// The population at the last time point.
    #[must_use]
    pub fn final_state(&self) -> Option<&Compartments> {
        self.trajectory.last()
    }

    /// Pairs each time with its population.
    pub fn iter(&self) -> impl Iterator<Item = (f64, &Compartments)> {
        self.times.iter().copied().zip(&self.trajectory)
    }
}
