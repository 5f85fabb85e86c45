#[cfg(feature = "serde-derive")]
use serde::{Deserialize, Serialize};

/// Population counts in every compartment of the model at one instant.
///
/// The canonical ordering, used by [`Compartments::to_array`] and
/// [`Compartments::from_array`], is `S, Q, A, U, D, T, V, W, Z, R`.
///
/// `Z` (cumulative AIDS deaths) and `R` (cumulative new infections) are
/// counters rather than live populations.
/// They are non-decreasing in forward time and are never clipped.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde-derive", derive(Serialize, Deserialize))]
pub struct Compartments {
    /// Susceptible.
    pub susceptible: f64,
    /// Vaccinated and still susceptible at reduced risk.
    pub vaccinated: f64,
    /// Acute infection.
    pub acute: f64,
    /// Chronic infection, not yet diagnosed.
    pub undiagnosed: f64,
    /// Diagnosed, not on treatment.
    pub diagnosed: f64,
    /// On treatment without viral suppression.
    pub treated: f64,
    /// On treatment with viral suppression.
    pub suppressed: f64,
    /// AIDS.
    pub aids: f64,
    /// Cumulative AIDS deaths.
    pub dead: f64,
    /// Cumulative new infections.
    pub new_infections: f64,
}

impl Compartments {
    /// Number of state variables.
    pub const COUNT: usize = 10;

    /// Short names in canonical order.
    pub const NAMES: [&'static str; Self::COUNT] =
        ["S", "Q", "A", "U", "D", "T", "V", "W", "Z", "R"];

    pub const S: usize = 0;
    pub const Q: usize = 1;
    pub const A: usize = 2;
    pub const U: usize = 3;
    pub const D: usize = 4;
    pub const T: usize = 5;
    pub const V: usize = 6;
    pub const W: usize = 7;
    pub const Z: usize = 8;
    pub const R: usize = 9;

    /// Builds compartments from an array in canonical order.
    #[must_use]
    pub fn from_array(y: [f64; Self::COUNT]) -> Self {
        let [
            susceptible,
            vaccinated,
            acute,
            undiagnosed,
            diagnosed,
            treated,
            suppressed,
            aids,
            dead,
            new_infections,
        ] = y;
        Self {
            susceptible,
            vaccinated,
            acute,
            undiagnosed,
            diagnosed,
            treated,
            suppressed,
            aids,
            dead,
            new_infections,
        }
    }

    /// Returns the compartments as an array in canonical order.
    #[must_use]
    pub fn to_array(&self) -> [f64; Self::COUNT] {
        [
            self.susceptible,
            self.vaccinated,
            self.acute,
            self.undiagnosed,
            self.diagnosed,
            self.treated,
            self.suppressed,
            self.aids,
            self.dead,
            self.new_infections,
        ]
    }

    /// The sexually active population, `S + Q + A + U + D + T + V`.
    ///
    /// This is the mixing denominator for the force of infection.
    #[must_use]
    pub fn sexually_active(&self) -> f64 {
        self.susceptible
            + self.vaccinated
            + self.acute
            + self.undiagnosed
            + self.diagnosed
            + self.treated
            + self.suppressed
    }

    /// Everyone alive, the sexually active population plus `W`.
    #[must_use]
    pub fn alive(&self) -> f64 {
        self.sexually_active() + self.aids
    }

    /// Everyone living with HIV, `A + U + D + T + V + W`.
    #[must_use]
    pub fn infected(&self) -> f64 {
        self.acute
            + self.undiagnosed
            + self.diagnosed
            + self.treated
            + self.suppressed
            + self.aids
    }

    /// Returns a copy with every live compartment clipped to be non-negative.
    ///
    /// The cumulative counters `Z` and `R` are left untouched.
    #[must_use]
    pub fn clip_live(&self) -> Self {
        let mut y = self.to_array();
        for value in &mut y[..Self::Z] {
            *value = value.max(0.0);
        }
        Self::from_array(y)
    }

    /// Returns `true` if every entry is exactly zero.
    #[must_use]
    pub fn is_all_zero(&self) -> bool {
        self.to_array().iter().all(|&value| value == 0.0)
    }

    /// Returns `true` if every entry is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|value| value.is_finite())
    }
}

impl From<[f64; Compartments::COUNT]> for Compartments {
    fn from(y: [f64; Compartments::COUNT]) -> Self {
        Self::from_array(y)
    }
}

impl From<Compartments> for [f64; Compartments::COUNT] {
    fn from(state: Compartments) -> Self {
        state.to_array()
    }
}
