//! Numeric constraints checked once at construction.
//!
//! A [`Constrained<T, C>`] can only be built from a value that satisfies the
//! marker constraint `C`, so code holding one never re-checks it.
//!
//! # Provided Constraints
//!
//! - [`NonNegative`]: finite and zero or greater (rates, populations)
//! - [`UnitInterval`]: within `[0, 1]` (proportions, efficacy, coverage)
//! - [`Breakpoint`]: within `[0.5, 1)` (the cost-of-effort breakpoint)

use std::{cmp::Ordering, marker::PhantomData};

use num_traits::Float;
use thiserror::Error;

/// A trait for enforcing numeric invariants at construction time.
pub trait Constraint<T> {
    /// Checks that the given value satisfies this constraint.
    ///
    /// # Errors
    ///
    /// Returns a [`ConstraintError`] if the value does not satisfy the constraint.
    fn check(value: &T) -> Result<(), ConstraintError>;
}

/// An error returned when a [`Constraint`] is violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ConstraintError {
    #[error("value must not be negative")]
    Negative,
    #[error("value is not finite")]
    NotFinite,
    #[error("value is not a number")]
    NotANumber,
    #[error("value is below the minimum allowed")]
    BelowMinimum,
    #[error("value is above the maximum allowed")]
    AboveMaximum,
}

/// A wrapper enforcing a numeric constraint at construction time.
///
/// # Example
///
/// ```
/// use hivsim_core::constraint::{Constrained, UnitInterval};
///
/// let p = Constrained::<f64, UnitInterval>::new(0.9).unwrap();
/// assert_eq!(p.into_inner(), 0.9);
/// assert!(UnitInterval::new(1.5).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Constrained<T, C: Constraint<T>> {
    value: T,
    _marker: PhantomData<C>,
}

impl<T, C: Constraint<T>> Constrained<T, C> {
    /// Constructs a new constrained value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value does not satisfy the constraint.
    pub fn new(value: T) -> Result<Self, ConstraintError> {
        C::check(&value)?;
        Ok(Self {
            value,
            _marker: PhantomData,
        })
    }

    /// Consumes the wrapper and returns the inner value.
    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T, C: Constraint<T>> AsRef<T> for Constrained<T, C> {
    fn as_ref(&self) -> &T {
        &self.value
    }
}

/// Marker for finite values `x ≥ 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct NonNegative;

impl NonNegative {
    /// Constructs `Constrained<T, NonNegative>` if the value is finite and not negative.
    ///
    /// # Errors
    ///
    /// Fails with [`ConstraintError::NotFinite`] for NaN or infinite input,
    /// and [`ConstraintError::Negative`] below zero.
    pub fn new<T: Float>(value: T) -> Result<Constrained<T, NonNegative>, ConstraintError> {
        Constrained::new(value)
    }
}

impl<T: Float> Constraint<T> for NonNegative {
    fn check(value: &T) -> Result<(), ConstraintError> {
        if !value.is_finite() {
            return Err(ConstraintError::NotFinite);
        }
        if *value < T::zero() {
            return Err(ConstraintError::Negative);
        }
        Ok(())
    }
}

/// Marker for the closed unit interval `0 ≤ x ≤ 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct UnitInterval;

impl UnitInterval {
    /// Constructs `Constrained<T, UnitInterval>` if `0 ≤ value ≤ 1`.
    ///
    /// # Errors
    ///
    /// Fails with [`ConstraintError::BelowMinimum`], [`ConstraintError::AboveMaximum`],
    /// or [`ConstraintError::NotANumber`].
    pub fn new<T: Float>(value: T) -> Result<Constrained<T, UnitInterval>, ConstraintError> {
        Constrained::new(value)
    }
}

impl<T: Float> Constraint<T> for UnitInterval {
    fn check(value: &T) -> Result<(), ConstraintError> {
        match (value.partial_cmp(&T::zero()), value.partial_cmp(&T::one())) {
            (None, _) | (_, None) => Err(ConstraintError::NotANumber),
            (Some(Ordering::Less), _) => Err(ConstraintError::BelowMinimum),
            (_, Some(Ordering::Greater)) => Err(ConstraintError::AboveMaximum),
            _ => Ok(()),
        }
    }
}

/// Marker for the right-open interval `0.5 ≤ x < 1`.
///
/// Breakpoints below one half would need a concave cost curve to satisfy the
/// "fraction `b` of the cost buys the last `1 - b` of coverage" rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Breakpoint;

impl Breakpoint {
    /// Constructs `Constrained<T, Breakpoint>` if `0.5 ≤ value < 1`.
    ///
    /// # Errors
    ///
    /// Fails with [`ConstraintError::BelowMinimum`], [`ConstraintError::AboveMaximum`],
    /// or [`ConstraintError::NotANumber`].
    pub fn new<T: Float>(value: T) -> Result<Constrained<T, Breakpoint>, ConstraintError> {
        Constrained::new(value)
    }
}

impl<T: Float> Constraint<T> for Breakpoint {
    fn check(value: &T) -> Result<(), ConstraintError> {
        let half = T::one() / (T::one() + T::one());
        match (value.partial_cmp(&half), value.partial_cmp(&T::one())) {
            (None, _) | (_, None) => Err(ConstraintError::NotANumber),
            (Some(Ordering::Less), _) => Err(ConstraintError::BelowMinimum),
            (_, Some(Ordering::Greater | Ordering::Equal)) => Err(ConstraintError::AboveMaximum),
            _ => Ok(()),
        }
    }
}
