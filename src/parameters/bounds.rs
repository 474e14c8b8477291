//! Parameter bounds.
//!
//! Bounds are soft limits: a [`Parameter`](super::Parameter) happily stores a
//! value outside them, and it is the search backends that enforce them. Three
//! enforcement styles are supported here:
//!
//! - rejection (`contains_open`), used by the log-probability function,
//! - unit-cube mapping (`from_unit`), used by nested sampling priors,
//! - the Minuit-style [`BoundsTransform`], used by the local minimizer.

use serde::{Deserialize, Serialize};
use std::f64::{INFINITY, NEG_INFINITY};
use thiserror::Error;

/// Errors that can occur when working with parameter bounds
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BoundsError {
    #[error("Invalid bounds: min ({min}) must be less than max ({max})")]
    InvalidBounds { min: f64, max: f64 },

    #[error("Parameter value {value} is outside bounds: [{min}, {max}]")]
    ValueOutsideBounds { value: f64, min: f64, max: f64 },

    #[error("Bounds [{min}, {max}] are not finite")]
    Unbounded { min: f64, max: f64 },

    #[error("Infinite parameter value is not allowed")]
    InfiniteValue,
}

/// Lower and upper limit of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            min: NEG_INFINITY,
            max: INFINITY,
        }
    }
}

impl Bounds {
    /// Create bounds, failing if `min > max`.
    ///
    /// ```
    /// use visfit_rs::parameters::Bounds;
    ///
    /// let bounds = Bounds::new(0.0, 10.0).unwrap();
    /// assert_eq!(bounds.max, 10.0);
    /// assert!(Bounds::new(1.0, 0.0).is_err());
    /// ```
    pub fn new(min: f64, max: f64) -> Result<Self, BoundsError> {
        if min > max {
            return Err(BoundsError::InvalidBounds { min, max });
        }
        Ok(Self { min, max })
    }

    /// (-inf, inf)
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Closed-interval membership, `min <= value <= max`.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Open-interval membership, `min < value < max`.
    ///
    /// This is the test the samplers use to reject proposals.
    pub fn contains_open(&self, value: f64) -> bool {
        value > self.min && value < self.max
    }

    /// Both limits are finite.
    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    pub fn has_lower_bound(&self) -> bool {
        self.min.is_finite()
    }

    pub fn has_upper_bound(&self) -> bool {
        self.max.is_finite()
    }

    /// Width of the interval.
    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    /// Map a unit-cube coordinate `u` in [0, 1] linearly onto the interval.
    ///
    /// Only defined for finite bounds.
    pub fn from_unit(&self, u: f64) -> Result<f64, BoundsError> {
        if !self.is_finite() {
            return Err(BoundsError::Unbounded {
                min: self.min,
                max: self.max,
            });
        }
        Ok(self.min + self.width() * u)
    }
}

/// Minuit-style mapping between an unbounded internal value and a bounded
/// external value.
///
/// The local minimizer works on internal values, so every step it proposes
/// lands inside the bounds once mapped back.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundsTransform {
    bounds: Bounds,
}

impl BoundsTransform {
    pub fn new(bounds: Bounds) -> Self {
        Self { bounds }
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Internal (unbounded) to external (bounded).
    pub fn to_external(&self, internal: f64) -> f64 {
        let b = &self.bounds;
        match (b.has_lower_bound(), b.has_upper_bound()) {
            (false, false) => internal,
            (true, false) => b.min - 1.0 + (internal * internal + 1.0).sqrt(),
            (false, true) => b.max + 1.0 - (internal * internal + 1.0).sqrt(),
            (true, true) => b.min + (internal.sin() + 1.0) * b.width() / 2.0,
        }
    }

    /// External (bounded) to internal (unbounded).
    ///
    /// Values on or outside the bounds are clamped first so that a start
    /// point sitting exactly on a limit is still usable.
    pub fn to_internal(&self, external: f64) -> Result<f64, BoundsError> {
        if !external.is_finite() {
            return Err(BoundsError::InfiniteValue);
        }
        let b = &self.bounds;
        let value = b.clamp(external);
        let internal = match (b.has_lower_bound(), b.has_upper_bound()) {
            (false, false) => value,
            (true, false) => ((value - b.min + 1.0).powi(2) - 1.0).sqrt(),
            (false, true) => ((b.max - value + 1.0).powi(2) - 1.0).sqrt(),
            (true, true) => {
                if b.width() == 0.0 {
                    0.0
                } else {
                    (2.0 * (value - b.min) / b.width() - 1.0).clamp(-1.0, 1.0).asin()
                }
            }
        };
        Ok(internal)
    }
}
