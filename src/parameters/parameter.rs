//! Plain parameter definition.
//!
//! A [`Parameter`] is the atomic unit of model state: a named scalar with
//! soft bounds, a unit, a free/fixed flag and an error estimate filled in by
//! the fitters.

use crate::parameters::bounds::{Bounds, BoundsTransform};
use crate::units::Unit;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A named scalar quantity of a model.
///
/// The bounds are *not* enforced here: `set_value` accepts any value, and it is
/// up to the search backends to reject or map values outside `[min, max]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    name: String,
    value: f64,
    bounds: Bounds,
    free: bool,
    unit: Unit,
    error: f64,
    description: String,
}

impl Parameter {
    /// Create a free, unbounded, dimensionless parameter.
    ///
    /// # Examples
    ///
    /// ```
    /// use visfit_rs::parameters::Parameter;
    ///
    /// let param = Parameter::new("f", 0.5);
    /// assert_eq!(param.name(), "f");
    /// assert_eq!(param.value(), 0.5);
    /// assert!(param.free());
    /// ```
    pub fn new(name: &str, value: f64) -> Self {
        Self {
            name: name.to_string(),
            value,
            bounds: Bounds::default(),
            free: true,
            unit: Unit::Dimensionless,
            error: 0.0,
            description: String::new(),
        }
    }

    /// Set both bounds. No check is made against the current value.
    pub fn with_bounds(mut self, min: f64, max: f64) -> Self {
        self.bounds = Bounds { min, max };
        self
    }

    pub fn with_free(mut self, free: bool) -> Self {
        self.free = free;
        self
    }

    pub fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = unit;
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_error(mut self, error: f64) -> Self {
        self.error = error;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// Assign a new value. Bounds are soft and not checked.
    pub fn set_value(&mut self, value: f64) {
        self.value = value;
    }

    pub fn min(&self) -> f64 {
        self.bounds.min
    }

    pub fn max(&self) -> f64 {
        self.bounds.max
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Replace the bounds, failing if `min > max`.
    pub fn set_bounds(&mut self, min: f64, max: f64) -> crate::Result<()> {
        self.bounds = Bounds::new(min, max)?;
        Ok(())
    }

    pub fn set_min(&mut self, min: f64) -> crate::Result<()> {
        self.set_bounds(min, self.bounds.max)
    }

    pub fn set_max(&mut self, max: f64) -> crate::Result<()> {
        self.set_bounds(self.bounds.min, max)
    }

    pub fn free(&self) -> bool {
        self.free
    }

    pub fn set_free(&mut self, free: bool) {
        self.free = free;
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    pub fn set_unit(&mut self, unit: Unit) {
        self.unit = unit;
    }

    /// Error estimate (zero until a fitter sets it).
    pub fn error(&self) -> f64 {
        self.error
    }

    pub fn set_error(&mut self, error: f64) {
        self.error = error;
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_description(&mut self, description: &str) {
        self.description = description.to_string();
    }

    /// Whether the current value lies inside the bounds (inclusive).
    pub fn is_within_bounds(&self) -> bool {
        self.bounds.contains(self.value)
    }

    /// Minuit transform used by the local minimizer.
    pub fn bounds_transform(&self) -> BoundsTransform {
        BoundsTransform::new(self.bounds)
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}={:.4} ± {:.4} {} range=[{},{}]{}",
            self.name,
            self.value,
            self.error,
            self.unit,
            self.bounds.min,
            self.bounds.max,
            if self.free { " free" } else { " fixed" }
        )
    }
}
