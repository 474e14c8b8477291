//! Units attached to parameters.
//!
//! Only the handful of units the component catalog needs are modelled: angles
//! on the sky (milliarcseconds, degrees, radians) and dimensionless ratios.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

/// Radians per milliarcsecond.
pub const MAS2RAD: f64 = PI / 180.0 / 3600.0 / 1000.0;

/// Radians per degree.
pub const DEG2RAD: f64 = PI / 180.0;

/// Unit of a parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Unit {
    /// Dimensionless quantity (fluxes, ratios, pixel counts).
    #[default]
    Dimensionless,
    /// Milliarcseconds.
    Mas,
    /// Degrees.
    Deg,
    /// Radians.
    Rad,
}

impl Unit {
    /// Conversion factor from this unit to radians, or `None` for non-angular units.
    pub fn to_rad(self) -> Option<f64> {
        match self {
            Unit::Mas => Some(MAS2RAD),
            Unit::Deg => Some(DEG2RAD),
            Unit::Rad => Some(1.0),
            Unit::Dimensionless => None,
        }
    }

    /// Short label used in printed summaries (empty for dimensionless values).
    pub fn label(self) -> &'static str {
        match self {
            Unit::Dimensionless => "",
            Unit::Mas => "mas",
            Unit::Deg => "deg",
            Unit::Rad => "rad",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
