//! Standard parameters shared by the built-in components.
//!
//! Every built-in shape creates its parameters from this table so that names,
//! default values, bounds and units are identical across components.

use crate::parameters::parameter::Parameter;
use crate::units::Unit;
use std::f64::INFINITY;

struct Entry {
    name: &'static str,
    value: f64,
    min: f64,
    max: f64,
    free: bool,
    unit: Unit,
    description: &'static str,
}

const STANDARD: &[Entry] = &[
    Entry { name: "x", value: 0.0, min: -INFINITY, max: INFINITY, free: false, unit: Unit::Mas, description: "x position" },
    Entry { name: "y", value: 0.0, min: -INFINITY, max: INFINITY, free: false, unit: Unit::Mas, description: "y position" },
    Entry { name: "f", value: 1.0, min: 0.0, max: 1.0, free: true, unit: Unit::Dimensionless, description: "flux" },
    Entry { name: "fwhm", value: 0.0, min: 0.0, max: INFINITY, free: true, unit: Unit::Mas, description: "FWHM" },
    Entry { name: "d", value: 0.0, min: 0.0, max: INFINITY, free: true, unit: Unit::Mas, description: "Diameter" },
    Entry { name: "din", value: 0.0, min: 0.0, max: INFINITY, free: true, unit: Unit::Mas, description: "Inner Diameter" },
    Entry { name: "dout", value: 0.0, min: 0.0, max: INFINITY, free: true, unit: Unit::Mas, description: "Outer Diameter" },
    Entry { name: "elong", value: 1.0, min: 1.0, max: INFINITY, free: true, unit: Unit::Dimensionless, description: "Elongation Ratio" },
    Entry { name: "pa", value: 0.0, min: -180.0, max: 180.0, free: true, unit: Unit::Deg, description: "Major-axis Position angle" },
    Entry { name: "skw", value: 0.0, min: 0.0, max: 1.0, free: true, unit: Unit::Dimensionless, description: "Skewedness" },
    Entry { name: "skwPa", value: 0.0, min: -180.0, max: 180.0, free: true, unit: Unit::Deg, description: "Skewedness Position angle" },
    Entry { name: "pixSize", value: 0.1, min: 0.0, max: INFINITY, free: true, unit: Unit::Mas, description: "Pixel Size" },
    Entry { name: "dim", value: 128.0, min: 1.0, max: INFINITY, free: false, unit: Unit::Dimensionless, description: "Dimension in pixel" },
    Entry { name: "a", value: 0.0, min: 0.0, max: 1.0, free: true, unit: Unit::Dimensionless, description: "Linear limb-darkening coefficient" },
    Entry { name: "a1", value: 0.0, min: 0.0, max: 1.0, free: true, unit: Unit::Dimensionless, description: "First quadratic limb-darkening coefficient" },
    Entry { name: "a2", value: 0.0, min: -1.0, max: 1.0, free: true, unit: Unit::Dimensionless, description: "Second quadratic limb-darkening coefficient" },
    Entry { name: "flor", value: 0.0, min: 0.0, max: 1.0, free: true, unit: Unit::Dimensionless, description: "Lorentzian flux fraction" },
    Entry { name: "w", value: 0.0, min: 0.0, max: INFINITY, free: true, unit: Unit::Mas, description: "Exponential scale length" },
];

/// Build a fresh parameter from the standard table, or `None` for unknown names.
///
/// ```
/// use visfit_rs::parameters::catalog::standard_parameter;
/// use visfit_rs::units::Unit;
///
/// let d = standard_parameter("d").unwrap();
/// assert_eq!(d.unit(), Unit::Mas);
/// assert_eq!(d.min(), 0.0);
/// ```
pub fn standard_parameter(name: &str) -> Option<Parameter> {
    STANDARD.iter().find(|e| e.name == name).map(|e| {
        Parameter::new(e.name, e.value)
            .with_bounds(e.min, e.max)
            .with_free(e.free)
            .with_unit(e.unit)
            .with_description(e.description)
    })
}

/// Names of all standard parameters, in table order.
pub fn standard_names() -> impl Iterator<Item = &'static str> {
    STANDARD.iter().map(|e| e.name)
}
