//! # Parameter System
//!
//! Model state lives in parameters. A plain [`Parameter`] is a named scalar
//! with soft bounds, a unit, a free/fixed flag and an error estimate. Components
//! hold them through [`ModelParam`], a closed set of parameter kinds that all
//! evaluate to a value at a given wavelength and time:
//!
//! - **Plain**: the stored value, whatever the condition.
//! - **Interpolated**: piecewise-linear in wavelength or time over a fixed key
//!   grid, flat outside it.
//! - **Linked**: `source + factor` or `source * factor`, never free.
//! - **Normalized**: `target - sum(params)`, never free.
//!
//! Parameters are shared through [`SharedParameter`] handles, so a
//! [`ParameterSet`] taken from a model writes straight into it.
//!
//! ## Example Usage
//!
//! ```rust
//! use visfit_rs::parameters::{Interp, LinkOp, LinkedParameter, ModelParam, Parameter};
//!
//! let d = Interp::wl(vec![2.0e-6, 2.5e-6], vec![3.0, 4.0])
//!     .build(&Parameter::new("d", 0.0))
//!     .unwrap();
//! let d = ModelParam::from(d);
//! assert_eq!(d.evaluate(Some(2.25e-6), None), 3.5);
//!
//! let dout = ModelParam::from(LinkedParameter::new(d.clone(), LinkOp::Multiply, 2.0));
//! assert_eq!(dout.evaluate(Some(2.5e-6), None), 8.0);
//! assert!(!dout.is_free());
//! ```

pub mod bounds;
pub mod catalog;
pub mod interpolated;
pub mod linked;
pub mod parameter;
pub mod set;
pub mod shared;
pub mod value;

pub use bounds::{Bounds, BoundsError, BoundsTransform};
pub use catalog::standard_parameter;
pub use interpolated::{Interp, InterpAxis, InterpValues, InterpolatedParameter};
pub use linked::{LinkOp, LinkedParameter, NormalizationParameter};
pub use parameter::Parameter;
pub use set::ParameterSet;
pub use shared::SharedParameter;
pub use value::ModelParam;
