//! Shared handles to parameters.
//!
//! Components own their parameters, but the fitters need to write into those
//! same parameters while the model reads them. A [`SharedParameter`] is a
//! cloneable handle on one [`Parameter`]: every clone sees the same value.

use crate::parameters::bounds::Bounds;
use crate::parameters::parameter::Parameter;
use crate::units::Unit;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Cloneable handle on a single [`Parameter`].
#[derive(Clone)]
pub struct SharedParameter(Arc<RwLock<Parameter>>);

impl SharedParameter {
    pub fn new(param: Parameter) -> Self {
        Self(Arc::new(RwLock::new(param)))
    }

    fn read(&self) -> RwLockReadGuard<'_, Parameter> {
        // A panic while holding the lock cannot leave a Parameter half-written,
        // so a poisoned lock is still safe to read.
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Parameter> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the underlying parameter.
    pub fn snapshot(&self) -> Parameter {
        self.read().clone()
    }

    /// Run `f` with mutable access to the parameter.
    pub fn update<R>(&self, f: impl FnOnce(&mut Parameter) -> R) -> R {
        f(&mut self.write())
    }

    /// True when both handles point to the same parameter.
    pub fn ptr_eq(&self, other: &SharedParameter) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn name(&self) -> String {
        self.read().name().to_string()
    }

    pub fn value(&self) -> f64 {
        self.read().value()
    }

    pub fn set_value(&self, value: f64) {
        self.write().set_value(value);
    }

    pub fn min(&self) -> f64 {
        self.read().min()
    }

    pub fn max(&self) -> f64 {
        self.read().max()
    }

    pub fn bounds(&self) -> Bounds {
        self.read().bounds()
    }

    pub fn set_bounds(&self, min: f64, max: f64) -> crate::Result<()> {
        self.write().set_bounds(min, max)
    }

    pub fn free(&self) -> bool {
        self.read().free()
    }

    pub fn set_free(&self, free: bool) {
        self.write().set_free(free);
    }

    pub fn error(&self) -> f64 {
        self.read().error()
    }

    pub fn set_error(&self, error: f64) {
        self.write().set_error(error);
    }

    pub fn unit(&self) -> Unit {
        self.read().unit()
    }

    pub fn description(&self) -> String {
        self.read().description().to_string()
    }
}

impl From<Parameter> for SharedParameter {
    fn from(param: Parameter) -> Self {
        SharedParameter::new(param)
    }
}

impl fmt::Debug for SharedParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SharedParameter").field(&*self.read()).finish()
    }
}

impl fmt::Display for SharedParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", *self.read())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let a = SharedParameter::new(Parameter::new("d", 1.0));
        let b = a.clone();
        b.set_value(4.0);
        assert_eq!(a.value(), 4.0);
        assert!(a.ptr_eq(&b));

        let c = SharedParameter::new(Parameter::new("d", 4.0));
        assert!(!a.ptr_eq(&c));
    }

    #[test]
    fn test_update_and_snapshot() {
        let p = SharedParameter::new(Parameter::new("fwhm", 2.0));
        p.update(|param| {
            param.set_error(0.1);
            param.set_free(false);
        });
        let snap = p.snapshot();
        assert_eq!(snap.error(), 0.1);
        assert!(!snap.free());
        assert!(p.set_bounds(3.0, 1.0).is_err());
    }
}
