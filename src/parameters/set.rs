//! Ordered, named view on the independent parameters of a model.

use crate::error::{Result, VisFitError};
use crate::parameters::bounds::Bounds;
use crate::parameters::parameter::Parameter;
use crate::parameters::shared::SharedParameter;
use std::fmt;

/// An ordered mapping from synthesized names to parameter handles.
///
/// Writing through a `ParameterSet` writes into the model the set was taken
/// from. The fitters use it as their free-parameter vector: the position of an
/// entry is its index in the vector.
///
/// ```
/// use visfit_rs::parameters::{Parameter, ParameterSet, SharedParameter};
///
/// let mut set = ParameterSet::new();
/// set.insert("c1_UD_d", SharedParameter::new(Parameter::new("d", 3.0))).unwrap();
/// set.set_values(&[4.0]).unwrap();
/// assert_eq!(set.get("c1_UD_d").unwrap().value(), 4.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ParameterSet {
    entries: Vec<(String, SharedParameter)>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. Names must be unique.
    pub fn insert(&mut self, name: &str, param: SharedParameter) -> Result<()> {
        if self.contains(name) {
            return Err(VisFitError::Configuration(format!(
                "duplicate parameter name '{}'",
                name
            )));
        }
        self.entries.push((name.to_string(), param));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&SharedParameter> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, p)| p)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    /// True when `param` is already in the set (by identity).
    pub fn contains_handle(&self, param: &SharedParameter) -> bool {
        self.entries.iter().any(|(_, p)| p.ptr_eq(param))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SharedParameter)> {
        self.entries.iter().map(|(n, p)| (n.as_str(), p))
    }

    pub fn handles(&self) -> impl Iterator<Item = &SharedParameter> {
        self.entries.iter().map(|(_, p)| p)
    }

    /// Entries whose parameter is free, keeping their names.
    pub fn free(&self) -> ParameterSet {
        ParameterSet {
            entries: self
                .entries
                .iter()
                .filter(|(_, p)| p.free())
                .cloned()
                .collect(),
        }
    }

    pub fn values(&self) -> Vec<f64> {
        self.handles().map(|p| p.value()).collect()
    }

    /// Assign values in entry order.
    pub fn set_values(&self, values: &[f64]) -> Result<()> {
        if values.len() != self.len() {
            return Err(VisFitError::DimensionMismatch(format!(
                "expected {} parameter values, got {}",
                self.len(),
                values.len()
            )));
        }
        for (p, &v) in self.handles().zip(values) {
            p.set_value(v);
        }
        Ok(())
    }

    pub fn set_errors(&self, errors: &[f64]) -> Result<()> {
        if errors.len() != self.len() {
            return Err(VisFitError::DimensionMismatch(format!(
                "expected {} parameter errors, got {}",
                self.len(),
                errors.len()
            )));
        }
        for (p, &e) in self.handles().zip(errors) {
            p.set_error(e);
        }
        Ok(())
    }

    pub fn bounds(&self) -> Vec<Bounds> {
        self.handles().map(|p| p.bounds()).collect()
    }

    /// Whether every value is strictly inside its bounds.
    pub fn all_within_open_bounds(&self, values: &[f64]) -> bool {
        values.len() == self.len()
            && self
                .bounds()
                .iter()
                .zip(values)
                .all(|(b, &v)| b.contains_open(v))
    }

    /// Values mapped to the unbounded space of the local minimizer.
    pub fn internal_values(&self) -> Result<Vec<f64>> {
        self.handles()
            .map(|p| Ok(p.snapshot().bounds_transform().to_internal(p.value())?))
            .collect()
    }

    /// Map internal values back through the bounds and assign them.
    pub fn update_from_internal(&self, internal: &[f64]) -> Result<()> {
        let external = self.external_values(internal)?;
        self.set_values(&external)
    }

    pub fn external_values(&self, internal: &[f64]) -> Result<Vec<f64>> {
        if internal.len() != self.len() {
            return Err(VisFitError::DimensionMismatch(format!(
                "expected {} internal values, got {}",
                self.len(),
                internal.len()
            )));
        }
        Ok(self
            .handles()
            .zip(internal)
            .map(|(p, &x)| p.snapshot().bounds_transform().to_external(x))
            .collect())
    }

    /// Copies of the current parameter states.
    pub fn snapshot(&self) -> Vec<(String, Parameter)> {
        self.iter().map(|(n, p)| (n.to_string(), p.snapshot())).collect()
    }

    /// Pretty JSON dump of the current parameter states, keyed by name.
    pub fn to_json(&self) -> Result<String> {
        let map: serde_json::Map<String, serde_json::Value> = self
            .iter()
            .map(|(n, p)| Ok((n.to_string(), serde_json::to_value(p.snapshot())?)))
            .collect::<Result<_>>()?;
        Ok(serde_json::to_string_pretty(&map)?)
    }
}

impl fmt::Display for ParameterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, p) in self.iter() {
            writeln!(f, "{:<20} {}", name, p)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ParameterSet {
        let mut set = ParameterSet::new();
        set.insert("c1_UD_d", Parameter::new("d", 3.0).with_bounds(0.0, 10.0).into())
            .unwrap();
        set.insert("c1_UD_x", Parameter::new("x", 0.0).with_free(false).into())
            .unwrap();
        set
    }

    #[test]
    fn test_insert_rejects_duplicates() {
        let mut set = sample();
        assert!(set.insert("c1_UD_d", Parameter::new("d", 1.0).into()).is_err());
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_free_filter_keeps_names() {
        let set = sample();
        let free = set.free();
        assert_eq!(free.names(), vec!["c1_UD_d".to_string()]);
        assert!(free.get("c1_UD_d").unwrap().ptr_eq(set.get("c1_UD_d").unwrap()));
    }

    #[test]
    fn test_values_round_trip_and_length_check() {
        let set = sample();
        set.set_values(&[5.0, 1.0]).unwrap();
        assert_eq!(set.values(), vec![5.0, 1.0]);
        assert!(set.set_values(&[1.0]).is_err());
    }

    #[test]
    fn test_internal_mapping_stays_in_bounds() {
        let set = sample().free();
        let internal = set.internal_values().unwrap();
        set.update_from_internal(&[internal[0] + 100.0]).unwrap();
        let v = set.values()[0];
        assert!((0.0..=10.0).contains(&v));
    }

    #[test]
    fn test_open_bounds_check() {
        let set = sample().free();
        assert!(set.all_within_open_bounds(&[5.0]));
        assert!(!set.all_within_open_bounds(&[10.0]));
        assert!(!set.all_within_open_bounds(&[5.0, 1.0]));
    }

    #[test]
    fn test_json_dump() {
        let json = sample().to_json().unwrap();
        assert!(json.contains("c1_UD_d"));
        assert!(json.contains("\"value\": 3.0"));
    }
}
