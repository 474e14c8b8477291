//! Tests for wavelength- and time-interpolated parameters.

use approx::assert_relative_eq;
use visfit_rs::parameters::{Interp, InterpAxis, ModelParam, Parameter};
use visfit_rs::{Component, VisFitError};

fn template() -> Parameter {
    Parameter::new("d", 1.0).with_bounds(0.0, 100.0)
}

#[test]
fn test_three_keys_four_values_is_rejected() {
    let err = Interp::wl(vec![2.0e-6, 2.2e-6, 2.4e-6], vec![1.0, 2.0, 3.0, 4.0])
        .build(&template())
        .unwrap_err();
    assert!(matches!(err, VisFitError::Configuration(_)));
}

#[test]
fn test_component_rejects_bad_interpolation() {
    let result = Component::uniform_disk(&[(
        "d",
        Interp::wl(vec![2.0e-6, 2.2e-6, 2.4e-6], vec![1.0, 2.0, 3.0, 4.0]).into(),
    )]);
    assert!(matches!(result, Err(VisFitError::Configuration(_))));
}

#[test]
fn test_exact_at_keys_and_flat_outside() {
    let keys = vec![2.0e-6, 2.2e-6, 2.4e-6];
    let values = vec![3.0, 3.5, 4.25];
    let param = Interp::wl(keys.clone(), values.clone()).build(&template()).unwrap();

    for (k, v) in keys.iter().zip(&values) {
        assert_eq!(param.evaluate(Some(*k), None), *v);
    }
    assert_eq!(param.evaluate(Some(1.0e-6), None), 3.0);
    assert_eq!(param.evaluate(Some(3.0e-6), None), 4.25);
    assert_relative_eq!(param.evaluate(Some(2.1e-6), None), 3.25, epsilon = 1e-12);
}

#[test]
fn test_time_axis_ignores_wavelength() {
    let param = Interp::time(vec![0.0, 10.0], vec![1.0, 2.0])
        .build(&template())
        .unwrap();
    assert_eq!(param.axis(), InterpAxis::Time);
    assert_relative_eq!(param.evaluate(Some(2e-6), Some(5.0)), 1.5, epsilon = 1e-12);
}

#[test]
fn test_key_count_is_fixed() {
    let mut param = Interp::wl(vec![1.0, 2.0], vec![1.0, 2.0])
        .build(&template())
        .unwrap();
    assert!(param.set_keys(vec![1.5, 2.5]).is_ok());
    assert!(matches!(
        param.set_keys(vec![1.0, 2.0, 3.0]),
        Err(VisFitError::Configuration(_))
    ));
}

#[test]
fn test_per_key_parameters_are_shared() {
    let param = Interp::wl(vec![1.0, 2.0], 5.0).build(&template()).unwrap();
    let handle = param.params()[1].clone();
    let wrapped = ModelParam::from(param);
    handle.set_value(7.0);
    assert_eq!(wrapped.evaluate(Some(2.0), None), 7.0);
    assert_eq!(wrapped.evaluate(Some(1.0), None), 5.0);
}
