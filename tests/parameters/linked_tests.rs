//! Tests for linked and normalization parameters.

use approx::assert_relative_eq;
use visfit_rs::parameters::{
    Interp, LinkOp, LinkedParameter, ModelParam, NormalizationParameter, Parameter, SharedParameter,
};
use visfit_rs::Component;

#[test]
fn test_add_and_multiply_follow_source() {
    let source: ModelParam = Interp::wl(vec![1e-6, 3e-6], vec![2.0, 6.0])
        .build(&Parameter::new("d", 0.0))
        .unwrap()
        .into();
    let add = LinkedParameter::new(source.clone(), LinkOp::Add, 1.5);
    let mult = LinkedParameter::new(source.clone(), LinkOp::Multiply, 3.0);

    for wl in [0.5e-6, 1e-6, 1.7e-6, 2.5e-6, 4e-6] {
        let s = source.evaluate(Some(wl), None);
        assert_relative_eq!(add.evaluate(Some(wl), None), s + 1.5, epsilon = 1e-12);
        assert_relative_eq!(mult.evaluate(Some(wl), None), s * 3.0, epsilon = 1e-12);
    }
}

#[test]
fn test_link_op_parsing() {
    assert_eq!("add".parse::<LinkOp>().unwrap(), LinkOp::Add);
    assert_eq!("mult".parse::<LinkOp>().unwrap(), LinkOp::Multiply);
    assert!("divide".parse::<LinkOp>().is_err());
}

#[test]
fn test_ring_width_linked_to_disk() {
    let disk = Component::uniform_disk(&[("d", 4.0.into())]).unwrap();
    let d = disk.param("d").unwrap().clone();
    let ring = Component::ring(&[(
        "din",
        LinkedParameter::new(d.clone(), LinkOp::Add, 0.5).into(),
    )])
    .unwrap();

    d.set_value(6.0).unwrap();
    assert_relative_eq!(
        ring.param("din").unwrap().evaluate(None, None),
        6.5,
        epsilon = 1e-12
    );
}

#[test]
fn test_normalization_completes_the_flux() {
    let f1 = SharedParameter::new(Parameter::new("f", 0.3));
    let f2 = SharedParameter::new(Parameter::new("f", 0.5));
    let norm = NormalizationParameter::new(
        "f",
        vec![f1.clone().into(), f2.clone().into()],
        1.0,
    );
    assert_relative_eq!(norm.evaluate(None, None), 0.2, epsilon = 1e-12);
    f1.set_value(0.1);
    assert_relative_eq!(norm.evaluate(None, None), 0.4, epsilon = 1e-12);
}
