//! Closed-form visibilities of the analytic components.

use approx::assert_relative_eq;
use std::f64::consts::PI;
use visfit_rs::components::{Component, OptionValue, Shape};
use visfit_rs::units::MAS2RAD;
use visfit_rs::VisFitError;

#[test]
fn test_every_shape_is_normalized_at_zero_frequency() {
    let options: [(&str, OptionValue); 9] = [
        ("d", 3.0.into()),
        ("fwhm", 2.0.into()),
        ("din", 2.0.into()),
        ("dout", 4.0.into()),
        ("a", 0.3.into()),
        ("a1", 0.2.into()),
        ("a2", 0.1.into()),
        ("flor", 0.4.into()),
        ("skw", 0.5.into()),
    ];
    for shape in Shape::ALL {
        let opts: Vec<_> = options
            .iter()
            .filter(|(n, _)| shape.param_names().contains(n))
            .cloned()
            .collect();
        let c = Component::analytic(shape, &opts).unwrap();
        let vis = c.shape_visibility(&[0.0], &[0.0], Some(&[2e-6][..]), None).unwrap();
        assert_relative_eq!(vis[0].re, 1.0, epsilon = 1e-12);
        assert_relative_eq!(vis[0].im, 0.0, epsilon = 1e-12);
    }
}

#[test]
fn test_uniform_disk_at_origin_and_first_null() {
    let d = 5.0;
    let c = Component::uniform_disk(&[("d", d.into()), ("f", 1.0.into())]).unwrap();
    let zero = c.complex_coherent_flux(&[0.0], &[0.0], None, None).unwrap();
    assert_eq!(zero[0].re, 1.0);
    assert_eq!(zero[0].im, 0.0);

    // First zero of J1.
    let rho = 3.831_705_970_207_512 / (PI * d * MAS2RAD);
    let null = c.complex_coherent_flux(&[rho], &[0.0], None, None).unwrap();
    assert!(null[0].norm() < 1e-10, "{}", null[0].norm());
}

#[test]
fn test_flux_scales_visibility() {
    let c = Component::gaussian(&[("fwhm", 3.0.into()), ("f", 0.25.into())]).unwrap();
    let vis = c.complex_coherent_flux(&[0.0, 2e7], &[0.0, 1e7], None, None).unwrap();
    assert_relative_eq!(vis[0].re, 0.25, epsilon = 1e-14);
    assert!(vis[1].re < 0.25 && vis[1].re > 0.0);
}

#[test]
fn test_translation_is_a_pure_phase() {
    let centered = Component::uniform_disk(&[("d", 2.0.into())]).unwrap();
    let shifted =
        Component::uniform_disk(&[("d", 2.0.into()), ("x", 5.0.into()), ("y", (-3.0).into())])
            .unwrap();
    let u = [1e7, -2e7, 3.5e7];
    let v = [0.5e7, 1e7, -2e7];
    let a = centered.complex_coherent_flux(&u, &v, None, None).unwrap();
    let b = shifted.complex_coherent_flux(&u, &v, None, None).unwrap();
    for i in 0..u.len() {
        assert_relative_eq!(a[i].norm(), b[i].norm(), epsilon = 1e-12);
    }
    assert!(b[0].im.abs() > 1e-3);
}

#[test]
fn test_ring_limit_is_infinitesimal_ring() {
    let ring = Component::ring(&[("din", 4.0.into()), ("dout", 4.0.into())]).unwrap();
    let iring = Component::iring(&[("d", 4.0.into())]).unwrap();
    let u = [0.0, 1e7, 4e7];
    let v = [0.0; 3];
    let a = ring.complex_coherent_flux(&u, &v, None, None).unwrap();
    let b = iring.complex_coherent_flux(&u, &v, None, None).unwrap();
    for i in 0..3 {
        assert_relative_eq!(a[i].re, b[i].re, epsilon = 1e-12);
    }
}

#[test]
fn test_skewed_ring_is_complex() {
    let c = Component::analytic(
        Shape::SkewedRing,
        &[("d", 3.0.into()), ("skw", 1.0.into()), ("skwPa", 90.0.into())],
    )
    .unwrap();
    let vis = c.complex_coherent_flux(&[2e7], &[0.0], None, None).unwrap();
    assert!(vis[0].im.abs() > 1e-3);
}

#[test]
fn test_unknown_option_and_bad_coordinates() {
    assert!(matches!(
        Component::uniform_disk(&[("radius", 1.0.into())]),
        Err(VisFitError::Configuration(_))
    ));
    let c = Component::point(&[]).unwrap();
    assert!(matches!(
        c.complex_coherent_flux(&[0.0, 1.0], &[0.0], None, None),
        Err(VisFitError::DimensionMismatch(_))
    ));
    assert!(matches!(
        c.complex_coherent_flux(&[0.0, 1.0, 2.0], &[0.0; 3], Some(&[1e-6, 2e-6][..]), None),
        Err(VisFitError::DimensionMismatch(_))
    ));
}

#[test]
fn test_chromatic_diameter() {
    use visfit_rs::parameters::Interp;
    let c = Component::uniform_disk(&[(
        "d",
        Interp::wl(vec![2e-6, 3e-6], vec![2.0, 4.0]).into(),
    )])
    .unwrap();
    let u = [1e7, 1e7];
    let v = [0.0, 0.0];
    let vis = c.complex_coherent_flux(&u, &v, Some(&[2e-6, 3e-6][..]), None).unwrap();
    let small = Component::uniform_disk(&[("d", 2.0.into())]).unwrap();
    let large = Component::uniform_disk(&[("d", 4.0.into())]).unwrap();
    assert_relative_eq!(
        vis[0].re,
        small.complex_coherent_flux(&[1e7], &[0.0], None, None).unwrap()[0].re,
        epsilon = 1e-12
    );
    assert_relative_eq!(
        vis[1].re,
        large.complex_coherent_flux(&[1e7], &[0.0], None, None).unwrap()[0].re,
        epsilon = 1e-12
    );
}
