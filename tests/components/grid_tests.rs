//! Image-based, radial and convolution components.

use approx::assert_relative_eq;
use ndarray::{stack, Axis};
use visfit_rs::components::ComponentKind;
use visfit_rs::Component;

const DIM: usize = 256;
const PIX: f64 = 0.1;

fn gaussian_image(fwhm: f64) -> ndarray::Array2<f64> {
    Component::gaussian(&[("fwhm", fwhm.into())])
        .unwrap()
        .image(DIM, PIX, None, None)
        .unwrap()
}

#[test]
fn test_image_component_reproduces_analytic_visibility() {
    let analytic = Component::gaussian(&[("fwhm", 2.0.into())]).unwrap();
    let grid = Component::from_image(gaussian_image(2.0), PIX, &[]).unwrap();
    assert!(matches!(grid.kind(), ComponentKind::Grid(_)));

    let u = [0.0, 1e7, 2e7, 4e7, 0.0];
    let v = [0.0, 0.0, 1e7, 0.0, 3e7];
    let a = analytic.complex_coherent_flux(&u, &v, None, None).unwrap();
    let b = grid.complex_coherent_flux(&u, &v, None, None).unwrap();
    for i in 0..u.len() {
        assert_relative_eq!(a[i].norm(), b[i].norm(), epsilon = 5e-3);
    }
    assert_relative_eq!(b[0].re, 1.0, epsilon = 1e-12);
}

#[test]
fn test_image_component_rotation() {
    let elongated = Component::elliptic_gaussian(&[
        ("fwhm", 2.0.into()),
        ("elong", 2.0.into()),
        ("pa", 0.0.into()),
    ])
    .unwrap();
    let image = elongated.image(DIM, PIX, None, None).unwrap();
    let rotated = Component::from_image(image, PIX, &[("pa", 90.0.into())]).unwrap();
    let reference = Component::elliptic_gaussian(&[
        ("fwhm", 2.0.into()),
        ("elong", 2.0.into()),
        ("pa", 90.0.into()),
    ])
    .unwrap();

    let u = [3e7, 0.0];
    let v = [0.0, 3e7];
    let a = reference.complex_coherent_flux(&u, &v, None, None).unwrap();
    let b = rotated.complex_coherent_flux(&u, &v, None, None).unwrap();
    for i in 0..2 {
        assert_relative_eq!(a[i].norm(), b[i].norm(), epsilon = 5e-3);
    }
    assert!(a[0].norm() < a[1].norm());
}

#[test]
fn test_chromatic_cube_interpolates_between_slices() {
    let cube = stack(
        Axis(0),
        &[gaussian_image(1.0).view(), gaussian_image(3.0).view()],
    )
    .unwrap();
    let c = Component::from_cube(cube, vec![1e-6, 2e-6], PIX, &[]).unwrap();

    let narrow = Component::gaussian(&[("fwhm", 1.0.into())]).unwrap();
    let wide = Component::gaussian(&[("fwhm", 3.0.into())]).unwrap();
    let u = [2e7, 2e7, 2e7];
    let v = [0.0; 3];
    let vis = c
        .complex_coherent_flux(&u, &v, Some(&[1e-6, 2e-6, 1.5e-6][..]), None)
        .unwrap();
    let vn = narrow.complex_coherent_flux(&[2e7], &[0.0], None, None).unwrap()[0].norm();
    let vw = wide.complex_coherent_flux(&[2e7], &[0.0], None, None).unwrap()[0].norm();
    assert_relative_eq!(vis[0].norm(), vn, epsilon = 5e-3);
    assert_relative_eq!(vis[1].norm(), vw, epsilon = 5e-3);
    assert!(vis[2].norm() < vis[0].norm() && vis[2].norm() > vis[1].norm());
}

#[test]
fn test_radial_gaussian_profile() {
    let fwhm = 2.0;
    let sigma = fwhm / (8.0 * 2f64.ln()).sqrt();
    let r: Vec<f64> = (0..2001).map(|k| k as f64 * 0.004).collect();
    let intensity = r.iter().map(|ri| (-ri * ri / (2.0 * sigma * sigma)).exp()).collect();
    let radial = Component::radial_profile(r, intensity, &[]).unwrap();
    let analytic = Component::gaussian(&[("fwhm", fwhm.into())]).unwrap();

    let u = [0.0, 1e7, 3e7];
    let v = [0.0; 3];
    let a = analytic.complex_coherent_flux(&u, &v, None, None).unwrap();
    let b = radial.complex_coherent_flux(&u, &v, None, None).unwrap();
    for i in 0..3 {
        assert_relative_eq!(a[i].re, b[i].re, epsilon = 1e-3);
    }
}

#[test]
fn test_exponential_ring() {
    let c = Component::exponential_ring(&[("din", 4.0.into()), ("w", 0.5.into())]).unwrap();
    let vis = c.complex_coherent_flux(&[0.0, 2e7], &[0.0, 0.0], None, None).unwrap();
    assert_relative_eq!(vis[0].re, 1.0, epsilon = 1e-12);
    assert!(vis[1].norm() < 1.0);

    let img = c.image(64, 0.25, None, None).unwrap();
    assert_relative_eq!(img.sum(), 1.0, epsilon = 1e-9);
    // Nothing inside the inner radius.
    assert_eq!(img[[32, 32]], 0.0);
}

#[test]
fn test_convolution_multiplies_visibilities() {
    let disk = Component::uniform_disk(&[("d", 3.0.into()), ("x", 1.0.into())]).unwrap();
    let blur = Component::gaussian(&[("fwhm", 1.5.into())]).unwrap();
    let mut conv = Component::convolution(disk.clone(), blur.clone()).unwrap();
    assert!(conv.param("c1_d").is_some());
    assert!(conv.param("c2_fwhm").is_some());

    let u = [1e7, 2.5e7];
    let v = [0.5e7, -1e7];
    let base = disk.complex_coherent_flux(&u, &v, None, None).unwrap();
    let kernel = blur.shape_visibility(&u, &v, None, None).unwrap();
    let vis = conv.complex_coherent_flux(&u, &v, None, None).unwrap();
    for i in 0..2 {
        let expected = base[i] * kernel[i];
        assert_relative_eq!(vis[i].re, expected.re, epsilon = 1e-12);
        assert_relative_eq!(vis[i].im, expected.im, epsilon = 1e-12);
    }

    conv.set("c2_fwhm", 3.0).unwrap();
    let sharper = conv.complex_coherent_flux(&u, &v, None, None).unwrap();
    assert!(sharper[1].norm() < vis[1].norm());
    assert!(conv.set("fwhm", 3.0).is_err());
}
