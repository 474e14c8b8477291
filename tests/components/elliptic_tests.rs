//! Rotation and elongation of the analytic components.

use approx::assert_relative_eq;
use visfit_rs::Component;

const U: [f64; 6] = [0.0, 1.3e7, -2.1e7, 3.7e7, 0.4e7, -4.4e7];
const V: [f64; 6] = [0.0, 0.8e7, 2.9e7, -1.1e7, -3.6e7, -0.2e7];

#[test]
fn test_unit_elongation_matches_circular_shape() {
    let ellipse = Component::ellipse(&[
        ("d", 3.0.into()),
        ("elong", 1.0.into()),
        ("pa", 37.0.into()),
    ])
    .unwrap();
    let disk = Component::uniform_disk(&[("d", 3.0.into())]).unwrap();
    let a = ellipse.complex_coherent_flux(&U, &V, None, None).unwrap();
    let b = disk.complex_coherent_flux(&U, &V, None, None).unwrap();
    for i in 0..U.len() {
        assert_relative_eq!(a[i].re, b[i].re, epsilon = 1e-12);
        assert_relative_eq!(a[i].im, b[i].im, epsilon = 1e-12);
    }

    let eg = Component::elliptic_gaussian(&[
        ("fwhm", 2.0.into()),
        ("elong", 1.0.into()),
        ("pa", (-64.0).into()),
    ])
    .unwrap();
    let g = Component::gaussian(&[("fwhm", 2.0.into())]).unwrap();
    let ia = eg.image(32, 0.25, None, None).unwrap();
    let ib = g.image(32, 0.25, None, None).unwrap();
    for (x, y) in ia.iter().zip(ib.iter()) {
        assert_relative_eq!(*x, *y, epsilon = 1e-12);
    }
}

#[test]
fn test_major_axis_points_north_at_zero_pa() {
    let ellipse = Component::ellipse(&[
        ("d", 4.0.into()),
        ("elong", 2.0.into()),
        ("pa", 0.0.into()),
    ])
    .unwrap();
    let major = Component::uniform_disk(&[("d", 4.0.into())]).unwrap();
    let minor = Component::uniform_disk(&[("d", 2.0.into())]).unwrap();

    let along_u = ellipse.complex_coherent_flux(&[2e7], &[0.0], None, None).unwrap();
    let along_v = ellipse.complex_coherent_flux(&[0.0], &[2e7], None, None).unwrap();
    let small = minor.complex_coherent_flux(&[2e7], &[0.0], None, None).unwrap();
    let large = major.complex_coherent_flux(&[2e7], &[0.0], None, None).unwrap();
    assert_relative_eq!(along_u[0].re, small[0].re, epsilon = 1e-12);
    assert_relative_eq!(along_v[0].re, large[0].re, epsilon = 1e-12);
}

#[test]
fn test_quarter_turn_swaps_axes() {
    let north = Component::elliptic_gaussian(&[
        ("fwhm", 3.0.into()),
        ("elong", 1.5.into()),
        ("pa", 0.0.into()),
    ])
    .unwrap();
    let east = Component::elliptic_gaussian(&[
        ("fwhm", 3.0.into()),
        ("elong", 1.5.into()),
        ("pa", 90.0.into()),
    ])
    .unwrap();
    let a = north.complex_coherent_flux(&[2e7], &[0.0], None, None).unwrap();
    let b = east.complex_coherent_flux(&[0.0], &[2e7], None, None).unwrap();
    assert_relative_eq!(a[0].re, b[0].re, epsilon = 1e-12);
}

#[test]
fn test_elongated_image_is_taller_than_wide() {
    let c = Component::elliptic_gaussian(&[
        ("fwhm", 4.0.into()),
        ("elong", 2.0.into()),
        ("pa", 0.0.into()),
    ])
    .unwrap();
    let dim = 64;
    let pix = 0.25;
    let img = c.image(dim, pix, None, None).unwrap();
    assert_relative_eq!(img.sum(), 1.0, epsilon = 1e-12);

    let half = dim as f64 / 2.0;
    let (mut sx, mut sy) = (0.0, 0.0);
    for ((i, j), v) in img.indexed_iter() {
        let x = (j as f64 - half) * pix;
        let y = (i as f64 - half) * pix;
        sx += v * x * x;
        sy += v * y * y;
    }
    let ratio = sy / sx;
    assert!((ratio - 4.0).abs() < 0.4, "variance ratio {}", ratio);
}
