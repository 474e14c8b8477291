//! Model aggregation, parameter keys and images.

use approx::assert_relative_eq;
use visfit_rs::model::ImageOptions;
use visfit_rs::parameters::{Interp, LinkOp, LinkedParameter};
use visfit_rs::{Component, Model};

#[test]
fn test_point_and_disk_sum_to_unity() {
    let model = Model::new(vec![
        Component::point(&[("f", 0.5.into())]).unwrap(),
        Component::uniform_disk(&[("d", 2.0.into()), ("f", 0.5.into())]).unwrap(),
    ]);
    let vis = model.complex_coherent_flux(&[0.0], &[0.0], None, None).unwrap();
    assert_relative_eq!(vis[0].norm(), 1.0, epsilon = 1e-14);
}

#[test]
fn test_free_parameters_are_a_subset() {
    let disk = Component::uniform_disk(&[
        ("d", Interp::wl(vec![2e-6, 2.5e-6, 3e-6], vec![1.0, 1.5, 2.0]).into()),
        ("x", 1.0.into()),
    ])
    .unwrap();
    let d = disk.param("d").unwrap().clone();
    let ring = Component::iring(&[("d", LinkedParameter::new(d, LinkOp::Multiply, 2.0).into())])
        .unwrap();
    let model = Model::new(vec![disk, ring, Component::point(&[]).unwrap()]);

    let all = model.parameters(false).unwrap();
    let free = model.free_parameters().unwrap();
    assert!(free.len() < all.len());
    for (name, p) in free.iter() {
        assert!(p.free());
        let same = all.get(name).unwrap();
        assert!(same.ptr_eq(p));
    }
    for (name, p) in all.iter() {
        assert_eq!(p.free(), free.contains(name));
    }
    assert!(all.contains("c1_UD_d_interp1"));
    assert!(all.contains("c1_UD_d_interp3"));
    assert!(all.contains("c1_UD_x"));
    assert!(!free.contains("c1_UD_x"));
    // The linked diameter is derived, not fitted.
    assert!(!all.names().iter().any(|n| n.starts_with("c2_") && n.ends_with("_d")));
}

#[test]
fn test_setting_a_free_parameter_moves_the_model() {
    let model = Model::new(vec![Component::gaussian(&[("fwhm", 1.0.into())]).unwrap()]);
    let before = model.complex_coherent_flux(&[3e7], &[0.0], None, None).unwrap()[0].re;
    let free = model.free_parameters().unwrap();
    free.get("c1_GD_fwhm").unwrap().set_value(3.0);
    let after = model.complex_coherent_flux(&[3e7], &[0.0], None, None).unwrap()[0].re;
    assert!(after < before);
}

#[test]
fn test_image_cube_dimensions() {
    let model = Model::new(vec![
        Component::uniform_disk(&[("d", Interp::wl(vec![1e-6, 2e-6], vec![2.0, 4.0]).into())])
            .unwrap(),
    ]);
    let options = ImageOptions::new(32, 0.25).with_wl(vec![1e-6, 1.5e-6, 2e-6]);
    let cube = model.image(&options).unwrap();
    assert_eq!(cube.shape(), &[3, 32, 32]);

    let full = model
        .image(&options.clone().with_time(vec![0.0, 1.0]).with_squeeze(false))
        .unwrap();
    assert_eq!(full.shape(), &[2, 3, 32, 32]);

    // Larger disk at longer wavelength: fewer lit pixels, same flux.
    let lit = |k: usize| {
        cube.index_axis(ndarray::Axis(0), k)
            .iter()
            .filter(|v| **v > 0.0)
            .count()
    };
    assert!(lit(0) < lit(2));
    for k in 0..3 {
        assert_relative_eq!(cube.index_axis(ndarray::Axis(0), k).sum(), 1.0, epsilon = 1e-9);
    }
}

#[test]
fn test_image_from_ft_round_trip() {
    let model = Model::new(vec![Component::gaussian(&[("fwhm", 3.0.into())]).unwrap()]);
    let options = ImageOptions::new(64, 0.4);
    let direct = model.image(&options).unwrap();
    let from_ft = model.image(&options.clone().with_from_ft(true)).unwrap();
    assert_eq!(direct.shape(), from_ft.shape());

    let peak = direct.iter().cloned().fold(0.0, f64::max);
    let scale = from_ft.iter().cloned().fold(0.0, f64::max) / peak;
    for (a, b) in direct.iter().zip(from_ft.iter()) {
        assert!((a - b / scale).abs() < 1e-3 * peak);
    }
}
