//! Fitter lifecycle across the backends.

use crate::test_helpers::{approx_eq, disk_vis2};
use visfit_rs::fitter::{
    EnsembleConfig, EnsembleRunOptions, EnsembleSampler, MinimizeConfig, Minimizer, NestedConfig,
    NestedRunOptions, NestedSampler,
};
use visfit_rs::{Component, Fitter, Model, ResultMode, VisFitError};

fn first_lobe() -> Vec<f64> {
    (1..=8).map(|k| k as f64 * 0.45e7).collect()
}

fn disk_model(start: f64) -> Model {
    let model = Model::new(vec![Component::uniform_disk(&[("d", start.into())]).unwrap()]);
    let disk = &model.components()[0];
    disk.param("d")
        .unwrap()
        .as_plain()
        .unwrap()
        .set_bounds(0.0, 10.0)
        .unwrap();
    disk.param("f").unwrap().as_plain().unwrap().set_free(false);
    model
}

#[test]
fn test_run_before_prepare_is_a_usage_error() {
    let data = disk_vis2(5.0, &first_lobe(), 0.01);
    let mut ensemble = Fitter::new(disk_model(3.0), data.clone(), EnsembleSampler::default());
    assert!(matches!(
        ensemble.run(&EnsembleRunOptions::new(10)),
        Err(VisFitError::NotInitialized(_))
    ));
    assert!(matches!(
        ensemble.get_results(ResultMode::Best),
        Err(VisFitError::NotInitialized(_))
    ));

    let mut minimizer = Fitter::new(disk_model(3.0), data, Minimizer::default());
    assert!(matches!(minimizer.run(&()), Err(VisFitError::NotInitialized(_))));
}

#[test]
fn test_unknown_result_mode() {
    let data = disk_vis2(5.0, &first_lobe(), 0.01);
    let mut fitter = Fitter::new(
        disk_model(3.0),
        data,
        EnsembleSampler::new(EnsembleConfig::default().with_seed(3)),
    );
    fitter.prepare().unwrap();
    fitter.run(&EnsembleRunOptions::new(50)).unwrap();
    assert!(matches!(
        fitter.get_results_str("mode"),
        Err(VisFitError::UnknownOption { .. })
    ));
    assert!(fitter.get_results_str("mean").is_ok());
}

#[test]
fn test_backends_agree_on_the_diameter() {
    let data = disk_vis2(5.0, &first_lobe(), 0.01);

    let mut ensemble = Fitter::new(
        disk_model(3.0),
        data.clone(),
        EnsembleSampler::new(EnsembleConfig::default().with_seed(11)),
    );
    ensemble.prepare().unwrap();
    let mcmc = ensemble.run(&EnsembleRunOptions::new(400)).unwrap();

    let mut nested = Fitter::new(
        disk_model(3.0),
        data.clone(),
        NestedSampler::new(NestedConfig::default().with_nlive(80).with_seed(5)),
    );
    nested.prepare().unwrap();
    let dynesty = nested.run(&NestedRunOptions::new(0.1)).unwrap();

    let mut local = Fitter::new(disk_model(4.0), data, Minimizer::new(MinimizeConfig::default()));
    local.prepare().unwrap();
    let lm = local.run(&()).unwrap();

    assert!(approx_eq(mcmc.values[0], 5.0, 0.05), "{:?}", mcmc.values);
    assert!(approx_eq(dynesty.values[0], 5.0, 0.1), "{:?}", dynesty.values);
    assert!(approx_eq(lm.values[0], 5.0, 1e-4), "{:?}", lm.values);

    let summary = local.summary().unwrap();
    assert!(summary.contains("c1_UD_d"));
    assert!(summary.contains("chi2r"));
}

#[test]
fn test_free_parameter_listing() {
    let data = disk_vis2(5.0, &first_lobe(), 0.01);
    let mut fitter = Fitter::new(disk_model(3.0), data, Minimizer::default());
    assert!(fitter.free_parameters().is_empty());
    fitter.prepare().unwrap();
    let limits = fitter.limits();
    assert_eq!(limits.len(), 1);
    assert_eq!(limits[0].0, "c1_UD_d");
    assert_eq!((limits[0].1.min, limits[0].1.max), (0.0, 10.0));
}
