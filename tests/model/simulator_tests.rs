//! Observables and chi-square of the simulator.

use approx::assert_relative_eq;
use visfit_rs::data::{DataSet, DataType, T3Table, VisTable};
use visfit_rs::simulator::{ComputeOptions, Simulator};
use visfit_rs::{Component, Model};

fn binary(separation: f64) -> Model {
    Model::new(vec![
        Component::point(&[("f", 0.6.into())]).unwrap(),
        Component::point(&[("f", 0.4.into()), ("x", separation.into())]).unwrap(),
    ])
}

#[test]
fn test_perfect_model_has_zero_chi2() {
    let u = vec![1e7, 2e7, 3e7];
    let v = vec![0.0, 1e7, -1e7];
    let wl = vec![2e-6; 3];
    let cf = binary(5.0)
        .complex_coherent_flux(&u, &v, Some(wl.as_slice()), None)
        .unwrap();
    let vis2: Vec<f64> = cf.iter().map(|z| z.norm_sqr()).collect();
    let phi: Vec<f64> = cf.iter().map(|z| z.arg().to_degrees()).collect();
    let data = DataSet::new().with_vis(
        VisTable::new(u, v, wl)
            .unwrap()
            .with_vis2(vis2, vec![0.01; 3])
            .unwrap()
            .with_visphi(phi, vec![1.0; 3])
            .unwrap(),
    );

    let mut sim = Simulator::new(binary(5.0), data.clone());
    sim.compute(&ComputeOptions::default()).unwrap();
    assert!(sim.chi2() < 1e-18);
    assert!(sim.simulated().get(DataType::Vis2).is_some());
    assert!(sim.simulated().get(DataType::T3Phi).is_none());

    let mut off = Simulator::new(binary(6.0), data);
    off.compute(&ComputeOptions::default()).unwrap();
    assert!(off.chi2() > 1.0);
    let vis2_only = ComputeOptions::default().with_data_types(vec![DataType::Vis2]);
    let full_chi2 = off.chi2();
    off.compute(&vis2_only).unwrap();
    assert!(off.chi2() < full_chi2);
}

#[test]
fn test_closure_phase_of_symmetric_source_is_zero() {
    let model = Model::new(vec![Component::uniform_disk(&[("d", 4.0.into())]).unwrap()]);
    let t3 = T3Table::new(
        vec![1e7, 4e7],
        vec![0.0, 1e7],
        vec![0.5e7, 2e7],
        vec![1e7, -3e7],
        vec![2e-6, 2e-6],
    )
    .unwrap()
    .with_t3phi(vec![0.0, 0.0], vec![1.0, 1.0])
    .unwrap();
    let mut sim = Simulator::new(model, DataSet::new().with_t3(t3));
    sim.compute(&ComputeOptions::default()).unwrap();
    let t3phi = sim.simulated().get(DataType::T3Phi).unwrap();
    for phi in t3phi {
        // 0 or 180 degrees for a real visibility.
        let folded = phi.abs() % 180.0;
        assert!(folded < 1e-9 || (180.0 - folded) < 1e-9, "{}", phi);
    }
}

#[test]
fn test_data_round_trips_through_json() {
    let data = DataSet::new().with_vis(
        VisTable::new(vec![1e7], vec![2e7], vec![2.2e-6])
            .unwrap()
            .with_visamp(vec![0.8], vec![0.05])
            .unwrap(),
    );
    let json = data.to_json().unwrap();
    let back = DataSet::from_json(&json).unwrap();
    assert_eq!(back.data_types(), vec![DataType::VisAmp]);
    assert_relative_eq!(back.observable(DataType::VisAmp).unwrap().value[0], 0.8);
}

#[test]
fn test_data_type_names() {
    assert_eq!("vis2data".parse::<DataType>().unwrap(), DataType::Vis2);
    assert_eq!("T3PHI".parse::<DataType>().unwrap(), DataType::T3Phi);
    assert!("FLUXDATA".parse::<DataType>().is_err());
}
