//! Propagation through a silicon slab and back out into vacuum.

use helion_core::{MaterialProperties, ParticleHypothesis, TrackState, Vector3};
use helion_extensions::{
    standard_extensions, ConstantField, DefaultExtension, DenseEnvironmentConfig,
    DenseEnvironmentExtension, NullField,
};
use helion_stepper::{RkStepper, StepperConfig, StepperState};

fn pion_in_silicon(momentum: f64) -> StepperState {
    StepperState::new(Vector3::ZERO, Vector3::new(0.0, 0.0, 1.0), momentum, 1.0)
        .unwrap()
        .with_material(MaterialProperties::silicon(1.0).unwrap())
}

#[test]
fn silicon_slab_loses_energy() {
    let stepper = RkStepper::new(NullField, StepperConfig::default()).unwrap();
    let mut state = pion_in_silicon(1.0);
    let mut list = standard_extensions(DenseEnvironmentConfig::default()).unwrap();

    let metrics = stepper.propagate(&mut state, &mut list, 100.0).unwrap();

    let lost = 1.0 - state.momentum();
    assert!(lost > 0.03 && lost < 0.06, "lost = {lost}");
    assert_eq!(
        metrics.extension_steps.get("dense-environment"),
        Some(&metrics.steps)
    );
    // Straight line: no field, energy loss does not bend.
    assert!((state.position() - Vector3::new(0.0, 0.0, 100.0)).norm() < 1e-9);

    let dense = list.get::<DenseEnvironmentExtension>().unwrap();
    let mass = ParticleHypothesis::Pion.mass();
    let e0 = (1.0 + mass * mass).sqrt();
    let e1 = (state.momentum().powi(2) + mass * mass).sqrt();
    assert!((dense.energy_lost() - (e0 - e1)).abs() < 1e-12);
    assert!(dense.theta_variance() > 0.0);
    assert_eq!(dense.steps_in_material(), metrics.steps);
}

#[test]
fn leaving_material_switches_to_default_extension() {
    let stepper = RkStepper::new(ConstantField::along_z(1.0), StepperConfig::default()).unwrap();
    let mut state = pion_in_silicon(2.0);
    let mut list = standard_extensions(DenseEnvironmentConfig::default()).unwrap();

    let inside = stepper.propagate(&mut state, &mut list, 50.0).unwrap();
    let p_exit = state.momentum();
    assert!(p_exit < 2.0);

    state.set_material(None);
    let outside = stepper.propagate(&mut state, &mut list, 50.0).unwrap();
    assert_eq!(state.momentum(), p_exit);
    assert_eq!(outside.extension_steps.get("default"), Some(&outside.steps));
    assert!(outside.extension_steps.get("dense-environment").is_none());

    let default = list.get::<DefaultExtension>().unwrap();
    assert_eq!(default.steps_finalized(), outside.steps);
    let dense = list.get::<DenseEnvironmentExtension>().unwrap();
    assert_eq!(dense.steps_in_material(), inside.steps);
}

#[test]
fn heavier_particles_lose_more_at_equal_momentum() {
    let stepper = RkStepper::new(NullField, StepperConfig::default()).unwrap();
    let run = |particle| {
        let mut state = pion_in_silicon(0.5).with_particle(particle);
        let mut list = standard_extensions(DenseEnvironmentConfig::default()).unwrap();
        stepper.propagate(&mut state, &mut list, 20.0).unwrap();
        0.5 - state.momentum()
    };
    assert!(run(ParticleHypothesis::Proton) > run(ParticleHypothesis::Pion));
}

#[test]
fn momentum_cutoff_stops_propagation() {
    let stepper = RkStepper::new(NullField, StepperConfig::default()).unwrap();
    let mut state = pion_in_silicon(0.3);
    let config = DenseEnvironmentConfig {
        momentum_cutoff: 0.29,
        include_scattering: false,
    };
    let mut list = standard_extensions(config).unwrap();

    let err = stepper.propagate(&mut state, &mut list, 1000.0).unwrap_err();
    assert!(err.to_string().contains("dense-environment"), "{err}");
    assert!(state.momentum() > 0.29);
    assert!(state.path_length() < 1000.0);
    assert!(list.mask().is_none());
}

#[test]
fn covariance_grows_along_the_slab() {
    let cfg = StepperConfig {
        transport_covariance: true,
        ..Default::default()
    };
    let stepper = RkStepper::new(ConstantField::along_z(2.0), cfg).unwrap();
    let cov0 = helion_core::Jacobian::diagonal([0.01, 0.01, 0.01, 1e-6, 1e-6, 1e-6, 1e-4]);
    let mut state = pion_in_silicon(1.0).with_covariance(cov0);
    let mut list = standard_extensions(DenseEnvironmentConfig::default()).unwrap();

    stepper.propagate(&mut state, &mut list, 30.0).unwrap();

    let cov = state.covariance().unwrap();
    assert!(cov.is_finite());
    assert!(cov[(0, 0)] > 0.01);
    // Energy loss stretches the q/p variance.
    assert!(cov[(6, 6)] > 1e-4);
    assert!(!state.jacobian().is_identity());
}
