//! Momentum scan through a silicon tracker.
//!
//! Demonstrates: build stepper and registry → propagate through alternating
//! silicon layers and gaps → read extension diagnostics.

use helion_bench::{pion, solenoid_stepper, standard_registry};
use helion_core::{MaterialProperties, ParticleHypothesis, TrackState};
use helion_extensions::DenseEnvironmentExtension;

/// Layer thickness and gap in mm.
const LAYER: f64 = 0.3;
const GAP: f64 = 50.0;
const LAYERS: usize = 10;

fn main() {
    println!("=== Helion silicon tracker scan ===\n");

    let stepper = solenoid_stepper(false);
    let silicon = MaterialProperties::silicon(LAYER).unwrap();

    for p in [0.5, 1.0, 5.0] {
        for particle in [ParticleHypothesis::Pion, ParticleHypothesis::Proton] {
            let mut state = pion(false).with_particle(particle);
            state.set_momentum(p);
            let mut list = standard_registry();

            for _ in 0..LAYERS {
                state.set_material(Some(silicon));
                stepper.propagate(&mut state, &mut list, LAYER).unwrap();
                state.set_material(None);
                stepper.propagate(&mut state, &mut list, GAP).unwrap();
            }

            let dense = list.get::<DenseEnvironmentExtension>().unwrap();
            println!(
                "{particle:>6} p0 = {p:>4.1} GeV: p = {:.5} GeV, ΔE = {:.3} MeV, θ0 = {:.3} mrad, t = {:.3} ns",
                state.momentum(),
                dense.energy_lost() * 1e3,
                dense.theta_variance().sqrt() * 1e3,
                state.time(),
            );
        }
    }
}
