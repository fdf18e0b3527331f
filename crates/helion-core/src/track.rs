//! Read/write access to the stepper's track state.

use crate::material::MaterialProperties;
use crate::math::Vector3;
use crate::particle::ParticleHypothesis;

/// Speed of light in mm/ns.
pub const SPEED_OF_LIGHT: f64 = 299.792_458;

/// Inverse velocity `dt/ds = E / (p·c)` in ns/mm, `None` for zero momentum.
pub fn inverse_velocity(momentum: f64, mass: f64) -> Option<f64> {
    if momentum <= 0.0 || !momentum.is_finite() {
        return None;
    }
    Some((momentum * momentum + mass * mass).sqrt() / (momentum * SPEED_OF_LIGHT))
}

/// The part of a stepper state that physics extensions may inspect.
///
/// The extension registry itself is generic over the state type and never
/// calls these methods; reference extensions bound on this trait.
/// Units: mm, GeV, ns, e.
pub trait TrackState {
    /// Global position.
    fn position(&self) -> Vector3;

    /// Unit direction of flight.
    fn direction(&self) -> Vector3;

    /// Absolute momentum.
    fn momentum(&self) -> f64;

    /// Charge in units of e.
    fn charge(&self) -> f64;

    /// Lab-frame time.
    fn time(&self) -> f64;

    /// Path length accumulated since the start of propagation.
    fn path_length(&self) -> f64;

    /// Particle species hypothesis.
    fn particle(&self) -> ParticleHypothesis;

    /// Material at the current position, if any.
    fn material(&self) -> Option<&MaterialProperties>;

    /// Overwrite the absolute momentum.
    fn set_momentum(&mut self, momentum: f64);

    /// Overwrite the lab-frame time.
    fn set_time(&mut self, time: f64);

    /// Rest mass of the particle hypothesis in GeV.
    fn mass(&self) -> f64 {
        self.particle().mass()
    }

    /// Signed inverse momentum `q/p`; zero for neutral tracks.
    fn q_over_p(&self) -> f64 {
        let p = self.momentum();
        if p == 0.0 {
            0.0
        } else {
            self.charge() / p
        }
    }

    /// Whether the track currently sits in non-vacuum material.
    fn in_dense_material(&self) -> bool {
        self.material().is_some_and(|m| !m.is_vacuum())
    }
}
