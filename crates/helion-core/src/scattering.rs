//! Multiple-scattering service contract.

use crate::material::MaterialProperties;
use crate::particle::ParticleHypothesis;

/// Computes the variance of the projected multiple-scattering angle.
pub trait ScatteringUpdater {
    /// Variance `σ²(θ)` in rad² for a track of absolute `momentum` (GeV)
    /// crossing `material`, where the traversed length is
    /// `material.thickness() * path_correction`.
    ///
    /// `delta_e` is the energy already lost in the slab (GeV); providers
    /// may use it to evaluate at a mean momentum.
    fn sigma_squared(
        &self,
        material: &MaterialProperties,
        momentum: f64,
        path_correction: f64,
        particle: ParticleHypothesis,
        delta_e: f64,
    ) -> f64;
}

impl<T: ScatteringUpdater + ?Sized> ScatteringUpdater for Box<T> {
    fn sigma_squared(
        &self,
        material: &MaterialProperties,
        momentum: f64,
        path_correction: f64,
        particle: ParticleHypothesis,
        delta_e: f64,
    ) -> f64 {
        (**self).sigma_squared(material, momentum, path_correction, particle, delta_e)
    }
}
