//! Highland-formula multiple scattering.

use helion_core::{MaterialProperties, ParticleHypothesis, ScatteringUpdater};

/// Highland constant in GeV.
const HIGHLAND_SCALE: f64 = 0.0136;

/// Coefficient of the logarithmic correction.
const LOG_COEFF: f64 = 0.038;

/// Projected-angle scattering variance from the Highland formula:
///
/// ```text
/// θ₀ = 13.6 MeV / (β c p) · √t · (1 + 0.038 ln(t / β²)),   t = x / X₀
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HighlandScattering {
    log_term: bool,
}

impl HighlandScattering {
    /// Highland formula with the logarithmic correction.
    pub fn new() -> Self {
        Self { log_term: true }
    }

    /// Plain `√t` scaling without the logarithmic correction.
    pub fn without_log_term() -> Self {
        Self { log_term: false }
    }
}

impl Default for HighlandScattering {
    fn default() -> Self {
        Self::new()
    }
}

impl ScatteringUpdater for HighlandScattering {
    fn sigma_squared(
        &self,
        material: &MaterialProperties,
        momentum: f64,
        path_correction: f64,
        particle: ParticleHypothesis,
        delta_e: f64,
    ) -> f64 {
        let t = material.thickness_in_x0() * path_correction;
        if t <= 0.0 || momentum <= 0.0 {
            return 0.0;
        }
        let mass = particle.mass();
        let mut energy = (momentum * momentum + mass * mass).sqrt();
        let mut p = momentum;
        if delta_e > 0.0 {
            // Evaluate at the mean energy across the slab.
            let e_mid = energy - 0.5 * delta_e;
            if e_mid > mass {
                energy = e_mid;
                p = (e_mid * e_mid - mass * mass).sqrt();
            }
        }
        let beta = p / energy;
        let mut theta0 = HIGHLAND_SCALE / (beta * p) * t.sqrt();
        if self.log_term {
            theta0 *= (1.0 + LOG_COEFF * (t / (beta * beta)).ln()).max(0.0);
        }
        theta0 * theta0
    }
}
