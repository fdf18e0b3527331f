//! Mean ionisation energy loss.

use helion_core::MaterialProperties;

/// Electron mass in GeV.
const ELECTRON_MASS: f64 = 0.000_510_998_950;

/// `K = 4π N_A r_e² m_e c²` in MeV·cm²/mol.
const BETHE_K: f64 = 0.307_075;

/// MeV/cm to GeV/mm.
const MEV_PER_CM_TO_GEV_PER_MM: f64 = 1.0e-4;

/// Mean ionisation loss `-dE/ds` in GeV/mm for a unit-charge particle.
///
/// Bethe formula without density-effect or shell corrections. Returns zero
/// for vacuum, non-positive momentum, or massless particles, and never a
/// negative value.
pub fn bethe_mean_loss(material: &MaterialProperties, momentum: f64, mass: f64) -> f64 {
    if material.is_vacuum() || momentum <= 0.0 || mass <= 0.0 {
        return 0.0;
    }
    let beta_gamma = momentum / mass;
    let bg2 = beta_gamma * beta_gamma;
    let gamma = (1.0 + bg2).sqrt();
    let beta2 = bg2 / (1.0 + bg2);

    let ratio = ELECTRON_MASS / mass;
    let t_max = 2.0 * ELECTRON_MASS * bg2 / (1.0 + 2.0 * gamma * ratio + ratio * ratio);
    let i = material.mean_excitation_energy();
    let log_arg = 2.0 * ELECTRON_MASS * bg2 * t_max / (i * i);
    if log_arg <= 0.0 {
        return 0.0;
    }
    let bracket = 0.5 * log_arg.ln() - beta2;
    let prefactor = BETHE_K * material.z_over_a() * material.density() / beta2;
    (prefactor * bracket * MEV_PER_CM_TO_GEV_PER_MM).max(0.0)
}
