//! Charged-particle stepping through dense material.
//!
//! Alongside the Lorentz force, the extension integrates the mean
//! ionisation loss over the four stages of a step. The stage momenta follow
//! the same Runge–Kutta scheme as the direction:
//!
//! ```text
//! p_1 = p_0
//! p_i = p_0 + f_i·h·(dp/ds)_{i-1}        f = (0, ½, ½, 1)
//! (dp/ds)_i = (dE/ds)(p_i) · E_i / p_i
//! p_new = p_0 + h/6 · (dp_1 + 2 dp_2 + 2 dp_3 + dp_4)
//! ```
//!
//! The Bethe loss `dE/ds` is re-evaluated at every stage momentum, and each
//! stage's k-term uses its own `q/p_i`. Finalize writes `p_new`, the
//! time advanced with the weighted inverse velocities, and accumulates the
//! multiple-scattering variance of the traversed slab.

use helion_core::{
    inverse_velocity, lorentz_k, vacuum_transport, ConfigError, Jacobian, MaterialProperties,
    ScatteringUpdater, Stage, StepData, TrackState, Vector3, QOP_INDEX,
};
use helion_extension::Extension;

use crate::energy_loss::bethe_mean_loss;
use crate::scattering::HighlandScattering;

// ── Configuration ──────────────────────────────────────────────

/// Tunables of [`DenseEnvironmentExtension`].
#[derive(Clone, Debug, PartialEq)]
pub struct DenseEnvironmentConfig {
    /// Finalize declines when the momentum after the step would not exceed
    /// this value (GeV).
    pub momentum_cutoff: f64,
    /// Accumulate multiple-scattering variance in finalize.
    pub include_scattering: bool,
}

impl DenseEnvironmentConfig {
    /// Check that the cut-off is finite and non-negative.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.momentum_cutoff.is_finite() || self.momentum_cutoff < 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "momentum_cutoff",
                value: self.momentum_cutoff,
            });
        }
        Ok(())
    }
}

impl Default for DenseEnvironmentConfig {
    fn default() -> Self {
        Self {
            momentum_cutoff: 0.0,
            include_scattering: true,
        }
    }
}

// ── Per-step integration state ─────────────────────────────────

/// Quantities recorded across the stages of the current step.
#[derive(Clone, Copy, Debug, Default)]
struct StepIntegration {
    /// Set at `K1`, cleared by finalize.
    prepared: bool,
    initial_momentum: f64,
    mass: f64,
    charge: f64,
    /// Material at the start of the step.
    material: Option<MaterialProperties>,
    /// Mean loss `-dE/ds` per stage, including the charge factor.
    dedx: [f64; 4],
    dpds: [f64; 4],
    qop: [f64; 4],
    /// Inverse velocity `dt/ds` per stage.
    tki: [f64; 4],
}

impl StepIntegration {
    fn weighted(values: &[f64; 4], h: f64) -> f64 {
        h / 6.0 * (values[0] + 2.0 * values[1] + 2.0 * values[2] + values[3])
    }

    fn final_momentum(&self, h: f64) -> f64 {
        self.initial_momentum + Self::weighted(&self.dpds, h)
    }

    fn energy(&self, momentum: f64) -> f64 {
        (momentum * momentum + self.mass * self.mass).sqrt()
    }
}

// ── Extension ──────────────────────────────────────────────────

/// Lorentz force plus continuous energy loss and scattering bookkeeping.
///
/// Valid when the track is inside non-vacuum material, the particle is
/// massive, and its momentum is positive. Pair it with
/// [`DefaultExtension`](crate::DefaultExtension) under
/// [`FirstValidOnly`](helion_extension::FirstValidOnly), registered first.
pub struct DenseEnvironmentExtension<U = HighlandScattering> {
    config: DenseEnvironmentConfig,
    updater: U,
    step: StepIntegration,
    energy_lost: f64,
    theta_variance: f64,
    last_dedx: f64,
    steps_in_material: u64,
}

impl<U: ScatteringUpdater> DenseEnvironmentExtension<U> {
    /// Build the extension after validating `config`.
    pub fn new(config: DenseEnvironmentConfig, updater: U) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            updater,
            step: StepIntegration::default(),
            energy_lost: 0.0,
            theta_variance: 0.0,
            last_dedx: 0.0,
            steps_in_material: 0,
        })
    }

    /// The configuration in use.
    pub fn config(&self) -> &DenseEnvironmentConfig {
        &self.config
    }

    /// Total energy lost over all finalized steps (GeV).
    pub fn energy_lost(&self) -> f64 {
        self.energy_lost
    }

    /// Accumulated projected scattering-angle variance (rad²).
    pub fn theta_variance(&self) -> f64 {
        self.theta_variance
    }

    /// Mean loss `-dE/ds` of the most recent step (GeV/mm).
    pub fn last_dedx(&self) -> f64 {
        self.last_dedx
    }

    /// Number of steps finalized inside material.
    pub fn steps_in_material(&self) -> u64 {
        self.steps_in_material
    }

    /// Zero the accumulated diagnostics.
    pub fn reset_diagnostics(&mut self) {
        self.energy_lost = 0.0;
        self.theta_variance = 0.0;
        self.last_dedx = 0.0;
        self.steps_in_material = 0;
    }

    fn prepare<S: TrackState>(&mut self, state: &S) -> bool {
        let Some(material) = state.material() else {
            return false;
        };
        let p0 = state.momentum();
        let mass = state.mass();
        let charge = state.charge();
        if p0 <= 0.0 || !p0.is_finite() {
            return false;
        }
        self.step = StepIntegration {
            prepared: true,
            initial_momentum: p0,
            mass,
            charge,
            material: Some(*material),
            ..StepIntegration::default()
        };
        true
    }

    /// Record `dp/ds`, `q/p` and `dt/ds` at stage `i` for momentum `p`.
    fn record_stage(&mut self, i: usize, p: f64) -> bool {
        let Some(material) = &self.step.material else {
            return false;
        };
        let Some(tki) = inverse_velocity(p, self.step.mass) else {
            return false;
        };
        let charge = self.step.charge;
        let dedx = bethe_mean_loss(material, p, self.step.mass) * charge * charge;
        let energy = self.step.energy(p);
        self.step.dedx[i] = dedx;
        self.step.dpds[i] = -dedx * energy / p;
        self.step.qop[i] = self.step.charge / p;
        self.step.tki[i] = tki;
        true
    }

    /// Apply the step to `state`; returns the new momentum on success.
    fn finish<S: TrackState>(&mut self, state: &mut S, h: f64) -> Option<f64> {
        if !self.step.prepared {
            log::debug!("dense: finalize without a prepared step");
            return None;
        }
        self.step.prepared = false;

        let p0 = self.step.initial_momentum;
        let p_new = self.step.final_momentum(h);
        if !p_new.is_finite() || p_new <= 0.0 || p_new <= self.config.momentum_cutoff {
            log::debug!(
                "dense: momentum {p_new:.6} GeV after step {h} mm at or below cutoff {}",
                self.config.momentum_cutoff
            );
            return None;
        }
        let delta_e = self.step.energy(p0) - self.step.energy(p_new);

        let variance = match state.material() {
            Some(material) if self.config.include_scattering => {
                let slab = material.with_thickness(h.abs());
                self.updater
                    .sigma_squared(&slab, p0, 1.0, state.particle(), delta_e.max(0.0))
            }
            _ => 0.0,
        };

        let dt = StepIntegration::weighted(&self.step.tki, h);
        state.set_time(state.time() + dt);
        state.set_momentum(p_new);

        self.energy_lost += delta_e;
        self.theta_variance += variance;
        self.last_dedx = StepIntegration::weighted(&self.step.dedx, 1.0);
        self.steps_in_material += 1;
        log::trace!("dense: p {p0:.6} -> {p_new:.6} GeV, dE {delta_e:.3e}, θ² += {variance:.3e}");
        Some(p_new)
    }
}

impl<S, U> Extension<S> for DenseEnvironmentExtension<U>
where
    S: TrackState,
    U: ScatteringUpdater + Send + 'static,
{
    fn name(&self) -> &str {
        "dense-environment"
    }

    fn is_valid(&self, state: &S) -> bool {
        state.in_dense_material() && state.mass() > 0.0 && state.momentum() > 0.0
    }

    fn k(
        &mut self,
        state: &S,
        k: &mut Vector3,
        b_field: &Vector3,
        stage: Stage,
        h: f64,
        k_prev: &Vector3,
    ) -> bool {
        let i = stage.index();
        let p = if stage.is_first() {
            if !self.prepare(state) {
                return false;
            }
            self.step.initial_momentum
        } else {
            if !self.step.prepared {
                return false;
            }
            self.step.initial_momentum + h * stage.step_fraction() * self.step.dpds[i - 1]
        };
        if !p.is_finite() || p <= 0.0 {
            log::debug!("dense: momentum {p} at {stage} is not positive");
            return false;
        }
        if !self.record_stage(i, p) {
            return false;
        }
        let dir = state.direction() + *k_prev * (stage.step_fraction() * h);
        *k += lorentz_k(self.step.qop[i], &dir, b_field);
        true
    }

    fn finalize(&mut self, state: &mut S, h: f64) -> bool {
        self.finish(state, h).is_some()
    }

    fn finalize_with_jacobian(
        &mut self,
        state: &mut S,
        h: f64,
        data: &StepData,
        jacobian: &mut Jacobian,
    ) -> bool {
        let p0 = self.step.initial_momentum;
        let qop0 = self.step.qop[0];
        let mut transport = vacuum_transport(h, &state.direction(), qop0, data);
        let Some(p_new) = self.finish(state, h) else {
            return false;
        };
        let ratio = p0 / p_new;
        transport[(QOP_INDEX, QOP_INDEX)] = ratio * ratio;
        *jacobian = transport * *jacobian;
        true
    }
}
