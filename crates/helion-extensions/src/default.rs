//! Lorentz-force extension for steps in vacuum.
//!
//! Each stage contributes
//!
//! ```text
//! k_i = q/p · (dir + f_i·h·k_{i-1}) × B_i
//! ```
//!
//! with `f = (0, ½, ½, 1)`. Finalize advances the track time and, in the
//! jacobian overload, composes the vacuum transport matrix.

use helion_core::{
    inverse_velocity, lorentz_k, vacuum_transport, Jacobian, Stage, StepData, TrackState, Vector3,
};
use helion_extension::Extension;

/// Plain charged-particle motion in a magnetic field.
///
/// Valid whenever the track is not inside dense material.
#[derive(Clone, Debug, Default)]
pub struct DefaultExtension {
    steps_finalized: u64,
}

impl DefaultExtension {
    /// Create a new default extension.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of steps this extension has finalized.
    pub fn steps_finalized(&self) -> u64 {
        self.steps_finalized
    }

    fn advance_time<S: TrackState>(&self, state: &mut S, h: f64) -> bool {
        match inverse_velocity(state.momentum(), state.mass()) {
            Some(dtds) => {
                state.set_time(state.time() + h * dtds);
                true
            }
            None => false,
        }
    }
}

impl<S: TrackState> Extension<S> for DefaultExtension {
    fn name(&self) -> &str {
        "default"
    }

    fn is_valid(&self, state: &S) -> bool {
        !state.in_dense_material()
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
        let dir = state.direction() + *k_prev * (stage.step_fraction() * h);
        let term = lorentz_k(state.q_over_p(), &dir, b_field);
        if !term.is_finite() {
            return false;
        }
        *k += term;
        true
    }

    fn finalize(&mut self, state: &mut S, h: f64) -> bool {
        if !self.advance_time(state, h) {
            return false;
        }
        self.steps_finalized += 1;
        true
    }

    fn finalize_with_jacobian(
        &mut self,
        state: &mut S,
        h: f64,
        data: &StepData,
        jacobian: &mut Jacobian,
    ) -> bool {
        let transport = vacuum_transport(h, &state.direction(), state.q_over_p(), data);
        if !self.finalize(state, h) {
            return false;
        }
        *jacobian = transport * *jacobian;
        true
    }
}
