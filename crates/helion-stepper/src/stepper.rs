//! Adaptive Runge–Kutta–Nyström stepping over an extension registry.
//!
//! [`RkStepper`] owns the magnetic field and the configuration; the state
//! and the extension registry are passed in per call so one stepper can
//! drive many trajectories.
//!
//! # Step protocol
//!
//! 1. `k1` at the start of the step. The registry polls validity here and
//!    freezes its mask for the rest of the step.
//! 2. Trial: `k2`, `k3` at the midpoint and `k4` at the end. A decline
//!    halves `h`; an error estimate above tolerance rescales it. Either way
//!    only `k2`..`k4` are redone.
//! 3. Finalize with the step-start state, then advance position, direction
//!    and path length, then transport the covariance.
//!
//! If the mask leaves no extension active, the stepper supplies the plain
//! Lorentz term and time update itself.

use helion_core::{
    inverse_velocity, lorentz_k, vacuum_transport, ConfigError, ExtensionError, Jacobian,
    MagneticField, Stage, StepData, StepError, TrackState, Vector3,
};
use helion_extension::ExtensionList;

use crate::config::StepperConfig;
use crate::error::{PropagationError, PropagationErrorKind};
use crate::metrics::{PropagationMetrics, StepMetrics};
use crate::state::StepperState;

/// Remaining path below which a propagation counts as complete (mm).
const PATH_TOLERANCE: f64 = 1e-9;

// Compile-time assertion: one registry and state per thread is possible.
const _: () = {
    #[allow(dead_code)]
    fn assert_send<T: Send>() {}
    #[allow(dead_code)]
    fn check() {
        assert_send::<StepperState>();
        assert_send::<ExtensionList<StepperState>>();
    }
};

/// Factor applied to `h` for an error estimate `error`:
/// `(tolerance / 2·error)^¼`, clamped to `[0.25, 4]`.
pub fn step_size_scaling(tolerance: f64, error: f64) -> f64 {
    (tolerance / (2.0 * error)).sqrt().sqrt().clamp(0.25, 4.0)
}

// ── RkStepper ──────────────────────────────────────────────────────

/// Fourth-order Runge–Kutta–Nyström stepper with embedded error control.
pub struct RkStepper<F> {
    field: F,
    config: StepperConfig,
}

impl<F: MagneticField> RkStepper<F> {
    /// Validate `config` and build a stepper over `field`.
    pub fn new(field: F, config: StepperConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { field, config })
    }

    /// The configuration in use.
    pub fn config(&self) -> &StepperConfig {
        &self.config
    }

    /// The magnetic field.
    pub fn field(&self) -> &F {
        &self.field
    }

    /// Take one adaptive step.
    ///
    /// # Errors
    ///
    /// - [`StepError::Extension`] if an extension declines `k1` or
    ///   finalize. Nothing has been applied to the state for a `k1`
    ///   failure; after a finalize failure the declining extension's
    ///   predecessors may have updated time or momentum.
    /// - [`StepError::AttemptsExhausted`] or
    ///   [`StepError::StepSizeUnderflow`] if no trial was accepted.
    /// - [`StepError::NonFiniteState`] if the step produced NaN or
    ///   infinities.
    ///
    /// The registry is left between steps on every error path.
    pub fn step(
        &self,
        state: &mut StepperState,
        extensions: &mut ExtensionList<StepperState>,
    ) -> Result<StepMetrics, StepError> {
        self.step_with_limit(state, extensions, f64::INFINITY)
    }

    /// Take one adaptive step no longer than `limit` mm.
    ///
    /// `limit` may be infinite. A NaN, zero, or negative limit returns
    /// [`StepError::InvalidLimit`] before the state or registry is touched.
    pub fn step_with_limit(
        &self,
        state: &mut StepperState,
        extensions: &mut ExtensionList<StepperState>,
        limit: f64,
    ) -> Result<StepMetrics, StepError> {
        if limit.is_nan() || limit <= 0.0 {
            return Err(StepError::InvalidLimit { value: limit });
        }
        let cfg = &self.config;
        let preferred = state
            .step_size
            .unwrap_or(cfg.initial_step)
            .min(cfg.max_step);
        let trimmed = limit < preferred;
        let mut h = if trimmed { limit } else { preferred };

        // Never inherit a half-finished step.
        extensions.abort_step();

        let pos = state.position;
        let dir = state.direction;
        let b_first = self.field.field(&pos);
        let mut k1 = Vector3::ZERO;
        if let Err(e) =
            extensions.evaluate_stage(state, Stage::K1, &mut k1, &b_first, h, &Vector3::ZERO)
        {
            extensions.abort_step();
            return Err(e.into());
        }
        let baseline = extensions.active_count() == 0;
        if baseline {
            k1 += lorentz_k(state.q_over_p(), &dir, &b_first);
        }

        let mut metrics = StepMetrics {
            active_extensions: extensions
                .active_names()
                .into_iter()
                .map(str::to_owned)
                .collect(),
            trimmed,
            ..Default::default()
        };

        let mut last_decline: Option<ExtensionError> = None;
        let (data, error) = loop {
            if metrics.attempts >= cfg.max_attempts {
                extensions.abort_step();
                log::warn!(
                    "step {}: no trial accepted after {} attempts",
                    extensions.step_id(),
                    metrics.attempts
                );
                return Err(StepError::AttemptsExhausted {
                    attempts: metrics.attempts,
                    last: last_decline,
                });
            }
            metrics.attempts += 1;

            match self.trial(state, extensions, h, k1, b_first, baseline) {
                Ok((data, error)) => {
                    if !error.is_finite() {
                        extensions.abort_step();
                        return Err(StepError::NonFiniteState {
                            what: "error estimate",
                        });
                    }
                    if error <= cfg.tolerance {
                        break (data, error);
                    }
                    let scaled = h * step_size_scaling(cfg.tolerance, error);
                    log::debug!(
                        "step {}: error {error:.3e} above tolerance at h = {h}, retrying with {scaled}",
                        extensions.step_id()
                    );
                    h = scaled;
                }
                Err(e) => {
                    log::debug!(
                        "step {}: {e} at h = {h}, retrying with {}",
                        extensions.step_id(),
                        0.5 * h
                    );
                    metrics.declined_attempts += 1;
                    last_decline = Some(e);
                    h *= 0.5;
                }
            }

            if h.abs() < cfg.min_step {
                extensions.abort_step();
                log::warn!(
                    "step {}: step size {h} fell below minimum {}",
                    extensions.step_id(),
                    cfg.min_step
                );
                return Err(StepError::StepSizeUnderflow {
                    step_size: h,
                    min: cfg.min_step,
                });
            }
        };

        let [k1, k2, k3, k4] = data.k;
        let position = pos + dir * h + (k1 + k2 + k3) * (h * h / 6.0);
        if !position.is_finite() {
            extensions.abort_step();
            return Err(StepError::NonFiniteState { what: "position" });
        }
        let Some(direction) = (dir + (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (h / 6.0)).normalized()
        else {
            extensions.abort_step();
            return Err(StepError::NonFiniteState { what: "direction" });
        };

        // Finalize sees the state as it was at the start of the step.
        let transport = if cfg.transport_covariance {
            let mut d = Jacobian::identity();
            extensions.finalize_with_jacobian(state, h, &data, &mut d)?;
            Some(d)
        } else {
            extensions.finalize(state, h)?;
            None
        };
        let transport = if baseline {
            self.finalize_baseline(state, h)?;
            transport.map(|_| vacuum_transport(h, &dir, state.q_over_p(), &data))
        } else {
            transport
        };

        state.position = position;
        state.direction = direction;
        state.path_length += h;
        if let Some(d) = transport {
            if let Some(cov) = state.covariance.as_mut() {
                *cov = d.transport(cov);
            }
            state.jacobian = d * state.jacobian;
        }

        let next = if trimmed && metrics.attempts == 1 {
            preferred
        } else {
            (h * step_size_scaling(cfg.tolerance, error)).clamp(cfg.min_step, cfg.max_step)
        };
        state.step_size = Some(next);

        metrics.step_size = h;
        metrics.error_estimate = error;
        metrics.next_step_size = next;
        log::trace!(
            "step {}: h = {h:.4} mm, error {error:.2e}, {} attempt(s), next {next:.4}",
            extensions.step_id(),
            metrics.attempts
        );
        Ok(metrics)
    }

    /// Step repeatedly until the state has travelled `path_limit` mm
    /// further, trimming the last step to land on it.
    ///
    /// # Errors
    ///
    /// Stops at the first failing step or when `max_steps` steps did not
    /// reach the limit. The error carries the metrics of the accepted
    /// steps, which remain applied to `state`.
    pub fn propagate(
        &self,
        state: &mut StepperState,
        extensions: &mut ExtensionList<StepperState>,
        path_limit: f64,
    ) -> Result<PropagationMetrics, PropagationError> {
        let mut metrics = PropagationMetrics::default();
        if !path_limit.is_finite() || path_limit <= 0.0 {
            return Err(PropagationError {
                kind: PropagationErrorKind::InvalidPathLimit { value: path_limit },
                metrics,
            });
        }
        let target = state.path_length + path_limit;
        let mut index = 0u64;
        loop {
            let remaining = target - state.path_length;
            if remaining <= PATH_TOLERANCE {
                break;
            }
            if index >= self.config.max_steps {
                log::warn!(
                    "propagation stopped after {index} steps, {remaining:.4} mm short"
                );
                return Err(PropagationError {
                    kind: PropagationErrorKind::StepLimit {
                        max_steps: self.config.max_steps,
                    },
                    metrics,
                });
            }
            match self.step_with_limit(state, extensions, remaining) {
                Ok(step) => metrics.record(&step),
                Err(source) => {
                    log::warn!("propagation step {index} failed: {source}");
                    return Err(PropagationError {
                        kind: PropagationErrorKind::Step { index, source },
                        metrics,
                    });
                }
            }
            index += 1;
        }
        log::debug!(
            "propagated {:.3} mm in {} steps ({} rejected)",
            metrics.path_length,
            metrics.steps,
            metrics.rejected_attempts
        );
        Ok(metrics)
    }

    /// Evaluate `k2`..`k4` for step size `h`; returns the step data and the
    /// error estimate `h²·|k1 − k2 − k3 + k4|₁`.
    fn trial(
        &self,
        state: &StepperState,
        extensions: &mut ExtensionList<StepperState>,
        h: f64,
        k1: Vector3,
        b_first: Vector3,
        baseline: bool,
    ) -> Result<(StepData, f64), ExtensionError> {
        let pos = state.position;
        let dir = state.direction;

        let mid = pos + dir * (0.5 * h) + k1 * (h * h / 8.0);
        let b_middle = self.field.field(&mid);
        let k2 = Self::stage(state, extensions, Stage::K2, &b_middle, h, &k1, baseline)?;
        let k3 = Self::stage(state, extensions, Stage::K3, &b_middle, h, &k2, baseline)?;

        let end = pos + dir * h + k3 * (h * h / 2.0);
        let b_last = self.field.field(&end);
        let k4 = Self::stage(state, extensions, Stage::K4, &b_last, h, &k3, baseline)?;

        let error = h * h * (k1 - k2 - k3 + k4).abs_sum();
        let data = StepData {
            b_first,
            b_middle,
            b_last,
            k: [k1, k2, k3, k4],
        };
        Ok((data, error))
    }

    fn stage(
        state: &StepperState,
        extensions: &mut ExtensionList<StepperState>,
        stage: Stage,
        b: &Vector3,
        h: f64,
        k_prev: &Vector3,
        baseline: bool,
    ) -> Result<Vector3, ExtensionError> {
        let mut k = Vector3::ZERO;
        extensions.evaluate_stage(state, stage, &mut k, b, h, k_prev)?;
        if baseline {
            let dir = state.direction + *k_prev * (stage.step_fraction() * h);
            k += lorentz_k(state.q_over_p(), &dir, b);
        }
        Ok(k)
    }

    /// Time update for steps no extension claimed.
    fn finalize_baseline(&self, state: &mut StepperState, h: f64) -> Result<(), StepError> {
        let dtds = inverse_velocity(state.momentum(), state.mass())
            .ok_or(StepError::NonFiniteState { what: "velocity" })?;
        state.set_time(state.time() + h * dtds);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helion_extensions::{ConstantField, NullField};
    use helion_test_utils::CountingField;
    use proptest::prelude::*;

    fn state_along_x() -> StepperState {
        StepperState::new(Vector3::ZERO, Vector3::new(1.0, 0.0, 0.0), 1.0, 1.0).unwrap()
    }

    #[test]
    fn invalid_config_rejected() {
        let cfg = StepperConfig {
            tolerance: -1.0,
            ..Default::default()
        };
        assert!(RkStepper::new(NullField, cfg).is_err());
    }

    #[test]
    fn straight_line_without_field() {
        let stepper = RkStepper::new(NullField, StepperConfig::default()).unwrap();
        let mut state = state_along_x();
        let mut list = ExtensionList::empty();
        let m = stepper.step(&mut state, &mut list).unwrap();

        assert_eq!(m.step_size, 10.0);
        assert_eq!(m.attempts, 1);
        assert_eq!(m.error_estimate, 0.0);
        assert!(m.active_extensions.is_empty());
        assert_eq!(state.position(), Vector3::new(10.0, 0.0, 0.0));
        assert_eq!(state.direction(), Vector3::new(1.0, 0.0, 0.0));
        assert_eq!(state.path_length(), 10.0);
        assert!(state.time() > 0.0);
        // Zero error grows the step by the maximum factor.
        assert_eq!(state.step_size(), Some(40.0));
        assert!(list.mask().is_none());
    }

    #[test]
    fn limit_trims_without_shrinking_next_step() {
        let stepper = RkStepper::new(NullField, StepperConfig::default()).unwrap();
        let mut state = state_along_x();
        let mut list = ExtensionList::empty();
        let m = stepper.step_with_limit(&mut state, &mut list, 2.5).unwrap();
        assert!(m.trimmed);
        assert_eq!(m.step_size, 2.5);
        assert_eq!(state.step_size(), Some(10.0));
    }

    #[test]
    fn non_positive_limit_rejected_without_moving() {
        let stepper = RkStepper::new(NullField, StepperConfig::default()).unwrap();
        let mut list = ExtensionList::empty();
        for limit in [-5.0, 0.0, f64::NAN] {
            let mut state = state_along_x();
            let err = stepper
                .step_with_limit(&mut state, &mut list, limit)
                .unwrap_err();
            assert!(matches!(err, StepError::InvalidLimit { .. }), "{limit}: {err}");
            assert_eq!(state.position(), Vector3::ZERO);
            assert_eq!(state.path_length(), 0.0);
            assert_eq!(state.step_size(), None);
        }
        assert_eq!(list.step_id(), helion_core::StepId(0));
    }

    #[test]
    fn baseline_bends_positive_track_toward_minus_y() {
        let stepper = RkStepper::new(ConstantField::along_z(2.0), StepperConfig::default()).unwrap();
        let mut state = state_along_x();
        let mut list = ExtensionList::empty();
        stepper.step(&mut state, &mut list).unwrap();
        assert!(state.position().y() < 0.0);
        assert!(state.direction().y() < 0.0);
        assert!((state.direction().norm() - 1.0).abs() < 1e-12);
        assert_eq!(state.momentum(), 1.0);
    }

    #[test]
    fn large_error_shrinks_step() {
        let cfg = StepperConfig {
            tolerance: 1e-9,
            initial_step: 500.0,
            ..Default::default()
        };
        let stepper = RkStepper::new(ConstantField::along_z(4.0), cfg).unwrap();
        let mut state = state_along_x();
        let mut list = ExtensionList::empty();
        let m = stepper.step(&mut state, &mut list).unwrap();
        assert!(m.attempts > 1);
        assert_eq!(m.declined_attempts, 0);
        assert!(m.step_size < 500.0);
        assert!(m.error_estimate <= 1e-9);
    }

    #[test]
    fn field_sampled_at_start_then_twice_per_trial() {
        let cfg = StepperConfig {
            tolerance: 1e-9,
            initial_step: 500.0,
            ..Default::default()
        };
        let field = CountingField::new(Vector3::new(0.0, 0.0, 4.0));
        let stepper = RkStepper::new(field, cfg).unwrap();
        let mut state = state_along_x();
        let mut list = ExtensionList::empty();
        let m = stepper.step(&mut state, &mut list).unwrap();
        assert_eq!(stepper.field().samples(), 1 + 2 * m.attempts as usize);
    }

    #[test]
    fn covariance_transport_in_zero_field() {
        let cfg = StepperConfig {
            transport_covariance: true,
            ..Default::default()
        };
        let stepper = RkStepper::new(NullField, cfg).unwrap();
        let mut state = state_along_x().with_covariance(Jacobian::identity());
        let mut list = ExtensionList::empty();
        stepper.step(&mut state, &mut list).unwrap();

        let cov = state.covariance().unwrap();
        // x' = x + h·tx
        assert!((cov[(0, 0)] - 101.0).abs() < 1e-12);
        assert!((cov[(0, 3)] - 10.0).abs() < 1e-12);
        assert_eq!(cov[(3, 3)], 1.0);
        assert_eq!(state.jacobian()[(0, 3)], 10.0);
    }

    proptest! {
        #[test]
        fn scaling_stays_within_bounds(tol in 1e-12f64..1.0, err in 0.0f64..1e3) {
            let s = step_size_scaling(tol, err);
            prop_assert!((0.25..=4.0).contains(&s));
        }

        #[test]
        fn scaling_grows_when_error_is_small(tol in 1e-8f64..1e-2) {
            prop_assert!(step_size_scaling(tol, tol / 100.0) > 1.0);
            prop_assert!(step_size_scaling(tol, tol * 100.0) < 1.0);
        }
    }
}
