//! Stepper configuration and validation.
//!
//! [`StepperConfig`] is the builder-input for [`RkStepper`](crate::RkStepper).
//! [`validate()`](StepperConfig::validate) checks its invariants; the
//! stepper constructor calls it so an invalid configuration never reaches a
//! step.

use helion_core::ConfigError;

// ── StepperConfig ──────────────────────────────────────────────────

/// Tunables of the adaptive Runge–Kutta–Nyström stepper.
///
/// Lengths are in mm.
#[derive(Clone, Debug, PartialEq)]
pub struct StepperConfig {
    /// Accepted local error estimate per step. Default: 1e-4.
    pub tolerance: f64,
    /// Step size of the first step of a fresh state. Default: 10.
    pub initial_step: f64,
    /// Retries never shrink the step below this. Default: 1e-4.
    pub min_step: f64,
    /// Upper bound on any step. Default: 1000.
    pub max_step: f64,
    /// Attempts per step before giving up. Default: 100.
    pub max_attempts: u32,
    /// Steps per [`propagate()`](crate::RkStepper::propagate) call before
    /// giving up. Default: 10 000.
    pub max_steps: u64,
    /// Build the transport jacobian in finalize and carry the covariance
    /// along. Default: false.
    pub transport_covariance: bool,
}

impl Default for StepperConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-4,
            initial_step: 10.0,
            min_step: 1e-4,
            max_step: 1000.0,
            max_attempts: 100,
            max_steps: 10_000,
            transport_covariance: false,
        }
    }
}

impl StepperConfig {
    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(ConfigError::InvalidTolerance {
                value: self.tolerance,
            });
        }
        for (name, value) in [
            ("min_step", self.min_step),
            ("initial_step", self.initial_step),
            ("max_step", self.max_step),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidStepSize {
                    reason: format!("{name} must be finite and positive, got {value}"),
                });
            }
        }
        if self.min_step > self.max_step {
            return Err(ConfigError::InvalidStepSize {
                reason: format!(
                    "min_step ({}) exceeds max_step ({})",
                    self.min_step, self.max_step
                ),
            });
        }
        if self.initial_step < self.min_step || self.initial_step > self.max_step {
            return Err(ConfigError::InvalidStepSize {
                reason: format!(
                    "initial_step ({}) outside [{}, {}]",
                    self.initial_step, self.min_step, self.max_step
                ),
            });
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::InvalidLimit {
                name: "max_attempts",
            });
        }
        if self.max_steps == 0 {
            return Err(ConfigError::InvalidLimit { name: "max_steps" });
        }
        Ok(())
    }
}
