//! Per-step and per-propagation metrics.
//!
//! [`StepMetrics`] describes one accepted step; [`PropagationMetrics`]
//! folds them over a [`propagate()`](crate::RkStepper::propagate) call.

use indexmap::IndexMap;

/// What happened during one accepted step.
#[derive(Clone, Debug, Default)]
pub struct StepMetrics {
    /// Trial evaluations of stages `k2`..`k4`, including the accepted one.
    pub attempts: u32,
    /// Trials rejected because an extension declined.
    pub declined_attempts: u32,
    /// Step size actually taken (mm).
    pub step_size: f64,
    /// Error estimate of the accepted trial.
    pub error_estimate: f64,
    /// Step size proposed for the next step (mm).
    pub next_step_size: f64,
    /// Names of the extensions the auctioneer activated, in registration
    /// order. Empty when the stepper supplied the plain Lorentz term.
    pub active_extensions: Vec<String>,
    /// Whether a path limit cut the step short.
    pub trimmed: bool,
}

impl StepMetrics {
    /// Trials rejected for any reason.
    pub fn rejected_attempts(&self) -> u32 {
        self.attempts.saturating_sub(1)
    }
}

/// Cumulative metrics over many steps.
#[derive(Clone, Debug, Default)]
pub struct PropagationMetrics {
    /// Accepted steps.
    pub steps: u64,
    /// Trials rejected for a too-large error or a decline.
    pub rejected_attempts: u64,
    /// Of those, trials rejected because an extension declined.
    pub declined_attempts: u64,
    /// Path length covered (mm).
    pub path_length: f64,
    /// Largest accepted error estimate.
    pub max_error_estimate: f64,
    /// Steps with no active extension.
    pub baseline_steps: u64,
    /// Accepted steps per active extension, in first-seen order.
    pub extension_steps: IndexMap<String, u64>,
}

impl PropagationMetrics {
    /// Fold one accepted step into the totals.
    pub fn record(&mut self, step: &StepMetrics) {
        self.steps += 1;
        self.rejected_attempts += u64::from(step.rejected_attempts());
        self.declined_attempts += u64::from(step.declined_attempts);
        self.path_length += step.step_size;
        self.max_error_estimate = self.max_error_estimate.max(step.error_estimate);
        if step.active_extensions.is_empty() {
            self.baseline_steps += 1;
        }
        for name in &step.active_extensions {
            *self.extension_steps.entry(name.clone()).or_insert(0) += 1;
        }
    }
}
