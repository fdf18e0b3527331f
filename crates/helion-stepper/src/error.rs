//! Errors from multi-step propagation.

use std::error::Error;
use std::fmt;

use helion_core::StepError;

use crate::metrics::PropagationMetrics;

/// Why a [`propagate()`](crate::RkStepper::propagate) call stopped early.
///
/// Carries the metrics of the steps accepted before the failure; the state
/// reflects those steps.
#[derive(Clone, Debug)]
pub struct PropagationError {
    /// The underlying failure.
    pub kind: PropagationErrorKind,
    /// Metrics of the steps accepted before the failure.
    pub metrics: PropagationMetrics,
}

/// Classification of a [`PropagationError`].
#[derive(Clone, Debug, PartialEq)]
pub enum PropagationErrorKind {
    /// A step failed.
    Step {
        /// Zero-based index of the failing step within the call.
        index: u64,
        /// The step failure.
        source: StepError,
    },
    /// The configured step budget ran out before the path limit.
    StepLimit {
        /// The configured budget.
        max_steps: u64,
    },
    /// The requested path limit is not finite and positive.
    InvalidPathLimit {
        /// The rejected limit.
        value: f64,
    },
}

impl fmt::Display for PropagationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Step { index, source } => write!(f, "step {index} failed: {source}"),
            Self::StepLimit { max_steps } => {
                write!(f, "path limit not reached within {max_steps} steps")
            }
            Self::InvalidPathLimit { value } => {
                write!(f, "path limit must be finite and positive, got {value}")
            }
        }
    }
}

impl fmt::Display for PropagationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl Error for PropagationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.kind {
            PropagationErrorKind::Step { source, .. } => Some(source),
            _ => None,
        }
    }
}
