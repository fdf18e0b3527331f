//! Error types for the Helion workspace.
//!
//! Organized by when they surface: [`ConfigError`] at construction time,
//! [`ExtensionError`] from one registry dispatch, [`StepError`] from one
//! stepper step.

use std::error::Error;
use std::fmt;

use crate::stage::Stage;

/// Configuration mistakes detected before any step runs.
///
/// Fatal for the object being built: no partially configured registry or
/// stepper is ever returned alongside one of these.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// The same extension type was registered more than once.
    DuplicateExtension {
        /// Type name of the duplicated extension.
        name: String,
    },
    /// The auctioneer returned a mask of a different length than it was given.
    AuctioneerMaskLength {
        /// Number of registered extensions.
        expected: usize,
        /// Length of the mask the auctioneer produced.
        actual: usize,
    },
    /// The error tolerance is NaN, infinite, zero, or negative.
    InvalidTolerance {
        /// The invalid value.
        value: f64,
    },
    /// Step size bounds are inconsistent.
    InvalidStepSize {
        /// Description of which bound was violated.
        reason: String,
    },
    /// A count limit (attempts, steps) is zero.
    InvalidLimit {
        /// Name of the limit.
        name: &'static str,
    },
    /// A physics parameter is out of range.
    InvalidParameter {
        /// Name of the parameter.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },
    /// Material properties failed validation.
    InvalidMaterial {
        /// Description of the validation failure.
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateExtension { name } => {
                write!(f, "extension '{name}' registered more than once")
            }
            Self::AuctioneerMaskLength { expected, actual } => {
                write!(
                    f,
                    "auctioneer returned a mask of length {actual} for {expected} extensions"
                )
            }
            Self::InvalidTolerance { value } => {
                write!(f, "tolerance must be finite and positive, got {value}")
            }
            Self::InvalidStepSize { reason } => write!(f, "invalid step size: {reason}"),
            Self::InvalidLimit { name } => write!(f, "{name} must be at least 1"),
            Self::InvalidParameter { name, value } => {
                write!(f, "parameter '{name}' out of range: {value}")
            }
            Self::InvalidMaterial { reason } => write!(f, "invalid material: {reason}"),
        }
    }
}

impl Error for ConfigError {}

/// Where in the step protocol an extension was being driven.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EvalPhase {
    /// One of the four k-evaluations.
    Stage(Stage),
    /// Step finalization.
    Finalize,
}

impl fmt::Display for EvalPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stage(s) => write!(f, "stage {s}"),
            Self::Finalize => write!(f, "finalize"),
        }
    }
}

/// Failure of a single registry dispatch.
///
/// Recoverable at the step level: the caller discards the in-progress step
/// and may retry it with different parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExtensionError {
    /// An active extension declined to contribute.
    Declined {
        /// Name of the declining extension.
        extension: String,
        /// Where it declined.
        phase: EvalPhase,
    },
    /// A later stage or finalize was requested before the step's `k1` poll.
    NotPolled {
        /// The phase that was requested.
        phase: EvalPhase,
    },
    /// A stage was requested before the stage preceding it completed.
    OutOfOrder {
        /// The stage that was requested.
        stage: Stage,
        /// The last stage that completed in this step, if any.
        last_completed: Option<Stage>,
    },
}

impl ExtensionError {
    /// The phase the failure occurred in.
    pub fn phase(&self) -> EvalPhase {
        match self {
            Self::Declined { phase, .. } | Self::NotPolled { phase } => *phase,
            Self::OutOfOrder { stage, .. } => EvalPhase::Stage(*stage),
        }
    }
}

impl fmt::Display for ExtensionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Declined { extension, phase } => {
                write!(f, "extension '{extension}' declined at {phase}")
            }
            Self::NotPolled { phase } => {
                write!(f, "{phase} requested before the step's validity poll")
            }
            Self::OutOfOrder {
                stage,
                last_completed: Some(last),
            } => write!(f, "{stage} requested with only {last} completed"),
            Self::OutOfOrder {
                stage,
                last_completed: None,
            } => write!(f, "{stage} requested before k1 completed"),
        }
    }
}

impl Error for ExtensionError {}

/// Errors from one stepper step.
#[derive(Clone, Debug, PartialEq)]
pub enum StepError {
    /// An extension failure the stepper does not retry.
    Extension(ExtensionError),
    /// Step size shrank below the configured minimum while retrying.
    StepSizeUnderflow {
        /// The step size that would have been tried next.
        step_size: f64,
        /// The configured minimum.
        min: f64,
    },
    /// The retry budget for one step was used up.
    AttemptsExhausted {
        /// Number of attempts made.
        attempts: u32,
        /// The last extension failure, if that is why attempts were rejected.
        last: Option<ExtensionError>,
    },
    /// The state produced a NaN or infinite quantity.
    NonFiniteState {
        /// Which quantity went non-finite.
        what: &'static str,
    },
    /// The path-length limit for the step is NaN, zero, or negative.
    InvalidLimit {
        /// The rejected limit.
        value: f64,
    },
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Extension(e) => write!(f, "extension failure: {e}"),
            Self::StepSizeUnderflow { step_size, min } => {
                write!(f, "step size {step_size} fell below minimum {min}")
            }
            Self::AttemptsExhausted { attempts, last } => {
                write!(f, "step rejected after {attempts} attempts")?;
                if let Some(e) = last {
                    write!(f, " (last: {e})")?;
                }
                Ok(())
            }
            Self::NonFiniteState { what } => write!(f, "non-finite {what} in track state"),
            Self::InvalidLimit { value } => {
                write!(f, "step limit must be positive, got {value}")
            }
        }
    }
}

impl Error for StepError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Extension(e) => Some(e),
            Self::AttemptsExhausted { last: Some(e), .. } => Some(e),
            _ => None,
        }
    }
}

impl From<ExtensionError> for StepError {
    fn from(e: ExtensionError) -> Self {
        Self::Extension(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declined_display_names_extension_and_stage() {
        let e = ExtensionError::Declined {
            extension: "dense".into(),
            phase: EvalPhase::Stage(Stage::K3),
        };
        assert_eq!(e.to_string(), "extension 'dense' declined at stage k3");
        assert_eq!(e.phase(), EvalPhase::Stage(Stage::K3));
    }

    #[test]
    fn out_of_order_display_names_missing_stage() {
        let e = ExtensionError::OutOfOrder {
            stage: Stage::K4,
            last_completed: Some(Stage::K2),
        };
        assert_eq!(e.to_string(), "k4 requested with only k2 completed");
        assert_eq!(e.phase(), EvalPhase::Stage(Stage::K4));
        let e = ExtensionError::OutOfOrder {
            stage: Stage::K2,
            last_completed: None,
        };
        assert_eq!(e.to_string(), "k2 requested before k1 completed");
    }

    #[test]
    fn step_error_chains_extension_source() {
        let inner = ExtensionError::Declined {
            extension: "dense".into(),
            phase: EvalPhase::Finalize,
        };
        let e = StepError::from(inner.clone());
        let src = e.source().expect("source");
        assert_eq!(src.to_string(), inner.to_string());

        let exhausted = StepError::AttemptsExhausted {
            attempts: 3,
            last: None,
        };
        assert!(exhausted.source().is_none());
        assert_eq!(exhausted.to_string(), "step rejected after 3 attempts");
    }
}
