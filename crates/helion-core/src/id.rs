//! Strongly-typed identifiers.

use std::fmt;

/// Monotonic counter of integration steps taken by one registry.
///
/// `StepId(0)` means no step has started yet. The registry advances the
/// counter each time a fresh validity poll opens a step, so log lines and
/// diagnostics from the same step share one id.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StepId(pub u64);

impl StepId {
    /// The id that follows this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for StepId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}
