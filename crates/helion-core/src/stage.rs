//! Runge–Kutta sub-stages and the per-step data recorded across them.

use std::error::Error;
use std::fmt;

use crate::math::Vector3;

/// One of the four k-evaluations of a 4th-order Runge–Kutta step.
///
/// `K1` opens the step: the extension registry polls validity and freezes
/// its mask there. `K2`–`K4` reuse that mask.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    /// First evaluation, at the start of the step.
    K1,
    /// Second evaluation, at the midpoint using `k1`.
    K2,
    /// Third evaluation, at the midpoint using `k2`.
    K3,
    /// Fourth evaluation, at the end of the step using `k3`.
    K4,
}

impl Stage {
    /// All stages in evaluation order.
    pub const ALL: [Stage; 4] = [Stage::K1, Stage::K2, Stage::K3, Stage::K4];

    /// Zero-based stage index (`K1` = 0).
    pub fn index(self) -> usize {
        match self {
            Self::K1 => 0,
            Self::K2 => 1,
            Self::K3 => 2,
            Self::K4 => 3,
        }
    }

    /// Whether this stage opens the step.
    pub fn is_first(self) -> bool {
        self == Self::K1
    }

    /// Fraction of the step size at which this stage evaluates its
    /// direction offset `dir + frac·h·k_prev`.
    ///
    /// `K1` uses no offset, the midpoint stages half a step, `K4` a full step.
    pub fn step_fraction(self) -> f64 {
        match self {
            Self::K1 => 0.0,
            Self::K2 | Self::K3 => 0.5,
            Self::K4 => 1.0,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "k{}", self.index() + 1)
    }
}

/// A raw stage index outside `0..4`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StageIndexError {
    /// The rejected index.
    pub index: usize,
}

impl fmt::Display for StageIndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stage index {} out of range 0..4", self.index)
    }
}

impl Error for StageIndexError {}

impl TryFrom<usize> for Stage {
    type Error = StageIndexError;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        Self::ALL
            .get(index)
            .copied()
            .ok_or(StageIndexError { index })
    }
}

impl TryFrom<u8> for Stage {
    type Error = StageIndexError;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        Self::try_from(index as usize)
    }
}

/// Field samples and k-terms recorded by the stepper during one step.
///
/// Passed to the jacobian overload of finalize so extensions can build the
/// transport matrix from the same quantities the state update used.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StepData {
    /// Field at the start of the step.
    pub b_first: Vector3,
    /// Field at the step midpoint.
    pub b_middle: Vector3,
    /// Field at the end of the step.
    pub b_last: Vector3,
    /// The four k-terms, indexed by [`Stage::index`].
    pub k: [Vector3; 4],
}

impl StepData {
    /// The k-term recorded for a stage.
    pub fn k(&self, stage: Stage) -> Vector3 {
        self.k[stage.index()]
    }

    /// The field sample a stage was evaluated against.
    pub fn field_for(&self, stage: Stage) -> Vector3 {
        match stage {
            Stage::K1 => self.b_first,
            Stage::K2 | Stage::K3 => self.b_middle,
            Stage::K4 => self.b_last,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_round_trips_through_try_from() {
        for stage in Stage::ALL {
            assert_eq!(Stage::try_from(stage.index()), Ok(stage));
        }
    }

    #[test]
    fn out_of_range_index_rejected() {
        assert_eq!(Stage::try_from(4usize), Err(StageIndexError { index: 4 }));
        assert!(Stage::try_from(200u8).is_err());
    }

    #[test]
    fn only_k1_opens_the_step() {
        assert!(Stage::K1.is_first());
        assert!(!Stage::K2.is_first());
        assert!(!Stage::K4.is_first());
    }

    #[test]
    fn display_is_one_based() {
        assert_eq!(Stage::K1.to_string(), "k1");
        assert_eq!(Stage::K4.to_string(), "k4");
    }
}
