//! Auctioneers: strategies resolving validity claims into the step mask.
//!
//! After every extension has answered `is_valid()`, the auctioneer decides
//! which of the claimants actually act on the step. It is a pure function of
//! the candidate flags; registration order is the only priority it knows.

use smallvec::SmallVec;

/// One flag per registered extension, in registration order.
///
/// Stored inline for up to eight extensions so polling does not allocate.
pub type ValidityMask = SmallVec<[bool; 8]>;

/// Resolves per-extension validity candidates into the authoritative mask.
///
/// # Contract
///
/// - The result has the same length as `candidates`.
/// - The result depends only on `candidates` (no state across calls).
/// - Never fails: an all-false result means no extension acts.
///
/// Closures `Fn(ValidityMask) -> ValidityMask` are auctioneers too.
pub trait Auctioneer: Send {
    /// Resolve `candidates` into the mask used for the step.
    fn resolve(&self, candidates: ValidityMask) -> ValidityMask;
}

impl<F> Auctioneer for F
where
    F: Fn(ValidityMask) -> ValidityMask + Send,
{
    fn resolve(&self, candidates: ValidityMask) -> ValidityMask {
        self(candidates)
    }
}

/// Every extension that declared itself valid stays valid.
///
/// For independent, additive extensions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AcceptAll;

impl Auctioneer for AcceptAll {
    fn resolve(&self, candidates: ValidityMask) -> ValidityMask {
        candidates
    }
}

/// Only the first valid extension in registration order stays valid.
///
/// Yields at most one active extension per step, making registration order
/// a strict priority order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FirstValidOnly;

impl Auctioneer for FirstValidOnly {
    fn resolve(&self, mut candidates: ValidityMask) -> ValidityMask {
        let mut found = false;
        for flag in candidates.iter_mut() {
            if found {
                *flag = false;
            } else if *flag {
                found = true;
            }
        }
        candidates
    }
}
