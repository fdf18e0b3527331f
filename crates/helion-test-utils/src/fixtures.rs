//! Reusable stub extensions.
//!
//! [`StubExtension`] is one configurable fixture covering the registry's
//! test needs: constant contributions, scripted declines, externally
//! switchable or self-flipping validity, call counting, and an ordered call
//! log shared across extensions.
//!
//! The registry keys extensions by concrete type, so the const parameter
//! `SLOT` gives each stub in a registry its own type:
//! `StubExtension::<0>`, `StubExtension::<1>`, ...

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use helion_core::{EvalPhase, Jacobian, Stage, StepData, Vector3};
use helion_extension::Extension;

/// Shared handle controlling a stub's validity answer.
#[derive(Clone, Debug, Default)]
pub struct ValiditySwitch(Arc<AtomicBool>);

impl ValiditySwitch {
    pub fn new(valid: bool) -> Self {
        Self(Arc::new(AtomicBool::new(valid)))
    }

    pub fn set(&self, valid: bool) {
        self.0.store(valid, Ordering::Relaxed);
    }

    pub fn get(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Flip and return the previous value.
    pub fn toggle(&self) -> bool {
        self.0.fetch_xor(true, Ordering::Relaxed)
    }
}

/// Per-operation call counters of one stub.
#[derive(Debug, Default)]
pub struct CallCounts {
    polls: AtomicUsize,
    k: [AtomicUsize; 4],
    finalizes: AtomicUsize,
}

impl CallCounts {
    /// How many times `is_valid()` was called.
    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::Relaxed)
    }

    /// How many times `k()` was called for `stage`.
    pub fn k_calls(&self, stage: Stage) -> usize {
        self.k[stage.index()].load(Ordering::Relaxed)
    }

    /// `k()` calls summed over all stages.
    pub fn total_k_calls(&self) -> usize {
        Stage::ALL.iter().map(|&s| self.k_calls(s)).sum()
    }

    /// How many times either finalize method was called.
    pub fn finalizes(&self) -> usize {
        self.finalizes.load(Ordering::Relaxed)
    }
}

/// Ordered record of calls, shareable between stubs.
///
/// Entries look like `"a:poll"`, `"a:k2"`, `"b:finalize"`.
#[derive(Clone, Debug, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: String) {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

/// Configurable stub extension usable with any stepper state type.
pub struct StubExtension<const SLOT: usize> {
    name: String,
    valid: ValiditySwitch,
    flip_on_poll: bool,
    contribution: Vector3,
    decline: Option<EvalPhase>,
    jacobian_qop_factor: f64,
    counts: Arc<CallCounts>,
    log: Option<CallLog>,
}

impl<const SLOT: usize> StubExtension<SLOT> {
    /// A valid stub that adds `contribution` on every stage.
    pub fn new(name: impl Into<String>, contribution: Vector3) -> Self {
        Self {
            name: name.into(),
            valid: ValiditySwitch::new(true),
            flip_on_poll: false,
            contribution,
            decline: None,
            jacobian_qop_factor: 1.0,
            counts: Arc::new(CallCounts::default()),
            log: None,
        }
    }

    /// Start out answering `valid` to polls.
    pub fn valid(self, valid: bool) -> Self {
        self.valid.set(valid);
        self
    }

    /// Invert the validity answer after every poll.
    pub fn flipping(mut self) -> Self {
        self.flip_on_poll = true;
        self
    }

    /// Decline when driven in `phase`.
    pub fn declining_at(mut self, phase: EvalPhase) -> Self {
        self.decline = Some(phase);
        self
    }

    /// Multiply the q/p diagonal of the jacobian by `factor` in finalize.
    pub fn scaling_jacobian(mut self, factor: f64) -> Self {
        self.jacobian_qop_factor = factor;
        self
    }

    /// Record calls into `log`.
    pub fn logging_to(mut self, log: &CallLog) -> Self {
        self.log = Some(log.clone());
        self
    }

    /// Handle to change validity after registration.
    pub fn switch(&self) -> ValiditySwitch {
        self.valid.clone()
    }

    /// Handle to the call counters.
    pub fn counts(&self) -> Arc<CallCounts> {
        Arc::clone(&self.counts)
    }

    /// Change the contribution (e.g. through `ExtensionList::get_mut`).
    pub fn set_contribution(&mut self, contribution: Vector3) {
        self.contribution = contribution;
    }

    fn record(&self, what: impl std::fmt::Display) {
        if let Some(log) = &self.log {
            log.record(format!("{}:{what}", self.name));
        }
    }

    fn finalize_common(&self) -> bool {
        self.counts.finalizes.fetch_add(1, Ordering::Relaxed);
        self.record("finalize");
        self.decline != Some(EvalPhase::Finalize)
    }
}

impl<S, const SLOT: usize> Extension<S> for StubExtension<SLOT> {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_valid(&self, _state: &S) -> bool {
        self.counts.polls.fetch_add(1, Ordering::Relaxed);
        self.record("poll");
        if self.flip_on_poll {
            self.valid.toggle()
        } else {
            self.valid.get()
        }
    }

    fn k(
        &mut self,
        _state: &S,
        k: &mut Vector3,
        _b_field: &Vector3,
        stage: Stage,
        _h: f64,
        _k_prev: &Vector3,
    ) -> bool {
        self.counts.k[stage.index()].fetch_add(1, Ordering::Relaxed);
        self.record(stage);
        if self.decline == Some(EvalPhase::Stage(stage)) {
            return false;
        }
        *k += self.contribution;
        true
    }

    fn finalize(&mut self, _state: &mut S, _h: f64) -> bool {
        self.finalize_common()
    }

    fn finalize_with_jacobian(
        &mut self,
        _state: &mut S,
        _h: f64,
        _data: &StepData,
        jacobian: &mut Jacobian,
    ) -> bool {
        if !self.finalize_common() {
            return false;
        }
        jacobian[(helion_core::QOP_INDEX, helion_core::QOP_INDEX)] *= self.jacobian_qop_factor;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flipping_stub_alternates() {
        let stub = StubExtension::<0>::new("f", Vector3::ZERO).flipping();
        assert!(Extension::<()>::is_valid(&stub, &()));
        assert!(!Extension::<()>::is_valid(&stub, &()));
        assert!(Extension::<()>::is_valid(&stub, &()));
        assert_eq!(stub.counts().polls(), 3);
    }

    #[test]
    fn declining_stub_leaves_k_untouched() {
        let mut stub = StubExtension::<0>::new("d", Vector3::new(1.0, 1.0, 1.0))
            .declining_at(EvalPhase::Stage(Stage::K2));
        let mut k = Vector3::ZERO;
        let z = Vector3::ZERO;
        assert!(Extension::<()>::k(&mut stub, &(), &mut k, &z, Stage::K1, 1.0, &z));
        assert!(!Extension::<()>::k(&mut stub, &(), &mut k, &z, Stage::K2, 1.0, &z));
        assert_eq!(k, Vector3::new(1.0, 1.0, 1.0));
        assert_eq!(stub.counts().total_k_calls(), 2);
    }
}
