//! The extension registry and its per-step dispatch protocol.
//!
//! [`ExtensionList`] owns an ordered set of distinct extensions. Each
//! integration step runs through it as:
//!
//! ```text
//! Unpolled ──k1──▶ Polled ──▶ Evaluated(k1..k4) ──finalize──▶ Finalized
//!    ▲                              │                            │
//!    └────────── abort_step ────────┘                            │
//!    └─────────────────────── next k1 ───────────────────────────┘
//! ```
//!
//! The validity mask is resolved on the first `k1` of a step and frozen
//! until the step ends. Stages `k2..k4` may be re-evaluated (e.g. with a
//! smaller step size) against the same mask.

use std::any::{Any, TypeId};
use std::fmt;

use helion_core::{
    ConfigError, EvalPhase, ExtensionError, Jacobian, Stage, StepData, StepId, Vector3,
};
use indexmap::IndexMap;

use crate::auctioneer::{AcceptAll, Auctioneer, ValidityMask};
use crate::extension::Extension;

/// Where the registry is in the current step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepPhase {
    /// No mask; the next `k1` evaluation polls.
    Unpolled,
    /// Mask resolved, no stage completed yet.
    Polled,
    /// The given stage was the last one to complete successfully.
    Evaluated(Stage),
    /// Finalize ran; the next `k1` evaluation opens a new step.
    Finalized,
}

/// Ordered, duplicate-free collection of extensions with a frozen
/// per-step validity mask.
///
/// Built once through [`ExtensionList::builder`] or [`ExtensionList::new`];
/// the extension set and auctioneer are fixed afterwards.
///
/// Not meant to be shared across concurrently propagated tracks: each
/// trajectory owns its own registry.
///
/// Extensions are `Any`, so the track state type `S` must be `'static`.
pub struct ExtensionList<S> {
    extensions: IndexMap<TypeId, Box<dyn Extension<S>>>,
    auctioneer: Box<dyn Auctioneer>,
    mask: Option<ValidityMask>,
    phase: StepPhase,
    step: StepId,
}

impl<S: 'static> ExtensionList<S> {
    /// Start building a registry.
    pub fn builder() -> ExtensionListBuilder<S> {
        ExtensionListBuilder {
            extensions: Vec::new(),
            auctioneer: Box::new(AcceptAll),
        }
    }

    /// A registry with no extensions. Every dispatch succeeds as a no-op.
    pub fn empty() -> Self {
        Self {
            extensions: IndexMap::new(),
            auctioneer: Box::new(AcceptAll),
            mask: None,
            phase: StepPhase::Unpolled,
            step: StepId::default(),
        }
    }

    /// Build a registry from boxed extensions in registration order.
    ///
    /// Fails if two extensions share a concrete type, or if `auctioneer`
    /// does not preserve mask length.
    pub fn new(
        extensions: Vec<Box<dyn Extension<S>>>,
        auctioneer: impl Auctioneer + 'static,
    ) -> Result<Self, ConfigError> {
        Self::from_parts(extensions, Box::new(auctioneer))
    }

    fn from_parts(
        extensions: Vec<Box<dyn Extension<S>>>,
        auctioneer: Box<dyn Auctioneer>,
    ) -> Result<Self, ConfigError> {
        let mut map: IndexMap<TypeId, Box<dyn Extension<S>>> =
            IndexMap::with_capacity(extensions.len());
        for ext in extensions {
            let any: &dyn Any = &*ext;
            let id = any.type_id();
            if map.contains_key(&id) {
                return Err(ConfigError::DuplicateExtension {
                    name: ext.name().to_string(),
                });
            }
            map.insert(id, ext);
        }

        let n = map.len();
        for probe in [true, false] {
            let candidates: ValidityMask = std::iter::repeat(probe).take(n).collect();
            let actual = auctioneer.resolve(candidates).len();
            if actual != n {
                return Err(ConfigError::AuctioneerMaskLength {
                    expected: n,
                    actual,
                });
            }
        }

        Ok(Self {
            extensions: map,
            auctioneer,
            mask: None,
            phase: StepPhase::Unpolled,
            step: StepId::default(),
        })
    }

    /// Number of registered extensions.
    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    /// Whether no extensions are registered.
    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    /// Extension names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.extensions.values().map(|e| e.name())
    }

    /// Names of the extensions active in the current step, in order.
    ///
    /// Empty when no mask is resolved.
    pub fn active_names(&self) -> Vec<&str> {
        match &self.mask {
            Some(mask) => self
                .extensions
                .values()
                .zip(mask.iter())
                .filter(|(_, &active)| active)
                .map(|(e, _)| e.name())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Number of active extensions in the current step (zero if unpolled).
    pub fn active_count(&self) -> usize {
        self.mask
            .as_ref()
            .map_or(0, |m| m.iter().filter(|&&f| f).count())
    }

    /// The frozen mask of the current step, if one is resolved.
    pub fn mask(&self) -> Option<&[bool]> {
        self.mask.as_deref()
    }

    /// Current position in the step protocol.
    pub fn phase(&self) -> StepPhase {
        self.phase
    }

    /// Id of the most recently opened step (`StepId(0)` before the first).
    pub fn step_id(&self) -> StepId {
        self.step
    }

    /// Whether an extension of type `T` is registered.
    pub fn contains<T: Extension<S>>(&self) -> bool {
        self.extensions.contains_key(&TypeId::of::<T>())
    }

    /// Typed access to a registered extension, e.g. to read its diagnostics.
    ///
    /// `None` means `T` was never registered, which is a configuration
    /// mistake on the caller's side.
    pub fn get<T: Extension<S>>(&self) -> Option<&T> {
        let ext = self.extensions.get(&TypeId::of::<T>())?;
        let any: &dyn Any = &**ext;
        any.downcast_ref::<T>()
    }

    /// Mutable typed access to a registered extension.
    pub fn get_mut<T: Extension<S>>(&mut self) -> Option<&mut T> {
        let ext = self.extensions.get_mut(&TypeId::of::<T>())?;
        let any: &mut dyn Any = &mut **ext;
        any.downcast_mut::<T>()
    }

    /// Discard the current step's mask without finalizing.
    ///
    /// The next `k1` evaluation re-polls. Used by callers abandoning a step
    /// after a failure.
    pub fn abort_step(&mut self) {
        if self.mask.take().is_some() {
            log::debug!("step {}: aborted before finalize", self.step);
        }
        self.phase = StepPhase::Unpolled;
    }

    fn poll(&mut self, state: &S) {
        self.step = self.step.next();
        let n = self.extensions.len();
        let candidates: ValidityMask = self
            .extensions
            .values()
            .map(|e| e.is_valid(state))
            .collect();
        let mut resolved = self.auctioneer.resolve(candidates.clone());
        if resolved.len() != n {
            // Construction probed the auctioneer; only an impure one gets here.
            log::warn!(
                "step {}: auctioneer returned {} flags for {} extensions, padding with false",
                self.step,
                resolved.len(),
                n
            );
            resolved.resize(n, false);
        }
        log::trace!(
            "step {}: candidates {:?} resolved to {:?}",
            self.step,
            candidates.as_slice(),
            resolved.as_slice()
        );
        self.mask = Some(resolved);
        self.phase = StepPhase::Polled;
    }

    /// Evaluate one Runge–Kutta stage across the active extensions.
    ///
    /// On `k1` with no mask for the current step, polls every extension and
    /// freezes the auctioneer's resolution. A repeated `k1` within the same
    /// step reuses the frozen mask.
    ///
    /// Active extensions add to `k` in registration order. The first one to
    /// decline ends the dispatch with [`ExtensionError::Declined`]; later
    /// extensions are not called and `k` must be discarded by the caller.
    ///
    /// Stages after `k1` require the preceding stage to have completed in
    /// this step, otherwise [`ExtensionError::OutOfOrder`] is returned.
    /// Going back to an earlier stage is allowed, so a caller can retry
    /// `k2..k4` with a smaller step under the same mask.
    ///
    /// With no active extension, succeeds without touching `k`.
    pub fn evaluate_stage(
        &mut self,
        state: &S,
        stage: Stage,
        k: &mut Vector3,
        b_field: &Vector3,
        h: f64,
        k_prev: &Vector3,
    ) -> Result<(), ExtensionError> {
        if stage.is_first() && self.mask.is_none() {
            self.poll(state);
        }
        let phase = EvalPhase::Stage(stage);
        let Some(mask) = &self.mask else {
            return Err(ExtensionError::NotPolled { phase });
        };
        let last_completed = match self.phase {
            StepPhase::Evaluated(last) => Some(last),
            _ => None,
        };
        let reachable = last_completed.map_or(0, |last| last.index() + 1);
        if stage.index() > reachable {
            return Err(ExtensionError::OutOfOrder {
                stage,
                last_completed,
            });
        }

        for (ext, _) in self
            .extensions
            .values_mut()
            .zip(mask.iter())
            .filter(|(_, &active)| active)
        {
            if !ext.k(state, k, b_field, stage, h, k_prev) {
                log::debug!("step {}: '{}' declined {stage}", self.step, ext.name());
                return Err(ExtensionError::Declined {
                    extension: ext.name().to_string(),
                    phase,
                });
            }
        }
        self.phase = StepPhase::Evaluated(stage);
        Ok(())
    }

    /// Close the step, propagating state corrections only.
    ///
    /// Active extensions run in registration order; the first decline ends
    /// the dispatch. Either way the step is over and the mask is cleared.
    pub fn finalize(&mut self, state: &mut S, h: f64) -> Result<(), ExtensionError> {
        self.finalize_each(|ext| ext.finalize(state, h))
    }

    /// Close the step and build the transport jacobian.
    ///
    /// `jacobian` should be the identity on entry; active extensions update
    /// it in registration order. On failure its content is unspecified.
    pub fn finalize_with_jacobian(
        &mut self,
        state: &mut S,
        h: f64,
        data: &StepData,
        jacobian: &mut Jacobian,
    ) -> Result<(), ExtensionError> {
        self.finalize_each(|ext| ext.finalize_with_jacobian(state, h, data, jacobian))
    }

    fn finalize_each<F>(&mut self, mut f: F) -> Result<(), ExtensionError>
    where
        F: FnMut(&mut (dyn Extension<S> + 'static)) -> bool,
    {
        let phase = EvalPhase::Finalize;
        let Some(mask) = self.mask.take() else {
            return Err(ExtensionError::NotPolled { phase });
        };
        self.phase = StepPhase::Finalized;

        for (ext, _) in self
            .extensions
            .values_mut()
            .zip(mask.iter())
            .filter(|(_, &active)| active)
        {
            if !f(&mut **ext) {
                log::debug!("step {}: '{}' declined finalize", self.step, ext.name());
                return Err(ExtensionError::Declined {
                    extension: ext.name().to_string(),
                    phase,
                });
            }
        }
        Ok(())
    }
}

impl<S: 'static> Default for ExtensionList<S> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<S: 'static> fmt::Debug for ExtensionList<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionList")
            .field("extensions", &self.names().collect::<Vec<_>>())
            .field("mask", &self.mask())
            .field("phase", &self.phase)
            .field("step", &self.step)
            .finish()
    }
}

/// Builder for [`ExtensionList`].
///
/// Registration order is the order of [`extension`](Self::extension)
/// calls. Defaults to the [`AcceptAll`] auctioneer.
pub struct ExtensionListBuilder<S> {
    extensions: Vec<Box<dyn Extension<S>>>,
    auctioneer: Box<dyn Auctioneer>,
}

impl<S: 'static> ExtensionListBuilder<S> {
    /// Register an extension after those already added.
    pub fn extension<E: Extension<S>>(mut self, extension: E) -> Self {
        self.extensions.push(Box::new(extension));
        self
    }

    /// Register an already boxed extension.
    pub fn boxed(mut self, extension: Box<dyn Extension<S>>) -> Self {
        self.extensions.push(extension);
        self
    }

    /// Choose the auctioneer resolving validity claims.
    pub fn auctioneer(mut self, auctioneer: impl Auctioneer + 'static) -> Self {
        self.auctioneer = Box::new(auctioneer);
        self
    }

    /// Validate and build the registry.
    pub fn build(self) -> Result<ExtensionList<S>, ConfigError> {
        ExtensionList::from_parts(self.extensions, self.auctioneer)
    }
}
