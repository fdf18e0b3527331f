//! The [`Extension`] trait.
//!
//! Extensions are the pluggable physics of a Runge–Kutta step. Each one
//! states whether it applies to the current track state, contributes to the
//! four k-evaluations, and closes the step in finalize. The registry owns
//! them and never needs their concrete types beyond this contract.

use std::any::Any;

use helion_core::{Jacobian, Stage, StepData, Vector3};

/// A pluggable physics contribution to one integration step.
///
/// `S` is the stepper's state type. The registry only forwards it;
/// extensions that need track quantities bound `S` on
/// [`TrackState`](helion_core::TrackState).
///
/// # Contract
///
/// - `is_valid()` is called once per step, on the first `k1` evaluation.
///   Its answer is frozen for the rest of the step.
/// - `k()` adds to `k`; it must not assume it is the only contributor.
/// - Returning `false` from `k()` or a finalize method declines the step.
///   The registry stops dispatching immediately and reports the failure;
///   later extensions are not called for that stage.
/// - State other than diagnostics must not leak across steps.
///
/// # Object safety
///
/// This trait is object-safe; the registry stores extensions as
/// `Box<dyn Extension<S>>`. The [`Any`] supertrait lets the registry hand
/// back a typed reference through
/// [`ExtensionList::get`](crate::ExtensionList::get).
///
/// # Examples
///
/// An extension adding a constant kick on every stage:
///
/// ```
/// use helion_core::{Stage, Vector3};
/// use helion_extension::Extension;
///
/// struct Kick(Vector3);
///
/// impl<S> Extension<S> for Kick {
///     fn name(&self) -> &str { "kick" }
///
///     fn is_valid(&self, _state: &S) -> bool { true }
///
///     fn k(
///         &mut self,
///         _state: &S,
///         k: &mut Vector3,
///         _b_field: &Vector3,
///         _stage: Stage,
///         _h: f64,
///         _k_prev: &Vector3,
///     ) -> bool {
///         *k += self.0;
///         true
///     }
///
///     fn finalize(&mut self, _state: &mut S, _h: f64) -> bool { true }
/// }
///
/// let mut kick = Kick(Vector3::new(1.0, 0.0, 0.0));
/// let mut k = Vector3::ZERO;
/// assert!(Extension::<()>::k(&mut kick, &(), &mut k, &Vector3::ZERO, Stage::K1, 0.0, &Vector3::ZERO));
/// assert_eq!(k, Vector3::new(1.0, 0.0, 0.0));
/// ```
pub trait Extension<S>: Any + Send {
    /// Human-readable name for error reporting and diagnostics.
    fn name(&self) -> &str;

    /// Whether this extension applies to the step starting from `state`.
    fn is_valid(&self, state: &S) -> bool;

    /// Contribute to the k-evaluation of `stage`.
    ///
    /// `b_field` is the field sample for the stage, `h` the full step size
    /// and `k_prev` the k-term of the previous stage (zero for `k1`).
    fn k(
        &mut self,
        state: &S,
        k: &mut Vector3,
        b_field: &Vector3,
        stage: Stage,
        h: f64,
        k_prev: &Vector3,
    ) -> bool;

    /// Close the step: apply state corrections such as energy loss.
    fn finalize(&mut self, state: &mut S, h: f64) -> bool;

    /// Close the step and also update the transport jacobian.
    ///
    /// `jacobian` arrives as the identity. Default: state-only
    /// [`finalize`](Extension::finalize), leaving the jacobian untouched.
    fn finalize_with_jacobian(
        &mut self,
        state: &mut S,
        h: f64,
        data: &StepData,
        jacobian: &mut Jacobian,
    ) -> bool {
        let _ = (data, jacobian);
        self.finalize(state, h)
    }
}
