//! How the stepper reacts to declining extensions and exhausted budgets.
//!
//! Every failure must leave the registry between steps (no frozen mask) so
//! the next step polls afresh, and must not apply a partial step to the
//! state.

use helion_core::{EvalPhase, ExtensionError, Stage, StepError, TrackState, Vector3};
use helion_extension::{AcceptAll, ExtensionList, StepPhase};
use helion_extensions::{ConstantField, NullField};
use helion_stepper::{PropagationErrorKind, RkStepper, StepperConfig, StepperState};
use helion_test_utils::StubExtension;

type Stub = StubExtension<0>;

fn state() -> StepperState {
    StepperState::new(Vector3::ZERO, Vector3::new(1.0, 0.0, 0.0), 1.0, 1.0).unwrap()
}

fn single(stub: Stub) -> ExtensionList<StepperState> {
    ExtensionList::builder()
        .extension(stub)
        .auctioneer(AcceptAll)
        .build()
        .unwrap()
}

#[test]
fn k1_decline_fails_without_touching_state() {
    let stepper = RkStepper::new(NullField, StepperConfig::default()).unwrap();
    let stub = Stub::new("stub", Vector3::ZERO).declining_at(EvalPhase::Stage(Stage::K1));
    let counts = stub.counts();
    let mut list = single(stub);
    let mut s = state();
    let before = s.clone();

    let err = stepper.step(&mut s, &mut list).unwrap_err();
    assert_eq!(
        err,
        StepError::Extension(ExtensionError::Declined {
            extension: "stub".into(),
            phase: EvalPhase::Stage(Stage::K1),
        })
    );
    assert_eq!(s, before);
    assert!(list.mask().is_none());
    assert_eq!(list.phase(), StepPhase::Unpolled);
    assert_eq!(counts.k_calls(Stage::K2), 0);
}

#[test]
fn repeated_decline_exhausts_attempts_without_repolling() {
    let cfg = StepperConfig {
        max_attempts: 5,
        ..Default::default()
    };
    let stepper = RkStepper::new(NullField, cfg).unwrap();
    let stub = Stub::new("stub", Vector3::ZERO).declining_at(EvalPhase::Stage(Stage::K3));
    let counts = stub.counts();
    let mut list = single(stub);
    let mut s = state();

    let err = stepper.step(&mut s, &mut list).unwrap_err();
    match err {
        StepError::AttemptsExhausted { attempts, last } => {
            assert_eq!(attempts, 5);
            assert_eq!(last.map(|e| e.phase()), Some(EvalPhase::Stage(Stage::K3)));
        }
        other => panic!("expected AttemptsExhausted, got {other:?}"),
    }
    assert_eq!(counts.polls(), 1);
    assert_eq!(counts.k_calls(Stage::K1), 1);
    assert_eq!(counts.k_calls(Stage::K2), 5);
    assert_eq!(counts.k_calls(Stage::K3), 5);
    assert_eq!(counts.k_calls(Stage::K4), 0);
    assert_eq!(counts.finalizes(), 0);
    assert!(list.mask().is_none());
    assert_eq!(s.path_length(), 0.0);
}

#[test]
fn repeated_decline_underflows_step_size() {
    let stepper = RkStepper::new(NullField, StepperConfig::default()).unwrap();
    let stub = Stub::new("stub", Vector3::ZERO).declining_at(EvalPhase::Stage(Stage::K4));
    let mut list = single(stub);
    let mut s = state();

    match stepper.step(&mut s, &mut list).unwrap_err() {
        StepError::StepSizeUnderflow { step_size, min } => {
            assert!(step_size < min);
            assert_eq!(min, 1e-4);
        }
        other => panic!("expected StepSizeUnderflow, got {other:?}"),
    }
    assert!(list.mask().is_none());
}

#[test]
fn finalize_decline_leaves_position_in_place() {
    let stepper = RkStepper::new(NullField, StepperConfig::default()).unwrap();
    let stub = Stub::new("stub", Vector3::ZERO).declining_at(EvalPhase::Finalize);
    let mut list = single(stub);
    let mut s = state();

    let err = stepper.step(&mut s, &mut list).unwrap_err();
    assert_eq!(
        err,
        StepError::Extension(ExtensionError::Declined {
            extension: "stub".into(),
            phase: EvalPhase::Finalize,
        })
    );
    assert_eq!(s.position(), Vector3::ZERO);
    assert!(list.mask().is_none());
}

#[test]
fn next_step_repolls_after_failure() {
    let stepper = RkStepper::new(NullField, StepperConfig::default()).unwrap();
    let stub = Stub::new("stub", Vector3::ZERO).declining_at(EvalPhase::Stage(Stage::K1));
    let counts = stub.counts();
    let switch = stub.switch();
    let mut list = single(stub);
    let mut s = state();

    assert!(stepper.step(&mut s, &mut list).is_err());
    // Once the stub stops claiming the step, the stepper flies straight.
    switch.set(false);
    let m = stepper.step(&mut s, &mut list).unwrap();
    assert!(m.active_extensions.is_empty());
    assert_eq!(counts.polls(), 2);
    assert_eq!(s.position(), Vector3::new(10.0, 0.0, 0.0));
}

#[test]
fn active_extension_suppresses_baseline_term() {
    let stepper = RkStepper::new(ConstantField::along_z(2.0), StepperConfig::default()).unwrap();
    let mut list = single(Stub::new("inert", Vector3::ZERO));
    let mut s = state();

    let m = stepper.step(&mut s, &mut list).unwrap();
    assert_eq!(m.active_extensions, vec!["inert".to_string()]);
    // The only active extension contributes nothing, so no bending.
    assert_eq!(s.position(), Vector3::new(10.0, 0.0, 0.0));
    assert_eq!(s.direction(), Vector3::new(1.0, 0.0, 0.0));
}

#[test]
fn extension_contribution_drives_the_step() {
    let stepper = RkStepper::new(NullField, StepperConfig::default()).unwrap();
    let push = Vector3::new(0.0, 1e-3, 0.0);
    let mut list = single(Stub::new("push", push));
    let mut s = state();

    let m = stepper.step(&mut s, &mut list).unwrap();
    let h = m.step_size;
    // Constant k: x(h) = x0 + h·dir + h²/2·k
    let expected = Vector3::new(h, 0.5 * h * h * 1e-3, 0.0);
    assert!((s.position() - expected).norm() < 1e-12);
}

#[test]
fn step_budget_exhaustion_reports_metrics() {
    let cfg = StepperConfig {
        max_steps: 3,
        max_step: 10.0,
        ..Default::default()
    };
    let stepper = RkStepper::new(NullField, cfg).unwrap();
    let mut s = state();
    let mut list = ExtensionList::empty();

    let err = stepper.propagate(&mut s, &mut list, 1000.0).unwrap_err();
    assert_eq!(
        err.kind,
        PropagationErrorKind::StepLimit { max_steps: 3 }
    );
    assert_eq!(err.metrics.steps, 3);
    assert!((s.path_length() - 30.0).abs() < 1e-12);
}

#[test]
fn propagation_error_names_failing_step() {
    let stepper = RkStepper::new(NullField, StepperConfig::default()).unwrap();
    let stub = Stub::new("stub", Vector3::ZERO).declining_at(EvalPhase::Finalize);
    let mut list = single(stub);
    let mut s = state();

    let err = stepper.propagate(&mut s, &mut list, 100.0).unwrap_err();
    match err.kind {
        PropagationErrorKind::Step { index, source } => {
            assert_eq!(index, 0);
            assert!(matches!(source, StepError::Extension(_)));
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(err.metrics.steps, 0);
}

#[test]
fn invalid_path_limit_rejected() {
    let stepper = RkStepper::new(NullField, StepperConfig::default()).unwrap();
    let mut s = state();
    let err = stepper
        .propagate(&mut s, &mut ExtensionList::empty(), f64::NAN)
        .unwrap_err();
    assert!(matches!(
        err.kind,
        PropagationErrorKind::InvalidPathLimit { .. }
    ));
}
