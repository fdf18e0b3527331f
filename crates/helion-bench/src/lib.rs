//! Benchmark profiles for the Helion track stepper.
//!
//! Provides pre-built setups for benchmarks and examples:
//!
//! - [`solenoid_stepper`]: stepper in a uniform 2 T field along z
//! - [`pion`]: a 1 GeV pion track, optionally inside silicon
//! - [`standard_registry`]: dense-then-default extensions under
//!   first-valid-only resolution

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use helion_core::{MaterialProperties, Vector3};
use helion_extension::ExtensionList;
use helion_extensions::{standard_extensions, ConstantField, DenseEnvironmentConfig};
use helion_stepper::{RkStepper, StepperConfig, StepperState};

/// Solenoid field strength of the reference profile in Tesla.
pub const SOLENOID_FIELD: f64 = 2.0;

/// Stepper over a uniform [`SOLENOID_FIELD`] along z.
///
/// Covariance transport is enabled when `with_covariance` is set.
pub fn solenoid_stepper(with_covariance: bool) -> RkStepper<ConstantField> {
    let config = StepperConfig {
        transport_covariance: with_covariance,
        ..StepperConfig::default()
    };
    RkStepper::new(ConstantField::along_z(SOLENOID_FIELD), config).unwrap()
}

/// A positive 1 GeV pion at the origin flying at 45° to the field.
///
/// Placed inside a 1 mm silicon slab when `in_silicon` is set.
pub fn pion(in_silicon: bool) -> StepperState {
    let state =
        StepperState::new(Vector3::ZERO, Vector3::new(1.0, 0.0, 1.0), 1.0, 1.0).unwrap();
    if in_silicon {
        state.with_material(MaterialProperties::silicon(1.0).unwrap())
    } else {
        state
    }
}

/// The dense-then-default registry with default dense settings.
pub fn standard_registry() -> ExtensionList<StepperState> {
    standard_extensions(DenseEnvironmentConfig::default()).unwrap()
}
