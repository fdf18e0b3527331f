//! Adaptive Runge–Kutta track stepper for Helion.
//!
//! [`RkStepper`] integrates a charged track through a
//! [`MagneticField`](helion_core::MagneticField), delegating the physics of
//! each stage to an [`ExtensionList`](helion_extension::ExtensionList).
//! [`StepperState`] is the state it advances, [`StepperConfig`] its
//! tunables, and [`StepMetrics`] / [`PropagationMetrics`] report what each
//! step and each propagation did.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod metrics;
pub mod state;
pub mod stepper;

pub use config::StepperConfig;
pub use error::{PropagationError, PropagationErrorKind};
pub use metrics::{PropagationMetrics, StepMetrics};
pub use state::StepperState;
pub use stepper::{step_size_scaling, RkStepper};
