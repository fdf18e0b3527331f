//! Helion: extensible Runge–Kutta track stepping.
//!
//! This is the top-level facade crate that re-exports the public API from all
//! Helion sub-crates. For most users, adding `helion` as a single dependency
//! is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use helion::prelude::*;
//!
//! // Dense material first, vacuum fallback second; the first valid one wins.
//! let mut extensions = standard_extensions(DenseEnvironmentConfig::default()).unwrap();
//! let stepper = RkStepper::new(ConstantField::along_z(2.0), StepperConfig::default()).unwrap();
//!
//! let mut track = StepperState::new(
//!     Vector3::ZERO,
//!     Vector3::new(1.0, 0.0, 0.0),
//!     1.0, // GeV
//!     1.0, // e
//! )
//! .unwrap();
//!
//! let metrics = stepper.propagate(&mut track, &mut extensions, 100.0).unwrap();
//! assert!((track.path_length() - 100.0).abs() < 1e-9);
//! assert_eq!(metrics.extension_steps.get("default"), Some(&metrics.steps));
//! ```
//!
//! # Writing an extension
//!
//! ```rust
//! use helion::prelude::*;
//!
//! /// Constant extra acceleration along +y.
//! struct Kick;
//!
//! impl<S> Extension<S> for Kick {
//!     fn name(&self) -> &str { "kick" }
//!     fn is_valid(&self, _state: &S) -> bool { true }
//!     fn k(
//!         &mut self,
//!         _state: &S,
//!         k: &mut Vector3,
//!         _b_field: &Vector3,
//!         _stage: Stage,
//!         _h: f64,
//!         _k_prev: &Vector3,
//!     ) -> bool {
//!         *k += Vector3::new(0.0, 1e-4, 0.0);
//!         true
//!     }
//!     fn finalize(&mut self, _state: &mut S, _h: f64) -> bool { true }
//! }
//!
//! let mut list = ExtensionList::<()>::builder()
//!     .extension(Kick)
//!     .auctioneer(AcceptAll)
//!     .build()
//!     .unwrap();
//! let mut k = Vector3::ZERO;
//! list.evaluate_stage(&(), Stage::K1, &mut k, &Vector3::ZERO, 1.0, &Vector3::ZERO)
//!     .unwrap();
//! assert_eq!(k, Vector3::new(0.0, 1e-4, 0.0));
//! assert!(list.get::<Kick>().is_some());
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `helion-core` | Vectors, jacobians, stages, track state, errors |
//! | [`extension`] | `helion-extension` | Extension trait, auctioneers, registry |
//! | [`extensions`] | `helion-extensions` | Reference extensions, fields, scattering |
//! | [`stepper`] | `helion-stepper` | Adaptive stepper, state, config, metrics |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, traits, and errors (`helion-core`).
///
/// Contains [`types::Vector3`], [`types::Jacobian`], [`types::Stage`], the
/// [`types::TrackState`], [`types::MagneticField`] and
/// [`types::ScatteringUpdater`] traits, and the error enums.
pub use helion_core as types;

/// Extension trait, auctioneers, and the registry (`helion-extension`).
///
/// [`extension::ExtensionList`] is the object a stepper drives each stage
/// through.
pub use helion_extension as extension;

/// Reference extensions and collaborators (`helion-extensions`).
///
/// Includes [`extensions::DefaultExtension`],
/// [`extensions::DenseEnvironmentExtension`], [`extensions::ConstantField`]
/// and [`extensions::HighlandScattering`].
pub use helion_extensions as extensions;

/// The adaptive Runge–Kutta stepper (`helion-stepper`).
pub use helion_stepper as stepper;

/// Common imports for typical Helion usage.
///
/// ```rust
/// use helion::prelude::*;
/// ```
pub mod prelude {
    // Core types and traits
    pub use helion_core::{
        EvalPhase, Jacobian, MagneticField, MaterialProperties, ParticleHypothesis,
        ScatteringUpdater, Stage, StepData, TrackState, Vector3,
    };

    // Errors
    pub use helion_core::{ConfigError, ExtensionError, StepError};

    // Registry
    pub use helion_extension::{
        AcceptAll, Auctioneer, Extension, ExtensionList, FirstValidOnly, ValidityMask,
    };

    // Reference extensions
    pub use helion_extensions::{
        standard_extensions, ConstantField, DefaultExtension, DenseEnvironmentConfig,
        DenseEnvironmentExtension, HighlandScattering, NullField,
    };

    // Stepper
    pub use helion_stepper::{
        PropagationError, PropagationMetrics, RkStepper, StepMetrics, StepperConfig,
        StepperState,
    };
}
