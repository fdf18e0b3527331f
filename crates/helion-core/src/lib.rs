//! Core types and traits for the Helion track stepper.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the fundamental abstractions used throughout the Helion workspace:
//! small fixed-size linear algebra, integration stages, track state
//! access, particle and material descriptions, collaborator traits for
//! the magnetic field and multiple scattering, and error types.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod field;
pub mod id;
pub mod material;
pub mod math;
pub mod particle;
pub mod scattering;
pub mod stage;
pub mod track;
pub mod transport;

pub use error::{ConfigError, EvalPhase, ExtensionError, StepError};
pub use field::{lorentz_k, FieldGradient, MagneticField, TESLA};
pub use id::StepId;
pub use material::MaterialProperties;
pub use math::{Jacobian, Vector3, FREE_PARAMS, QOP_INDEX};
pub use particle::ParticleHypothesis;
pub use scattering::ScatteringUpdater;
pub use stage::{Stage, StageIndexError, StepData};
pub use track::{inverse_velocity, TrackState, SPEED_OF_LIGHT};
pub use transport::vacuum_transport;
