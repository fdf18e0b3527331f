//! Reference extensions for the Helion track stepper.
//!
//! Provides the two physics regimes a charged track usually needs, plus the
//! collaborators they consume:
//!
//! - [`DefaultExtension`]: Lorentz force in vacuum.
//! - [`DenseEnvironmentExtension`]: Lorentz force with continuous energy
//!   loss and multiple-scattering bookkeeping inside material.
//! - [`ConstantField`] / [`NullField`]: simple [`MagneticField`](helion_core::MagneticField)
//!   providers.
//! - [`HighlandScattering`]: Highland-formula
//!   [`ScatteringUpdater`](helion_core::ScatteringUpdater).
//!
//! # Recommended registry
//!
//! Register dense before default with [`FirstValidOnly`](helion_extension::FirstValidOnly)
//! so material steps get energy loss and vacuum steps the plain force:
//! see [`standard_extensions`].

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod default;
pub mod dense;
pub mod energy_loss;
pub mod fields;
pub mod scattering;

pub use default::DefaultExtension;
pub use dense::{DenseEnvironmentConfig, DenseEnvironmentExtension};
pub use energy_loss::bethe_mean_loss;
pub use fields::{ConstantField, NullField};
pub use scattering::HighlandScattering;

use helion_core::{ConfigError, TrackState};
use helion_extension::{ExtensionList, FirstValidOnly};

/// Dense-environment then default extension, resolved by [`FirstValidOnly`].
pub fn standard_extensions<S: TrackState + 'static>(
    dense: DenseEnvironmentConfig,
) -> Result<ExtensionList<S>, ConfigError> {
    ExtensionList::builder()
        .extension(DenseEnvironmentExtension::new(dense, HighlandScattering::default())?)
        .extension(DefaultExtension::new())
        .auctioneer(FirstValidOnly)
        .build()
}
